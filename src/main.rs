use clap::Parser;

use relational_model::cli::Args;
use relational_model::config::ConfigFile;
use relational_model::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let args = Args::parse();
    let config = ConfigFile::load(args.config.as_deref())?;
    let output = args.command.run(&config, args.format)?;
    println!("{}", output);
    Ok(())
}
