mod execute;
mod output;

pub use execute::ManifestResult;

use clap::Args;
use std::path::PathBuf;

/// Print the canonical JSON manifest of one resource's relational model
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  relational_model manifest -a ApiSchema.json -r schools
  relational_model manifest -a ApiSchema.json -r students > students.manifest.json")]
pub struct ManifestCmd {
    /// ApiSchema JSON file containing the resource
    #[arg(short, long)]
    pub api_schema: PathBuf,

    /// Resource endpoint name (key under projectSchema.resourceSchemas)
    #[arg(short, long)]
    pub resource: String,
}
