mod cli_tests;
mod execute;

use clap::Args;
use std::path::PathBuf;

use crate::sql::SqlDialectKind;

/// Print seed DML for the resource key and effective schema tables
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  relational_model seed -a ApiSchema.json --effective-schema-hash 3f2a...
  relational_model seed -a ApiSchema.json -a Sample-ApiSchema.json --effective-schema-hash 3f2a... -d mssql")]
pub struct SeedCmd {
    /// ApiSchema JSON files: the core project plus any extension projects
    #[arg(short, long, required = true)]
    pub api_schema: Vec<PathBuf>,

    /// Hex-encoded hash identifying the effective schema being provisioned
    #[arg(short, long)]
    pub effective_schema_hash: String,

    /// SQL dialect (overrides the config file)
    #[arg(short, long, value_enum)]
    pub dialect: Option<SqlDialectKind>,
}
