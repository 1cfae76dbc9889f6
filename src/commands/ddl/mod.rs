mod execute;

use clap::Args;
use std::path::PathBuf;

use crate::sql::SqlDialectKind;

/// Print DDL for resources of an ApiSchema document
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  relational_model ddl -a ApiSchema.json                      # All non-descriptor resources
  relational_model ddl -a ApiSchema.json -r schools -r students
  relational_model ddl -a ApiSchema.json -d mssql")]
pub struct DdlCmd {
    /// ApiSchema JSON file
    #[arg(short, long)]
    pub api_schema: PathBuf,

    /// Resource endpoint names to emit (all non-descriptor resources when omitted)
    #[arg(short, long = "resource")]
    pub resources: Vec<String>,

    /// SQL dialect (overrides the config file)
    #[arg(short, long, value_enum)]
    pub dialect: Option<SqlDialectKind>,
}
