mod execute;

use clap::Args;

use crate::sql::SqlDialectKind;

/// Print DDL for the shared core schema
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  relational_model core-ddl
  relational_model core-ddl -d mssql")]
pub struct CoreDdlCmd {
    /// SQL dialect (overrides the config file)
    #[arg(short, long, value_enum)]
    pub dialect: Option<SqlDialectKind>,
}
