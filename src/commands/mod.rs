//! Command definitions and implementations.
//!
//! Each command is defined in its own module with:
//! - The command struct with clap attributes for CLI parsing
//! - An `Execute` implementation producing an `Outputable` result

mod core_ddl;
mod ddl;
mod manifest;
mod seed;

pub use core_ddl::CoreDdlCmd;
pub use ddl::DdlCmd;
pub use manifest::ManifestCmd;
pub use seed::SeedCmd;

use clap::Subcommand;
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::config::ConfigFile;
use crate::model::{RelationalModelBuildResult, RelationalModelBuilderContext, RelationalModelBuilderPipeline};
use crate::output::{OutputFormat, Outputable};

/// Trait for executing commands with command-specific result types.
pub trait Execute {
    type Output: Outputable;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>>;
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the canonical JSON manifest of one resource's relational model
    Manifest(ManifestCmd),

    /// Print DDL for resources of an ApiSchema document
    Ddl(DdlCmd),

    /// Print DDL for the shared core schema
    CoreDdl(CoreDdlCmd),

    /// Print seed DML for the resource key and effective schema tables
    Seed(SeedCmd),

    /// Catch-all for unknown commands
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

impl Command {
    /// Execute the command and return formatted output
    pub fn run(self, config: &ConfigFile, format: OutputFormat) -> Result<String, Box<dyn Error>> {
        match self {
            Command::Manifest(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Ddl(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::CoreDdl(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Seed(cmd) => {
                let result = cmd.execute(config)?;
                Ok(result.format(format))
            }
            Command::Unknown(args) => {
                Err(format!("Unknown command: {}", args.first().unwrap_or(&String::new())).into())
            }
        }
    }
}

/// Read and parse an ApiSchema JSON file.
pub(crate) fn read_api_schema(path: &Path) -> Result<Value, Box<dyn Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))?;
    Ok(value)
}

/// Run the standard pipeline for one resource with the config applied.
pub(crate) fn build_resource(
    config: &ConfigFile,
    api_schema: Value,
    resource_endpoint_name: &str,
) -> Result<RelationalModelBuildResult, Box<dyn Error>> {
    let context = config.apply(RelationalModelBuilderContext::new(api_schema, resource_endpoint_name));
    Ok(RelationalModelBuilderPipeline::standard().run(context)?)
}
