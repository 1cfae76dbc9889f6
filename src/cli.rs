//! CLI argument definitions.
//!
//! This module contains the top-level CLI structure and shared types.
//! Individual command definitions are in the `commands` module.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Command;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a JSON configuration file (defaults to ./.relational_model.json when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "relational_model",
            "core-ddl",
            "--format",
            "json",
            "--config",
            "custom.json",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.config, Some(PathBuf::from("custom.json")));
    }

    #[rstest]
    fn test_format_defaults_to_text() {
        let args = Args::try_parse_from(["relational_model", "core-ddl"]).unwrap();
        assert_eq!(args.format, OutputFormat::Text);
        assert!(args.config.is_none());
    }

    #[rstest]
    fn test_unknown_subcommand_is_captured() {
        let args = Args::try_parse_from(["relational_model", "frobnicate"]).unwrap();
        assert!(matches!(args.command, Command::Unknown(_)));
    }
}
