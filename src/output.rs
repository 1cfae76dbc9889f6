//! Output formatting for command results.

use clap::ValueEnum;
use serde::Serialize;

use crate::sql::SqlDialectKind;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The generated text itself
    #[default]
    Text,
    /// The generated text wrapped in a JSON envelope with its inputs
    Json,
}

/// Trait for types that can be formatted for output
pub trait Outputable: Serialize {
    /// Format as plain text
    fn to_text(&self) -> String;

    /// Format according to the specified output format
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.to_text(),
            OutputFormat::Json => serde_json::to_string_pretty(self).unwrap_or_default(),
        }
    }
}

/// A generated SQL script and what it was generated for.
#[derive(Debug, Clone, Serialize)]
pub struct SqlScriptResult {
    pub kind: &'static str,
    pub dialect: SqlDialectKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    pub sql: String,
}

impl Outputable for SqlScriptResult {
    fn to_text(&self) -> String {
        self.sql.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::Value;

    #[fixture]
    fn script() -> SqlScriptResult {
        SqlScriptResult {
            kind: "core-ddl",
            dialect: SqlDialectKind::Mssql,
            resources: vec![],
            sql: "SELECT 1;\n".to_string(),
        }
    }

    #[rstest]
    fn test_text_is_sql_without_trailing_newline(script: SqlScriptResult) {
        assert_eq!(script.format(OutputFormat::Text), "SELECT 1;");
    }

    #[rstest]
    fn test_json_envelope(script: SqlScriptResult) {
        let parsed: Value = serde_json::from_str(&script.format(OutputFormat::Json)).unwrap();
        assert_eq!(parsed["kind"], "core-ddl");
        assert_eq!(parsed["dialect"], "mssql");
        assert!(parsed.get("resources").is_none());
        assert_eq!(parsed["sql"], "SELECT 1;\n");
    }
}
