//! Configuration file handling.
//!
//! `.relational_model.json` holds defaults that would otherwise be repeated on
//! every invocation. Every field is optional:
//!
//! ```json
//! {
//!   "dialect": "mssql",
//!   "core_schema": { "schema": "dms" },
//!   "relational": { "nameOverrides": { "$.schoolYear": "SchoolYearValue" } },
//!   "string_max_length_omissions": ["$.eventDuration"]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{CoreSchemaNames, RelationalModelBuilderContext};
use crate::sql::SqlDialectKind;

pub const DEFAULT_CONFIG_PATH: &str = ".relational_model.json";

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub dialect: Option<SqlDialectKind>,
    pub core_schema: Option<CoreSchemaConfig>,
    pub relational: RelationalConfig,
    pub string_max_length_omissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreSchemaConfig {
    pub schema: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationalConfig {
    /// Canonical JSON path -> column name
    #[serde(rename = "nameOverrides")]
    pub name_overrides: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Load `path` when given (it must exist), else the default file in the
    /// current directory when present, else an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load_from(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        if !path.exists() {
            return Err(format!("Configuration file not found: {}", path.display()).into());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid JSON in {}: {}", path.display(), e))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// The `--dialect` flag wins over the file; PostgreSQL when neither is set.
    pub fn dialect(&self, flag: Option<SqlDialectKind>) -> SqlDialectKind {
        flag.or(self.dialect).unwrap_or_default()
    }

    pub fn core_names(&self) -> CoreSchemaNames {
        self.core_schema
            .as_ref()
            .map(|c| CoreSchemaNames::with_schema(&c.schema))
            .unwrap_or_default()
    }

    /// Apply name overrides, omissions and core names to a build context.
    pub fn apply(&self, context: RelationalModelBuilderContext) -> RelationalModelBuilderContext {
        context
            .with_core_names(self.core_names())
            .with_name_overrides(self.relational.name_overrides.clone())
            .with_string_max_length_omissions(
                self.string_max_length_omissions
                    .iter()
                    .cloned()
                    .collect::<BTreeSet<_>>(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    fn test_full_deserialization() {
        let json = r#"
        {
            "dialect": "mssql",
            "core_schema": { "schema": "core" },
            "relational": { "nameOverrides": { "$.schoolYear": "SchoolYearValue" } },
            "string_max_length_omissions": ["$.eventDuration"]
        }
        "#;
        let config: ConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(config.dialect, Some(SqlDialectKind::Mssql));
        assert_eq!(config.core_names().schema.as_str(), "core");
        assert_eq!(
            config.relational.name_overrides.get("$.schoolYear").map(String::as_str),
            Some("SchoolYearValue")
        );
        assert_eq!(config.string_max_length_omissions, vec!["$.eventDuration"]);
    }

    #[rstest]
    fn test_empty_object_is_default() {
        let config: ConfigFile = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.core_names(), CoreSchemaNames::default());
    }

    #[rstest]
    #[case(None, None, SqlDialectKind::Pgsql)]
    #[case(Some(SqlDialectKind::Mssql), None, SqlDialectKind::Mssql)]
    #[case(Some(SqlDialectKind::Mssql), Some(SqlDialectKind::Pgsql), SqlDialectKind::Pgsql)]
    fn test_dialect_flag_overrides_file(
        #[case] file: Option<SqlDialectKind>,
        #[case] flag: Option<SqlDialectKind>,
        #[case] expected: SqlDialectKind,
    ) {
        let config = ConfigFile {
            dialect: file,
            ..ConfigFile::default()
        };
        assert_eq!(config.dialect(flag), expected);
    }

    #[rstest]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "dialect": "pgsql" }}"#).unwrap();
        let config = ConfigFile::load(Some(file.path())).unwrap();
        assert_eq!(config.dialect, Some(SqlDialectKind::Pgsql));
    }

    #[rstest]
    fn test_explicit_missing_file_is_error() {
        let err = ConfigFile::load(Some(Path::new("/nonexistent/.relational_model.json"))).unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }

    #[rstest]
    fn test_invalid_json_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = ConfigFile::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }
}
