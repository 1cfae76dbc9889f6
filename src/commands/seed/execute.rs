use std::error::Error;

use tracing::info;

use super::SeedCmd;
use crate::commands::{Execute, read_api_schema};
use crate::config::ConfigFile;
use crate::output::SqlScriptResult;
use crate::sql::{SeedData, SeedDmlEmitter, SqlDialectFactory};

impl Execute for SeedCmd {
    type Output = SqlScriptResult;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>> {
        hex::decode(&self.effective_schema_hash).map_err(|e| {
            format!(
                "Effective schema hash '{}' is not hexadecimal: {}",
                self.effective_schema_hash, e
            )
        })?;
        let api_schemas = self
            .api_schema
            .iter()
            .map(|path| read_api_schema(path))
            .collect::<Result<Vec<_>, _>>()?;
        let seed = SeedData::from_api_schemas(&api_schemas, self.effective_schema_hash.to_ascii_lowercase())?;

        let dialect = config.dialect(self.dialect);
        let sql = SeedDmlEmitter::new(SqlDialectFactory::create(dialect)).emit(&seed, &config.core_names());
        info!(%dialect, resource_keys = seed.resource_keys.len(), "Generated seed DML");

        Ok(SqlScriptResult {
            kind: "seed",
            dialect,
            resources: seed
                .resource_keys
                .iter()
                .map(|k| format!("{}.{}", k.project_name, k.resource_name))
                .collect(),
            sql,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::api_schema_file;
    use rstest::rstest;

    #[rstest]
    fn test_seed_includes_descriptors() {
        let file = api_schema_file();
        let cmd = SeedCmd {
            api_schema: vec![file.path().to_path_buf()],
            effective_schema_hash: "AB12".to_string(),
            dialect: None,
        };
        let result = cmd.execute(&ConfigFile::default()).unwrap();
        assert_eq!(
            result.resources,
            vec!["Ed-Fi.GradeLevelDescriptor", "Ed-Fi.School"]
        );
        assert!(result.sql.contains("'ab12'"));
    }

    #[rstest]
    fn test_non_hex_hash_rejected() {
        let file = api_schema_file();
        let cmd = SeedCmd {
            api_schema: vec![file.path().to_path_buf()],
            effective_schema_hash: "not-hex".to_string(),
            dialect: None,
        };
        let err = cmd.execute(&ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("is not hexadecimal"));
    }
}
