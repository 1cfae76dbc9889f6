use std::error::Error;

use serde_json::Value;
use tracing::info;

use super::DdlCmd;
use crate::commands::{Execute, build_resource, read_api_schema};
use crate::config::ConfigFile;
use crate::output::SqlScriptResult;
use crate::sql::{DerivedRelationalModelSet, RelationalModelDdlEmitter, SqlDialectFactory};

/// Endpoint names of every non-descriptor resource, sorted.
fn table_backed_resources(api_schema: &Value) -> Vec<String> {
    let mut names: Vec<String> = api_schema
        .pointer("/projectSchema/resourceSchemas")
        .and_then(Value::as_object)
        .map(|schemas| {
            schemas
                .iter()
                .filter(|(_, schema)| {
                    !schema
                        .get("isDescriptor")
                        .and_then(Value::as_bool)
                        .unwrap_or(false)
                })
                .map(|(name, _)| name.clone())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

impl Execute for DdlCmd {
    type Output = SqlScriptResult;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>> {
        let api_schema = read_api_schema(&self.api_schema)?;
        let resources = if self.resources.is_empty() {
            table_backed_resources(&api_schema)
        } else {
            self.resources
        };

        let models = resources
            .iter()
            .map(|name| build_resource(config, api_schema.clone(), name).map(|r| r.resource_model))
            .collect::<Result<Vec<_>, _>>()?;

        let dialect = config.dialect(self.dialect);
        let set = DerivedRelationalModelSet::new(SqlDialectFactory::create(dialect), models)
            .with_core_names(config.core_names());
        let sql = RelationalModelDdlEmitter::emit(&set);
        info!(%dialect, resources = resources.len(), "Generated resource DDL");

        Ok(SqlScriptResult {
            kind: "ddl",
            dialect,
            resources,
            sql,
        })
    }
}
