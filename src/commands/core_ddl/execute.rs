use std::error::Error;

use tracing::info;

use super::CoreDdlCmd;
use crate::commands::Execute;
use crate::config::ConfigFile;
use crate::output::SqlScriptResult;
use crate::sql::{CoreDdlEmitter, SqlDialectFactory};

impl Execute for CoreDdlCmd {
    type Output = SqlScriptResult;

    fn execute(self, config: &ConfigFile) -> Result<Self::Output, Box<dyn Error>> {
        let dialect = config.dialect(self.dialect);
        let sql = CoreDdlEmitter::new(SqlDialectFactory::create(dialect)).emit(&config.core_names());
        info!(%dialect, "Generated core DDL");
        Ok(SqlScriptResult {
            kind: "core-ddl",
            dialect,
            resources: Vec::new(),
            sql,
        })
    }
}
