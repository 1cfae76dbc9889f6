//! Dialect-aware SQL emission.
//!
//! Everything here renders text; nothing executes it. The pieces are:
//!
//! 1. **Dialects** (`dialect/`) - quoting, type rendering and the idempotent
//!    DDL pattern of each object kind, for PostgreSQL and SQL Server
//! 2. **Writer** (`writer.rs`) - indentation-aware, canonicalizing text builder
//! 3. **Emitters** - core `dms` DDL (`core_ddl.rs`), per-resource DDL
//!    (`ddl.rs`) and seed DML (`seed.rs`)

pub mod core_ddl;
pub mod ddl;
pub mod dialect;
pub mod escape;
pub mod seed;
pub mod writer;

pub use core_ddl::CoreDdlEmitter;
pub use ddl::{DerivedRelationalModelSet, RelationalModelDdlEmitter};
pub use dialect::{
    DdlObjectKind, DdlPattern, MssqlDialect, PgsqlDialect, SqlDialect, SqlDialectFactory,
    SqlDialectKind, SqlDialectOps, SqlDialectRules,
};
pub use seed::{ResourceKeySeed, SchemaComponentSeed, SeedData, SeedDmlEmitter};
pub use writer::{IndentScope, SqlWriter};

use thiserror::Error;

/// Errors raised while choosing a dialect or compiling parameterized SQL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    #[error("Unsupported SQL dialect '{0}'; expected 'pgsql' or 'mssql'")]
    UnsupportedDialect(String),

    #[error("Operator '{operator}' is not supported by {compiler}.")]
    UnsupportedOperator {
        operator: String,
        compiler: &'static str,
    },

    #[error("Parameter name '{name}' is not a safe identifier")]
    UnsafeParameterName { name: String },

    #[error("Parameter name '{name}' must be given without a leading '@', ':' or '$'")]
    SigilParameterName { name: String },

    #[error("Column and parameter counts must match. Column count: {columns}. Parameter count: {parameters}.")]
    ColumnParameterCountMismatch { columns: usize, parameters: usize },

    #[error("At least one column is required")]
    EmptyColumnList,
}
