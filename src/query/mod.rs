//! Parameterized query and insert SQL.
//!
//! Both compilers take bare bind-parameter names (no sigil), check them
//! against a safe-identifier pattern, and render them as `@name`.

pub mod insert;
pub mod page;
pub mod params;

pub use insert::ToyInsertSqlEmitter;
pub use page::{
    PageDocumentIdQuerySpec, PageDocumentIdSql, PageDocumentIdSqlCompiler, QueryComparisonOperator,
    QueryValuePredicate, UnifiedAliasMapping,
};
pub use params::validate_parameter_name;
