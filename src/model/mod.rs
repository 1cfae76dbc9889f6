//! Relational model builder.
//!
//! Turns one resource's JSON Schema (plus side tables extracted from the
//! enclosing ApiSchema document) into a `RelationalResourceModel`:
//!
//! 1. **Paths** (`path.rs`) - `JsonPathExpression`, the key type used everywhere
//! 2. **Naming** (`naming.rs`) - schema/table/column/constraint naming rules
//! 3. **IR** (`definition.rs`) - tables, columns, keys, constraints, edges
//! 4. **Pipeline** (`pipeline/`) - the six ordered build steps over a shared
//!    `RelationalModelBuilderContext` (`context.rs`)
//! 5. **Manifest** (`manifest.rs`) - canonical JSON rendering of a build result

pub mod context;
pub mod core_names;
pub mod definition;
pub mod manifest;
pub mod naming;
pub mod path;
pub mod pipeline;

pub use context::{RelationalModelBuildResult, RelationalModelBuilderContext};
pub use core_names::CoreSchemaNames;
pub use definition::*;
pub use manifest::RelationalModelManifestEmitter;
pub use naming::{ColumnNameRegistry, RelationalNameConventions};
pub use path::{JsonPathExpression, JsonPathSegment, PathError};
pub use pipeline::RelationalModelBuilderPipeline;

use thiserror::Error;

/// Model builder error types. Every schema-shape error names its JSON path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Required input '{path}' is missing from the ApiSchema document")]
    MissingInput { path: String },

    #[error("Resource '{resource}' is a descriptor; descriptors are stored in the shared descriptor table")]
    DescriptorResource { resource: String },

    #[error("Unsupported JSON Schema construct '{keyword}' at '{path}'")]
    UnsupportedSchemaConstruct { keyword: String, path: String },

    #[error("Root schema at '{path}' must be 'type: object'")]
    InvalidRootSchema { path: String },

    #[error("Array items at '{path}' must be an object schema")]
    UnsupportedArrayItems { path: String },

    #[error("String property '{path}' has no maxLength and is not exempted")]
    MissingStringMaxLength { path: String },

    #[error("Number property '{path}' has no decimal precision/scale information")]
    MissingDecimalInfo { path: String },

    #[error("Decimal information for '{path}' is incomplete: totalDigits and decimalPlaces are both required")]
    IncompleteDecimalInfo { path: String },

    #[error("'{keyword}' at '{path}' is out of range: {value}")]
    ValueOutOfRange {
        keyword: String,
        path: String,
        value: u64,
    },

    #[error("{count} resources need keys but ResourceKeyId holds at most {max}")]
    TooManyResourceKeys { count: usize, max: usize },

    #[error(
        "Column name collision in resource '{resource}', table '{table}': JSON paths '{first_path}' and '{second_path}' both map to column '{column}'. Add an entry for one of the paths under relational.nameOverrides to choose a distinct column name."
    )]
    ColumnNameCollision {
        resource: String,
        table: String,
        column: String,
        first_path: String,
        second_path: String,
    },

    #[error("Table name collision in resource '{resource}': scopes '{first_scope}' and '{second_scope}' both map to table '{table}'")]
    TableNameCollision {
        resource: String,
        table: String,
        first_scope: String,
        second_scope: String,
    },

    #[error("Cannot name a {prefix} constraint on '{table}' without columns")]
    EmptyConstraintColumns { prefix: String, table: String },
}
