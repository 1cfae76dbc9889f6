//! Relational IR produced by the model builder pipeline.
//!
//! These types describe tables, columns, keys and constraints independently of
//! any SQL dialect. Both DDL emitters and the manifest emitter read them; none
//! of them mutate a finished `RelationalResourceModel`.

use std::fmt;

use super::naming::RelationalNameConventions;
use super::path::JsonPathExpression;

/// Physical schema name. Normalized once, at construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DbSchemaName(String);

impl DbSchemaName {
    /// Build a schema name from a project endpoint name (`ed-fi` -> `edfi`).
    pub fn new(endpoint_name: &str) -> Self {
        Self(RelationalNameConventions::normalize_schema_name(endpoint_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DbSchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declares a verbatim identifier newtype.
macro_rules! db_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

db_identifier!(
    /// Column name, already in its final physical form.
    DbColumnName
);
db_identifier!(DbIndexName);
db_identifier!(DbTriggerName);
db_identifier!(
    /// Name of a PK, unique, foreign key or check constraint.
    DbConstraintName
);

/// Schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DbTableName {
    pub schema: DbSchemaName,
    pub name: String,
}

impl DbTableName {
    pub fn new(schema: DbSchemaName, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }
}

impl fmt::Display for DbTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Project-qualified resource name (`Ed-Fi` / `School`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedResourceName {
    pub project_name: String,
    pub resource_name: String,
}

impl QualifiedResourceName {
    pub fn new(project_name: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            resource_name: resource_name.into(),
        }
    }
}

impl fmt::Display for QualifiedResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project_name, self.resource_name)
    }
}

/// Role a column plays in its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnKind {
    /// Value flattened from a JSON scalar
    Scalar,
    /// Key column inherited from the parent table (or the root document id)
    ParentKeyPart,
    /// Array position within the parent row
    Ordinal,
    /// Foreign key into the shared descriptor table
    DescriptorFk,
    /// Foreign key to the root table of a referenced document
    DocumentFk,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Scalar => "Scalar",
            ColumnKind::ParentKeyPart => "ParentKeyPart",
            ColumnKind::Ordinal => "Ordinal",
            ColumnKind::DescriptorFk => "DescriptorFk",
            ColumnKind::DocumentFk => "DocumentFk",
        }
    }
}

/// Dialect-neutral scalar type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationalScalarType {
    /// Text; `None` means unbounded and is only produced for exempted paths
    String { max_length: Option<u32> },
    Int32,
    Int64,
    Boolean,
    Date,
    DateTime,
    Time,
    Decimal { precision: u16, scale: u16 },
}

impl RelationalScalarType {
    pub fn kind_name(&self) -> &'static str {
        match self {
            RelationalScalarType::String { .. } => "String",
            RelationalScalarType::Int32 => "Int32",
            RelationalScalarType::Int64 => "Int64",
            RelationalScalarType::Boolean => "Boolean",
            RelationalScalarType::Date => "Date",
            RelationalScalarType::DateTime => "DateTime",
            RelationalScalarType::Time => "Time",
            RelationalScalarType::Decimal { .. } => "Decimal",
        }
    }
}

/// A single column of a derived table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbColumnModel {
    pub name: DbColumnName,
    pub kind: ColumnKind,
    pub scalar_type: Option<RelationalScalarType>,
    pub is_nullable: bool,
    pub source_path: Option<JsonPathExpression>,
    /// Referenced resource, set for `DescriptorFk` and `DocumentFk` columns
    pub target_resource: Option<QualifiedResourceName>,
}

impl DbColumnModel {
    pub fn scalar(
        name: DbColumnName,
        scalar_type: RelationalScalarType,
        is_nullable: bool,
        source_path: JsonPathExpression,
    ) -> Self {
        Self {
            name,
            kind: ColumnKind::Scalar,
            scalar_type: Some(scalar_type),
            is_nullable,
            source_path: Some(source_path),
            target_resource: None,
        }
    }

    pub fn key_part(name: DbColumnName, kind: ColumnKind, scalar_type: RelationalScalarType) -> Self {
        Self {
            name,
            kind,
            scalar_type: Some(scalar_type),
            is_nullable: false,
            source_path: None,
            target_resource: None,
        }
    }

    /// A descriptor foreign key column. Always `Int64`.
    pub fn descriptor_fk(
        name: DbColumnName,
        is_nullable: bool,
        source_path: JsonPathExpression,
        descriptor_resource: QualifiedResourceName,
    ) -> Self {
        Self {
            name,
            kind: ColumnKind::DescriptorFk,
            scalar_type: Some(RelationalScalarType::Int64),
            is_nullable,
            source_path: Some(source_path),
            target_resource: Some(descriptor_resource),
        }
    }

    /// A referenced-document id column. Always `Int64`.
    pub fn document_fk(
        name: DbColumnName,
        is_nullable: bool,
        source_path: JsonPathExpression,
        target_resource: QualifiedResourceName,
    ) -> Self {
        Self {
            name,
            kind: ColumnKind::DocumentFk,
            scalar_type: Some(RelationalScalarType::Int64),
            is_nullable,
            source_path: Some(source_path),
            target_resource: Some(target_resource),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbKeyColumn {
    pub name: DbColumnName,
    pub kind: ColumnKind,
}

/// Ordered primary key of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableKey {
    pub columns: Vec<DbKeyColumn>,
}

impl TableKey {
    pub fn column_names(&self) -> Vec<DbColumnName> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn contains(&self, column: &DbColumnName) -> bool {
        self.columns.iter().any(|c| &c.name == column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
}

impl ReferentialAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NoAction",
            ReferentialAction::Cascade => "Cascade",
            ReferentialAction::SetNull => "SetNull",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraint {
    Unique {
        name: DbConstraintName,
        columns: Vec<DbColumnName>,
    },
    ForeignKey {
        name: DbConstraintName,
        columns: Vec<DbColumnName>,
        target_table: DbTableName,
        target_columns: Vec<DbColumnName>,
        on_delete: ReferentialAction,
        on_update: ReferentialAction,
    },
    /// Either the FK column and all dependents are null, or none of them are.
    AllOrNoneNullability {
        name: DbConstraintName,
        fk_column: DbColumnName,
        dependent_columns: Vec<DbColumnName>,
    },
}

impl TableConstraint {
    pub fn name(&self) -> &DbConstraintName {
        match self {
            TableConstraint::Unique { name, .. }
            | TableConstraint::ForeignKey { name, .. }
            | TableConstraint::AllOrNoneNullability { name, .. } => name,
        }
    }

    /// Rank used for canonical ordering within a table.
    pub fn kind_rank(&self) -> u8 {
        match self {
            TableConstraint::Unique { .. } => 0,
            TableConstraint::ForeignKey { .. } => 1,
            TableConstraint::AllOrNoneNullability { .. } => 2,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TableConstraint::Unique { .. } => "Unique",
            TableConstraint::ForeignKey { .. } => "ForeignKey",
            TableConstraint::AllOrNoneNullability { .. } => "AllOrNoneNullability",
        }
    }
}

/// One table: the root of a resource or one of its collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbTableModel {
    pub table: DbTableName,
    pub json_scope: JsonPathExpression,
    pub key: TableKey,
    pub columns: Vec<DbColumnModel>,
    pub constraints: Vec<TableConstraint>,
}

impl DbTableModel {
    pub fn column(&self, name: &DbColumnName) -> Option<&DbColumnModel> {
        self.columns.iter().find(|c| &c.name == name)
    }

    /// Nesting depth; 0 for the root table.
    pub fn depth(&self) -> usize {
        self.json_scope
            .segments()
            .iter()
            .filter(|s| matches!(s, super::path::JsonPathSegment::AnyArrayElement))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbIndexModel {
    pub name: DbIndexName,
    pub table: DbTableName,
    pub columns: Vec<DbColumnName>,
    pub is_unique: bool,
}

/// Trigger that bumps the owning `Document` row whenever a table row changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbTriggerModel {
    pub name: DbTriggerName,
    pub table: DbTableName,
    pub document_id_column: DbColumnName,
}

/// A descriptor FK column and the JSON path it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorEdgeSource {
    pub table: DbTableName,
    pub column: DbColumnName,
    pub source_path: JsonPathExpression,
    pub is_identity_component: bool,
    pub descriptor_resource: QualifiedResourceName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceIdentityColumn {
    /// Identity path on the referenced resource (`$.studentUniqueId`)
    pub identity_path: JsonPathExpression,
    /// Path inside the referencing document (`$.studentReference.studentUniqueId`)
    pub reference_path: JsonPathExpression,
    pub column: DbColumnName,
}

/// How a document reference object is stored in its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReferenceBinding {
    pub reference_path: JsonPathExpression,
    pub table: DbTableName,
    pub fk_column: DbColumnName,
    pub target_resource: QualifiedResourceName,
    pub is_required: bool,
    pub identity_columns: Vec<ReferenceIdentityColumn>,
}

/// An `_ext` location and the extension projects found under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSite {
    pub owning_scope: JsonPathExpression,
    pub extension_path: JsonPathExpression,
    pub project_keys: Vec<String>,
}

/// Finished IR for one resource.
///
/// `tables` is held in scope-path order; `read_order` and `write_order`
/// index into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalResourceModel {
    pub resource: QualifiedResourceName,
    pub physical_schema: DbSchemaName,
    pub tables: Vec<DbTableModel>,
    pub read_order: Vec<usize>,
    pub write_order: Vec<usize>,
    pub document_references: Vec<DocumentReferenceBinding>,
    pub descriptor_edges: Vec<DescriptorEdgeSource>,
}

impl RelationalResourceModel {
    /// The table whose scope is `$`.
    pub fn root_table(&self) -> Option<&DbTableModel> {
        self.tables.iter().find(|t| t.json_scope.is_root())
    }

    pub fn tables_in_read_order(&self) -> impl Iterator<Item = &DbTableModel> {
        self.read_order.iter().filter_map(|&i| self.tables.get(i))
    }

    pub fn tables_in_write_order(&self) -> impl Iterator<Item = &DbTableModel> {
        self.write_order.iter().filter_map(|&i| self.tables.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_schema_name_normalized_once() {
        let schema = DbSchemaName::new("Ed-Fi");
        assert_eq!(schema.as_str(), "edfi");
        assert_eq!(DbSchemaName::new(schema.as_str()), schema);
    }

    #[rstest]
    fn test_table_name_display() {
        let table = DbTableName::new(DbSchemaName::new("ed-fi"), "School");
        assert_eq!(table.to_string(), "edfi.School");
    }

    #[rstest]
    fn test_descriptor_fk_is_int64_with_target() {
        let column = DbColumnModel::descriptor_fk(
            DbColumnName::new("GradeLevelDescriptor_DescriptorId"),
            false,
            JsonPathExpression::compile("$.gradeLevelDescriptor").unwrap(),
            QualifiedResourceName::new("Ed-Fi", "GradeLevelDescriptor"),
        );
        assert_eq!(column.kind, ColumnKind::DescriptorFk);
        assert_eq!(column.scalar_type, Some(RelationalScalarType::Int64));
        assert!(column.target_resource.is_some());
    }

    #[rstest]
    fn test_constraint_name_and_rank() {
        let unique = TableConstraint::Unique {
            name: DbConstraintName::new("UX_School_SchoolId"),
            columns: vec![DbColumnName::new("SchoolId")],
        };
        let check = TableConstraint::AllOrNoneNullability {
            name: DbConstraintName::new("CK_School_Lea_AllOrNone"),
            fk_column: DbColumnName::new("Lea_DocumentId"),
            dependent_columns: vec![],
        };
        assert_eq!(unique.name().as_str(), "UX_School_SchoolId");
        assert!(unique.kind_rank() < check.kind_rank());
    }

    #[rstest]
    fn test_table_depth_counts_wildcards() {
        let table = DbTableModel {
            table: DbTableName::new(DbSchemaName::new("edfi"), "SchoolAddressPeriod"),
            json_scope: JsonPathExpression::compile("$.addresses[*].periods[*]").unwrap(),
            key: TableKey::default(),
            columns: vec![],
            constraints: vec![],
        };
        assert_eq!(table.depth(), 2);
    }
}
