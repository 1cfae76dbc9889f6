//! Naming rules for schemas, tables, columns and constraints.
//!
//! Every physical name in the model is produced here so the rules stay in
//! one place. All functions are pure.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::ModelError;
use super::definition::{
    DbColumnName, DbConstraintName, DbIndexName, DbTableName, DbTriggerName, QualifiedResourceName,
};

/// Config key operators use to rename a column derived from a JSON path.
pub const NAME_OVERRIDES_KEY: &str = "relational.nameOverrides";

pub struct RelationalNameConventions;

impl RelationalNameConventions {
    /// Strip non-alphanumerics and lowercase (`ed-fi` -> `edfi`).
    pub fn normalize_schema_name(endpoint_name: &str) -> String {
        endpoint_name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }

    /// Split on non-alphanumerics and upper-case the first letter of each piece.
    ///
    /// `a-b` and `a_b` both become `AB`; `schoolId` becomes `SchoolId`.
    pub fn to_pascal_case(name: &str) -> String {
        name.split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|piece| !piece.is_empty())
            .map(|piece| {
                let mut chars = piece.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect()
    }

    /// Singular, Pascal-cased base name for a collection property.
    ///
    /// - `categories` -> `Category`
    /// - `addresses` -> `Address`
    /// - `gradeLevels` -> `GradeLevel`
    pub fn to_collection_base_name(plural_name: &str) -> String {
        let singular = if let Some(stem) = plural_name.strip_suffix("ies") {
            format!("{}y", stem)
        } else if plural_name.ends_with("sses") || plural_name.ends_with("ses") {
            plural_name[..plural_name.len() - 2].to_string()
        } else if let Some(stem) = plural_name.strip_suffix('s') {
            stem.to_string()
        } else {
            plural_name.to_string()
        };
        Self::to_pascal_case(&singular)
    }

    /// Column name for a property path relative to its table scope.
    pub fn to_column_name(parts: &[&str]) -> String {
        parts.iter().map(|p| Self::to_pascal_case(p)).collect()
    }

    /// Base name for a document reference property (`studentReference` -> `Student`).
    pub fn reference_base_name(property_name: &str) -> String {
        let trimmed = property_name
            .strip_suffix("Reference")
            .filter(|s| !s.is_empty())
            .unwrap_or(property_name);
        Self::to_pascal_case(trimmed)
    }

    pub fn descriptor_column_name(base: &str) -> DbColumnName {
        DbColumnName::new(format!("{}_DescriptorId", base))
    }

    pub fn document_fk_column_name(base: &str) -> DbColumnName {
        DbColumnName::new(format!("{}_DocumentId", base))
    }

    /// `FK_{table}_{col1}_{col2}...`
    pub fn foreign_key_name(
        table: &DbTableName,
        columns: &[DbColumnName],
    ) -> Result<DbConstraintName, ModelError> {
        Self::joined_name("FK", table, columns).map(DbConstraintName::new)
    }

    /// `UX_{table}_{col1}_{col2}...`
    pub fn unique_constraint_name(
        table: &DbTableName,
        columns: &[DbColumnName],
    ) -> Result<DbConstraintName, ModelError> {
        Self::joined_name("UX", table, columns).map(DbConstraintName::new)
    }

    /// `IX_{table}_{col1}_{col2}...`
    pub fn index_name(table: &DbTableName, columns: &[DbColumnName]) -> Result<DbIndexName, ModelError> {
        Self::joined_name("IX", table, columns).map(DbIndexName::new)
    }

    pub fn primary_key_name(table: &DbTableName) -> DbConstraintName {
        DbConstraintName::new(format!("PK_{}", table.name))
    }

    pub fn all_or_none_constraint_name(table: &DbTableName, fk_column: &DbColumnName) -> DbConstraintName {
        DbConstraintName::new(format!("CK_{}_{}_AllOrNone", table.name, fk_column))
    }

    pub fn trigger_name(table: &DbTableName) -> DbTriggerName {
        DbTriggerName::new(format!("TR_{}_Stamp", table.name))
    }

    fn joined_name(
        prefix: &str,
        table: &DbTableName,
        columns: &[DbColumnName],
    ) -> Result<String, ModelError> {
        if columns.is_empty() {
            return Err(ModelError::EmptyConstraintColumns {
                prefix: prefix.to_string(),
                table: table.to_string(),
            });
        }
        let mut name = format!("{}_{}", prefix, table.name);
        for column in columns {
            name.push('_');
            name.push_str(column.as_str());
        }
        Ok(name)
    }

    /// Shorten an identifier to at most `max_len` bytes.
    ///
    /// Long names keep a prefix (cut on a char boundary) and gain `_` plus
    /// 8 hex characters of the SHA-256 of the full name, so distinct inputs
    /// stay distinct. PostgreSQL's limit is in bytes, so multi-byte names
    /// are measured the same way.
    pub fn fit_identifier(name: &str, max_len: usize) -> String {
        if name.len() <= max_len {
            return name.to_string();
        }
        let digest = Sha256::digest(name.as_bytes());
        let suffix = &hex::encode(digest)[..8];
        let mut keep = max_len.saturating_sub(suffix.len() + 1);
        while !name.is_char_boundary(keep) {
            keep -= 1;
        }
        format!("{}_{}", &name[..keep], suffix)
    }
}

/// Tracks which JSON path produced each column name in one table.
#[derive(Debug)]
pub struct ColumnNameRegistry {
    resource: QualifiedResourceName,
    table: DbTableName,
    /// Keyed case-insensitively; SQL Server's default collation folds case
    sources: BTreeMap<String, (DbColumnName, String)>,
}

impl ColumnNameRegistry {
    pub fn new(resource: QualifiedResourceName, table: DbTableName) -> Self {
        Self {
            resource,
            table,
            sources: BTreeMap::new(),
        }
    }

    /// Claim `column` for `source`, failing if another source already holds
    /// it or a name differing from it only in case.
    pub fn register(&mut self, column: &DbColumnName, source: &str) -> Result<(), ModelError> {
        let folded = column.as_str().to_ascii_lowercase();
        if let Some((existing_column, existing_source)) = self.sources.get(&folded) {
            if existing_source != source || existing_column != column {
                let column = if existing_column == column {
                    column.to_string()
                } else {
                    format!("{}' / '{}", existing_column, column)
                };
                return Err(ModelError::ColumnNameCollision {
                    resource: self.resource.to_string(),
                    table: self.table.to_string(),
                    column,
                    first_path: existing_source.clone(),
                    second_path: source.to_string(),
                });
            }
            return Ok(());
        }
        self.sources.insert(folded, (column.clone(), source.to_string()));
        Ok(())
    }
}
