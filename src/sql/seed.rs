//! Seed DML for the reference tables `ResourceKey`, `EffectiveSchema` and
//! `SchemaComponent`.
//!
//! The script is safe to run repeatedly and concurrently. It
//!
//! 1. fails fast when the database already records a different effective
//!    schema hash,
//! 2. inserts each expected row unless its key is present, then
//! 3. validates each table in full: the row count must match and every row
//!    must have a byte-identical counterpart in the expected set.
//!
//! Any mismatch is raised by the emitted SQL itself.

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::dialect::{SqlDialect, SqlDialectOps, SqlDialectRules};
use super::writer::SqlWriter;
use crate::model::ModelError;
use crate::model::core_names::CoreSchemaNames;
use crate::model::definition::{DbColumnName, DbTableName};

const EFFECTIVE_SCHEMA_ID: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceKeySeed {
    pub id: u16,
    pub project_name: String,
    pub resource_name: String,
    pub resource_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaComponentSeed {
    pub project_endpoint_name: String,
    pub project_name: String,
    pub project_version: String,
    pub is_extension_project: bool,
}

/// Expected content of the seeded tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedData {
    pub api_schema_format_version: String,
    pub effective_schema_hash: String,
    pub resource_keys: Vec<ResourceKeySeed>,
    pub schema_components: Vec<SchemaComponentSeed>,
}

/// `ResourceKeyId` is a `smallint`.
pub const MAX_RESOURCE_KEYS: usize = i16::MAX as usize;

impl SeedData {
    /// Collect seed rows from ApiSchema documents (core project plus any
    /// extensions). Resource keys are numbered from 1 in
    /// `(project, resource)` order; descriptors get keys too.
    pub fn from_api_schemas(
        api_schemas: &[Value],
        effective_schema_hash: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let mut resources = Vec::new();
        let mut schema_components = Vec::new();
        let mut api_schema_format_version = None;

        for api_schema in api_schemas {
            if api_schema_format_version.is_none() {
                api_schema_format_version = api_schema
                    .get("apiSchemaVersion")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            let project = api_schema
                .get("projectSchema")
                .ok_or_else(|| missing("$.projectSchema"))?;
            let project_name = required_str(project, "projectName")?;
            let project_version = required_str(project, "projectVersion")?;
            schema_components.push(SchemaComponentSeed {
                project_endpoint_name: required_str(project, "projectEndpointName")?,
                project_name: project_name.clone(),
                project_version: project_version.clone(),
                is_extension_project: project
                    .get("isExtensionProject")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            });

            let resource_schemas = project
                .get("resourceSchemas")
                .and_then(Value::as_object)
                .ok_or_else(|| missing("$.projectSchema.resourceSchemas"))?;
            for (endpoint, resource) in resource_schemas {
                let resource_name = resource
                    .get("resourceName")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        missing(&format!("$.projectSchema.resourceSchemas.{}.resourceName", endpoint))
                    })?;
                resources.push((project_name.clone(), resource_name.to_string(), project_version.clone()));
            }
        }

        resources.sort();
        resources.dedup();
        schema_components.sort_by(|a, b| a.project_endpoint_name.cmp(&b.project_endpoint_name));

        if resources.len() > MAX_RESOURCE_KEYS {
            return Err(ModelError::TooManyResourceKeys {
                count: resources.len(),
                max: MAX_RESOURCE_KEYS,
            });
        }
        let resource_keys = resources
            .into_iter()
            .zip(1u16..)
            .map(|((project_name, resource_name, resource_version), id)| ResourceKeySeed {
                id,
                project_name,
                resource_name,
                resource_version,
            })
            .collect::<Vec<_>>();
        debug!(resource_keys = resource_keys.len(), "Collected seed data");

        Ok(Self {
            api_schema_format_version: api_schema_format_version.unwrap_or_else(|| "1.0.0".to_string()),
            effective_schema_hash: effective_schema_hash.into(),
            resource_keys,
            schema_components,
        })
    }

    /// SHA-256 over one `id|project|resource|version\n` line per resource key.
    pub fn resource_key_seed_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for key in &self.resource_keys {
            hasher.update(
                format!(
                    "{}|{}|{}|{}\n",
                    key.id, key.project_name, key.resource_name, key.resource_version
                )
                .as_bytes(),
            );
        }
        hasher.finalize().into()
    }
}

fn missing(path: &str) -> ModelError {
    ModelError::MissingInput {
        path: path.to_string(),
    }
}

fn required_str(project: &Value, key: &str) -> Result<String, ModelError> {
    project
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(&format!("$.projectSchema.{}", key)))
}

/// One seeded table: columns, how many lead columns form the key, and the
/// rows as rendered literals.
struct SeedTable {
    table: DbTableName,
    columns: Vec<(DbColumnName, bool)>,
    key_count: usize,
    rows: Vec<Vec<String>>,
}

impl SeedTable {
    fn new(table: DbTableName, columns: &[(&str, bool)], key_count: usize) -> Self {
        Self {
            table,
            columns: columns
                .iter()
                .map(|(name, is_text)| (DbColumnName::new(*name), *is_text))
                .collect(),
            key_count,
            rows: Vec::new(),
        }
    }

    fn column_names(&self) -> Vec<DbColumnName> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }
}

pub struct SeedDmlEmitter {
    dialect: SqlDialect,
}

impl SeedDmlEmitter {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn emit(&self, seed: &SeedData, names: &CoreSchemaNames) -> String {
        let mut writer = SqlWriter::new();
        writer.append_line("-- Phase 7: Seed Data");
        self.write_preflight(&mut writer, seed, names);

        for table in self.seed_tables(seed, names) {
            writer.blank_line();
            writer.append_line(&format!("-- {}", table.table.name));
            let columns = table.column_names();
            for row in &table.rows {
                self.dialect
                    .write_insert_if_missing(&mut writer, &table.table, &columns, row, table.key_count);
            }
            self.write_validation(&mut writer, &table);
        }

        info!(
            dialect = %self.dialect.kind(),
            resource_keys = seed.resource_keys.len(),
            schema_components = seed.schema_components.len(),
            "Emitted seed DML"
        );
        writer.finish()
    }

    fn write_preflight(&self, writer: &mut SqlWriter, seed: &SeedData, names: &CoreSchemaNames) {
        let d = &self.dialect;
        let condition = format!(
            "EXISTS (SELECT 1 FROM {} WHERE {} = {} AND {} <> {})",
            d.qualify_table(&names.effective_schema_table()),
            d.quote_identifier("EffectiveSchemaId"),
            EFFECTIVE_SCHEMA_ID,
            d.quote_identifier("EffectiveSchemaHash"),
            d.string_literal(&seed.effective_schema_hash)
        );
        d.write_raise_error_if(
            writer,
            &condition,
            &format!(
                "EffectiveSchema mismatch: the database was provisioned for a different schema than '{}'.",
                seed.effective_schema_hash
            ),
        );
    }

    fn seed_tables(&self, seed: &SeedData, names: &CoreSchemaNames) -> Vec<SeedTable> {
        let d = &self.dialect;

        let mut resource_keys = SeedTable::new(
            names.resource_key_table(),
            &[
                ("ResourceKeyId", false),
                ("ProjectName", true),
                ("ResourceName", true),
                ("ResourceVersion", true),
            ],
            1,
        );
        resource_keys.rows = seed
            .resource_keys
            .iter()
            .map(|key| {
                vec![
                    key.id.to_string(),
                    d.string_literal(&key.project_name),
                    d.string_literal(&key.resource_name),
                    d.string_literal(&key.resource_version),
                ]
            })
            .collect();

        let mut effective_schema = SeedTable::new(
            names.effective_schema_table(),
            &[
                ("EffectiveSchemaId", false),
                ("ApiSchemaFormatVersion", true),
                ("EffectiveSchemaHash", true),
                ("ResourceKeyCount", false),
                ("ResourceKeySeedHash", false),
            ],
            1,
        );
        effective_schema.rows = vec![vec![
            EFFECTIVE_SCHEMA_ID.to_string(),
            d.string_literal(&seed.api_schema_format_version),
            d.string_literal(&seed.effective_schema_hash),
            seed.resource_keys.len().to_string(),
            d.binary_literal(&seed.resource_key_seed_hash()),
        ]];

        let mut schema_components = SeedTable::new(
            names.schema_component_table(),
            &[
                ("EffectiveSchemaHash", true),
                ("ProjectEndpointName", true),
                ("ProjectName", true),
                ("ProjectVersion", true),
                ("IsExtensionProject", false),
            ],
            2,
        );
        schema_components.rows = seed
            .schema_components
            .iter()
            .map(|component| {
                vec![
                    d.string_literal(&seed.effective_schema_hash),
                    d.string_literal(&component.project_endpoint_name),
                    d.string_literal(&component.project_name),
                    d.string_literal(&component.project_version),
                    d.boolean_literal(component.is_extension_project),
                ]
            })
            .collect();

        vec![resource_keys, effective_schema, schema_components]
    }

    /// Count check, then a check that no stored row lacks an exact match.
    fn write_validation(&self, writer: &mut SqlWriter, table: &SeedTable) {
        let d = &self.dialect;
        let qualified = d.qualify_table(&table.table);

        d.write_raise_error_if(
            writer,
            &format!("(SELECT COUNT(1) FROM {}) <> {}", qualified, table.rows.len()),
            &format!(
                "{} row count mismatch: expected {} rows.",
                table.table.name,
                table.rows.len()
            ),
        );

        if table.rows.is_empty() {
            return;
        }
        let values = table
            .rows
            .iter()
            .map(|row| format!("({})", row.join(", ")))
            .collect::<Vec<_>>()
            .join(",\n        ");
        let matches = table
            .columns
            .iter()
            .map(|(column, is_text)| {
                let column = d.quote_identifier(column.as_str());
                let left = format!("s.{}", column);
                let right = format!("e.{}", column);
                if *is_text {
                    d.binary_equals(&left, &right)
                } else {
                    format!("{} = {}", left, right)
                }
            })
            .collect::<Vec<_>>()
            .join("\n        AND ");
        let condition = format!(
            "EXISTS (\n    SELECT 1 FROM {} s\n    WHERE NOT EXISTS (\n        SELECT 1 FROM (VALUES\n        {}\n        ) AS e ({})\n        WHERE {}\n    )\n)",
            qualified,
            values,
            d.column_list(&table.column_names()),
            matches
        );
        d.write_raise_error_if(
            writer,
            &condition,
            &format!("{} content mismatch: a stored row differs from the expected seed.", table.table.name),
        );
    }
}
