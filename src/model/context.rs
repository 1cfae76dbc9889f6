//! Shared state threaded through the pipeline steps.
//!
//! A context is owned by exactly one pipeline run. Steps read what earlier
//! steps wrote and add their own results; `into_result` consumes the context
//! and hands back the immutable IR.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::ModelError;
use super::core_names::CoreSchemaNames;
use super::definition::{
    DbSchemaName, DbTableModel, DbTableName, DescriptorEdgeSource, DocumentReferenceBinding,
    ExtensionSite, QualifiedResourceName, RelationalResourceModel,
};
use super::path::JsonPathExpression;

/// Precision info for a `number` property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalPropertyValidationInfo {
    pub path: JsonPathExpression,
    pub total_digits: Option<u16>,
    pub decimal_places: Option<u16>,
}

/// A non-descriptor document reference declared in `documentPathsMapping`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReferenceMapping {
    pub target_resource: QualifiedResourceName,
    /// The reference object (`$.studentReference`)
    pub reference_object_path: JsonPathExpression,
    /// `(identity path on target, path inside this document)` pairs
    pub identity_paths: Vec<(JsonPathExpression, JsonPathExpression)>,
}

/// A table-producing location in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableScope {
    pub path: JsonPathExpression,
    /// Index of the parent scope; `None` for the root
    pub parent: Option<usize>,
    pub table: DbTableName,
    /// Singular base used to rename this scope's ordinal in child keys
    pub base_name: String,
    /// Array of descriptor strings rather than objects
    pub is_descriptor_collection: bool,
}

#[derive(Debug)]
pub struct RelationalModelBuilderContext {
    // Caller-supplied inputs
    pub api_schema: Value,
    pub resource_endpoint_name: String,
    pub core_names: CoreSchemaNames,
    pub name_overrides: BTreeMap<String, String>,
    pub string_max_length_omissions: BTreeSet<String>,

    // Filled by ExtractInputsStep
    pub project_name: String,
    pub project_endpoint_name: String,
    pub resource_name: String,
    pub physical_schema: Option<DbSchemaName>,
    pub json_schema_for_insert: Option<Value>,
    pub descriptor_paths: BTreeMap<JsonPathExpression, QualifiedResourceName>,
    pub document_references: Vec<DocumentReferenceMapping>,
    pub decimal_validation: BTreeMap<JsonPathExpression, DecimalPropertyValidationInfo>,
    pub identity_paths: Vec<JsonPathExpression>,

    // Filled by the derivation steps
    pub extension_sites: Vec<ExtensionSite>,
    pub table_scopes: Vec<TableScope>,
    /// Parallel to `table_scopes`
    pub tables: Vec<DbTableModel>,
    pub read_order: Vec<usize>,
    pub write_order: Vec<usize>,
    pub descriptor_edges: Vec<DescriptorEdgeSource>,
    pub document_reference_bindings: Vec<DocumentReferenceBinding>,
}

impl RelationalModelBuilderContext {
    /// Start a build for the resource stored under `resource_endpoint_name`
    /// in `api_schema.projectSchema.resourceSchemas`.
    pub fn new(api_schema: Value, resource_endpoint_name: impl Into<String>) -> Self {
        Self {
            api_schema,
            resource_endpoint_name: resource_endpoint_name.into(),
            core_names: CoreSchemaNames::default(),
            name_overrides: BTreeMap::new(),
            string_max_length_omissions: BTreeSet::new(),
            project_name: String::new(),
            project_endpoint_name: String::new(),
            resource_name: String::new(),
            physical_schema: None,
            json_schema_for_insert: None,
            descriptor_paths: BTreeMap::new(),
            document_references: Vec::new(),
            decimal_validation: BTreeMap::new(),
            identity_paths: Vec::new(),
            extension_sites: Vec::new(),
            table_scopes: Vec::new(),
            tables: Vec::new(),
            read_order: Vec::new(),
            write_order: Vec::new(),
            descriptor_edges: Vec::new(),
            document_reference_bindings: Vec::new(),
        }
    }

    pub fn with_core_names(mut self, core_names: CoreSchemaNames) -> Self {
        self.core_names = core_names;
        self
    }

    /// JSON path (canonical form) -> column name.
    pub fn with_name_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.name_overrides = overrides;
        self
    }

    /// Paths whose strings may omit `maxLength` (durations, enumerations).
    pub fn with_string_max_length_omissions(mut self, paths: BTreeSet<String>) -> Self {
        self.string_max_length_omissions = paths;
        self
    }

    pub fn resource(&self) -> QualifiedResourceName {
        QualifiedResourceName::new(&self.project_name, &self.resource_name)
    }

    pub fn is_extension_path(&self, path: &JsonPathExpression) -> bool {
        self.extension_sites
            .iter()
            .any(|site| path.starts_with(&site.extension_path))
    }

    /// Finish the run and return the immutable IR.
    pub fn into_result(self) -> Result<RelationalModelBuildResult, ModelError> {
        let physical_schema = self.physical_schema.ok_or_else(|| ModelError::MissingInput {
            path: "$.projectSchema.projectEndpointName".to_string(),
        })?;
        let resource = QualifiedResourceName::new(self.project_name, self.resource_name);

        Ok(RelationalModelBuildResult {
            resource_model: RelationalResourceModel {
                resource,
                physical_schema,
                tables: self.tables,
                read_order: self.read_order,
                write_order: self.write_order,
                document_references: self.document_reference_bindings,
                descriptor_edges: self.descriptor_edges,
            },
            extension_sites: self.extension_sites,
        })
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalModelBuildResult {
    pub resource_model: RelationalResourceModel,
    pub extension_sites: Vec<ExtensionSite>,
}
