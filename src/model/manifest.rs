//! Canonical JSON rendering of a build result.
//!
//! Field order in the DTOs below is the key order of the output, so the
//! manifest is stable across runs and platforms. Used for snapshot tests and
//! for inspecting a model outside this crate.

use serde::Serialize;

use super::context::RelationalModelBuildResult;
use super::definition::{
    DbColumnModel, DbTableModel, DescriptorEdgeSource, ExtensionSite, RelationalScalarType,
    TableConstraint,
};

pub struct RelationalModelManifestEmitter;

impl RelationalModelManifestEmitter {
    /// Render `result` as pretty-printed JSON with LF line endings and a
    /// trailing newline.
    pub fn emit(result: &RelationalModelBuildResult) -> String {
        let manifest = Manifest::from(result);
        let mut text = serde_json::to_string_pretty(&manifest).unwrap_or_default();
        text.push('\n');
        text
    }
}

#[derive(Serialize)]
struct Manifest {
    resource: ResourceEntry,
    physical_schema: String,
    tables: Vec<TableEntry>,
    descriptor_edge_sources: Vec<DescriptorEdgeEntry>,
    extension_sites: Vec<ExtensionSiteEntry>,
}

#[derive(Serialize)]
struct ResourceEntry {
    project_name: String,
    resource_name: String,
}

#[derive(Serialize)]
struct TableEntry {
    name: String,
    scope: String,
    key_columns: Vec<String>,
    columns: Vec<ColumnEntry>,
    constraints: Vec<ConstraintEntry>,
}

#[derive(Serialize)]
struct ColumnEntry {
    name: String,
    kind: &'static str,
    scalar_type: Option<ScalarTypeEntry>,
    is_nullable: bool,
    source_path: Option<String>,
}

#[derive(Serialize)]
struct ScalarTypeEntry {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    precision: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale: Option<u16>,
}

#[derive(Serialize)]
struct ConstraintEntry {
    kind: &'static str,
    name: String,
    columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    on_delete: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    on_update: Option<&'static str>,
}

#[derive(Serialize)]
struct DescriptorEdgeEntry {
    table: String,
    column: String,
    source_path: String,
    is_identity_component: bool,
    descriptor_resource: String,
}

#[derive(Serialize)]
struct ExtensionSiteEntry {
    owning_scope: String,
    extension_path: String,
    project_keys: Vec<String>,
}

impl From<&RelationalModelBuildResult> for Manifest {
    fn from(result: &RelationalModelBuildResult) -> Self {
        let model = &result.resource_model;
        Self {
            resource: ResourceEntry {
                project_name: model.resource.project_name.clone(),
                resource_name: model.resource.resource_name.clone(),
            },
            physical_schema: model.physical_schema.to_string(),
            tables: model.tables.iter().map(TableEntry::from).collect(),
            descriptor_edge_sources: model
                .descriptor_edges
                .iter()
                .map(DescriptorEdgeEntry::from)
                .collect(),
            extension_sites: result
                .extension_sites
                .iter()
                .map(ExtensionSiteEntry::from)
                .collect(),
        }
    }
}

impl From<&DbTableModel> for TableEntry {
    fn from(table: &DbTableModel) -> Self {
        Self {
            name: table.table.to_string(),
            scope: table.json_scope.to_string(),
            key_columns: table.key.columns.iter().map(|c| c.name.to_string()).collect(),
            columns: table.columns.iter().map(ColumnEntry::from).collect(),
            constraints: table.constraints.iter().map(ConstraintEntry::from).collect(),
        }
    }
}

impl From<&DbColumnModel> for ColumnEntry {
    fn from(column: &DbColumnModel) -> Self {
        Self {
            name: column.name.to_string(),
            kind: column.kind.as_str(),
            scalar_type: column.scalar_type.map(ScalarTypeEntry::from),
            is_nullable: column.is_nullable,
            source_path: column.source_path.as_ref().map(ToString::to_string),
        }
    }
}

impl From<RelationalScalarType> for ScalarTypeEntry {
    fn from(scalar_type: RelationalScalarType) -> Self {
        let (max_length, precision, scale) = match scalar_type {
            RelationalScalarType::String { max_length } => (max_length, None, None),
            RelationalScalarType::Decimal { precision, scale } => (None, Some(precision), Some(scale)),
            _ => (None, None, None),
        };
        Self {
            kind: scalar_type.kind_name(),
            max_length,
            precision,
            scale,
        }
    }
}

impl From<&TableConstraint> for ConstraintEntry {
    fn from(constraint: &TableConstraint) -> Self {
        let names = |columns: &[super::definition::DbColumnName]| {
            columns.iter().map(ToString::to_string).collect::<Vec<_>>()
        };
        let mut entry = Self {
            kind: constraint.kind_name(),
            name: constraint.name().to_string(),
            columns: Vec::new(),
            target_table: None,
            target_columns: None,
            on_delete: None,
            on_update: None,
        };
        match constraint {
            TableConstraint::Unique { columns, .. } => entry.columns = names(columns),
            TableConstraint::ForeignKey {
                columns,
                target_table,
                target_columns,
                on_delete,
                on_update,
                ..
            } => {
                entry.columns = names(columns);
                entry.target_table = Some(target_table.to_string());
                entry.target_columns = Some(names(target_columns));
                entry.on_delete = Some(on_delete.as_str());
                entry.on_update = Some(on_update.as_str());
            }
            TableConstraint::AllOrNoneNullability {
                fk_column,
                dependent_columns,
                ..
            } => {
                entry.columns = std::iter::once(fk_column.to_string())
                    .chain(dependent_columns.iter().map(ToString::to_string))
                    .collect();
            }
        }
        entry
    }
}

impl From<&DescriptorEdgeSource> for DescriptorEdgeEntry {
    fn from(edge: &DescriptorEdgeSource) -> Self {
        Self {
            table: edge.table.to_string(),
            column: edge.column.to_string(),
            source_path: edge.source_path.to_string(),
            is_identity_component: edge.is_identity_component,
            descriptor_resource: edge.descriptor_resource.to_string(),
        }
    }
}

impl From<&ExtensionSite> for ExtensionSiteEntry {
    fn from(site: &ExtensionSite) -> Self {
        Self {
            owning_scope: site.owning_scope.to_string(),
            extension_path: site.extension_path.to_string(),
            project_keys: site.project_keys.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationalModelBuilderContext;
    use crate::model::pipeline::RelationalModelBuilderPipeline;
    use crate::model::pipeline::test_support::school_api_schema;
    use rstest::{fixture, rstest};
    use serde_json::Value;

    #[fixture]
    fn manifest() -> String {
        let result = RelationalModelBuilderPipeline::standard()
            .run(RelationalModelBuilderContext::new(school_api_schema(), "schools"))
            .unwrap();
        RelationalModelManifestEmitter::emit(&result)
    }

    #[rstest]
    fn test_top_level_keys_in_order(manifest: String) {
        let positions: Vec<_> = [
            "\"resource\"",
            "\"physical_schema\"",
            "\"tables\"",
            "\"descriptor_edge_sources\"",
            "\"extension_sites\"",
        ]
        .iter()
        .map(|key| manifest.find(key).unwrap())
        .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[rstest]
    fn test_line_endings_and_trailing_newline(manifest: String) {
        assert!(!manifest.contains('\r'));
        assert!(manifest.ends_with("}\n"));
    }

    #[rstest]
    fn test_manifest_content(manifest: String) {
        let parsed: Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(parsed["resource"]["resource_name"], "School");
        assert_eq!(parsed["physical_schema"], "edfi");
        assert_eq!(parsed["tables"][0]["name"], "edfi.School");
        assert_eq!(parsed["tables"][0]["columns"][0]["name"], "DocumentId");
        assert_eq!(parsed["extension_sites"][0]["extension_path"], "$._ext");
        assert_eq!(parsed["descriptor_edge_sources"].as_array().unwrap().len(), 2);
    }

    #[rstest]
    fn test_emit_is_deterministic(manifest: String) {
        let again = RelationalModelBuilderPipeline::standard()
            .run(RelationalModelBuilderContext::new(school_api_schema(), "schools"))
            .unwrap();
        assert_eq!(manifest, RelationalModelManifestEmitter::emit(&again));
    }
}
