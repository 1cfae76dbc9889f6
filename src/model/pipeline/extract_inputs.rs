//! Pulls the resource schema and its side tables out of the ApiSchema document.

use serde_json::Value;

use super::RelationalModelBuilderStep;
use crate::model::ModelError;
use crate::model::context::{
    DecimalPropertyValidationInfo, DocumentReferenceMapping, RelationalModelBuilderContext,
};
use crate::model::definition::{DbSchemaName, QualifiedResourceName};
use crate::model::path::JsonPathExpression;

pub struct ExtractInputsStep;

impl RelationalModelBuilderStep for ExtractInputsStep {
    fn name(&self) -> &'static str {
        "ExtractInputs"
    }

    fn execute(&self, context: &mut RelationalModelBuilderContext) -> Result<(), ModelError> {
        let project = context
            .api_schema
            .get("projectSchema")
            .ok_or_else(|| missing("$.projectSchema"))?;

        let project_name = required_str(project, "projectName", "$.projectSchema")?.to_string();
        let endpoint_name =
            required_str(project, "projectEndpointName", "$.projectSchema")?.to_string();

        let resource_path = format!(
            "$.projectSchema.resourceSchemas.{}",
            context.resource_endpoint_name
        );
        let resource = project
            .get("resourceSchemas")
            .and_then(|r| r.get(&context.resource_endpoint_name))
            .ok_or_else(|| missing(&resource_path))?;

        let resource_name = required_str(resource, "resourceName", &resource_path)?.to_string();

        if resource.get("isDescriptor").and_then(Value::as_bool).unwrap_or(false) {
            return Err(ModelError::DescriptorResource {
                resource: format!("{}.{}", project_name, resource_name),
            });
        }

        let json_schema = resource
            .get("jsonSchemaForInsert")
            .cloned()
            .ok_or_else(|| missing(&format!("{}.jsonSchemaForInsert", resource_path)))?;

        let identity_paths = resource
            .get("identityJsonPaths")
            .and_then(Value::as_array)
            .map(|paths| {
                paths
                    .iter()
                    .filter_map(Value::as_str)
                    .map(JsonPathExpression::compile)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        if let Some(mappings) = resource.get("documentPathsMapping").and_then(Value::as_object) {
            for (key, mapping) in mappings {
                let is_reference = flag(mapping, "isReference");
                if !is_reference {
                    continue;
                }
                let mapping_path = format!("{}.documentPathsMapping.{}", resource_path, key);
                let target = QualifiedResourceName::new(
                    required_str(mapping, "projectName", &mapping_path)?,
                    required_str(mapping, "resourceName", &mapping_path)?,
                );

                if flag(mapping, "isDescriptor") {
                    let path = JsonPathExpression::compile(required_str(mapping, "path", &mapping_path)?)?;
                    context.descriptor_paths.insert(path, target);
                } else {
                    context
                        .document_references
                        .push(extract_reference(mapping, &mapping_path, target)?);
                }
            }
        }

        if let Some(infos) = resource
            .get("decimalPropertyValidationInfos")
            .and_then(Value::as_array)
        {
            for info in infos {
                let path = JsonPathExpression::compile(required_str(
                    info,
                    "path",
                    &format!("{}.decimalPropertyValidationInfos", resource_path),
                )?)?;
                let total_digits = precision_field(info, "totalDigits", &path)?;
                let decimal_places = precision_field(info, "decimalPlaces", &path)?;
                context.decimal_validation.insert(
                    path.clone(),
                    DecimalPropertyValidationInfo {
                        path,
                        total_digits,
                        decimal_places,
                    },
                );
            }
        }

        context.physical_schema = Some(DbSchemaName::new(&endpoint_name));
        context.project_name = project_name;
        context.project_endpoint_name = endpoint_name;
        context.resource_name = resource_name;
        context.json_schema_for_insert = Some(json_schema);
        context.identity_paths = identity_paths;
        Ok(())
    }
}

fn extract_reference(
    mapping: &Value,
    mapping_path: &str,
    target: QualifiedResourceName,
) -> Result<DocumentReferenceMapping, ModelError> {
    let pairs = mapping
        .get("referenceJsonPaths")
        .and_then(Value::as_array)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| missing(&format!("{}.referenceJsonPaths", mapping_path)))?;

    let mut identity_paths = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let identity = JsonPathExpression::compile(required_str(pair, "identityJsonPath", mapping_path)?)?;
        let reference = JsonPathExpression::compile(required_str(pair, "referenceJsonPath", mapping_path)?)?;
        identity_paths.push((identity, reference));
    }

    let reference_object_path = identity_paths[0]
        .1
        .parent()
        .ok_or_else(|| missing(&format!("{}.referenceJsonPaths", mapping_path)))?;

    Ok(DocumentReferenceMapping {
        target_resource: target,
        reference_object_path,
        identity_paths,
    })
}

/// A `u16` precision/scale value; out-of-range values are rejected rather than wrapped.
fn precision_field(
    info: &Value,
    key: &str,
    path: &JsonPathExpression,
) -> Result<Option<u16>, ModelError> {
    info.get(key)
        .and_then(Value::as_u64)
        .map(|value| {
            u16::try_from(value).map_err(|_| ModelError::ValueOutOfRange {
                keyword: key.to_string(),
                path: path.to_string(),
                value,
            })
        })
        .transpose()
}

fn flag(node: &Value, key: &str) -> bool {
    node.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn required_str<'a>(node: &'a Value, key: &str, parent_path: &str) -> Result<&'a str, ModelError> {
    node.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(&format!("{}.{}", parent_path, key)))
}

fn missing(path: &str) -> ModelError {
    ModelError::MissingInput {
        path: path.to_string(),
    }
}
