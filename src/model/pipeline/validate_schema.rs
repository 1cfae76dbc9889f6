//! Rejects JSON Schema constructs the relational mapping cannot represent.
//!
//! Errors name the location inside the schema document
//! (`$.properties.x.$ref`), not the data path.

use serde_json::Value;

use super::extension_sites::EXTENSION_PROPERTY;
use super::{RelationalModelBuilderStep, schema_type};
use crate::model::ModelError;
use crate::model::context::RelationalModelBuilderContext;
use crate::model::path::JsonPathExpression;

/// Keywords with no relational meaning.
const UNSUPPORTED_KEYWORDS: &[&str] = &["$ref", "oneOf", "anyOf", "allOf", "patternProperties"];

const SCALAR_TYPES: &[&str] = &["string", "integer", "number", "boolean"];

pub struct ValidateJsonSchemaStep;

impl RelationalModelBuilderStep for ValidateJsonSchemaStep {
    fn name(&self) -> &'static str {
        "ValidateJsonSchema"
    }

    fn execute(&self, context: &mut RelationalModelBuilderContext) -> Result<(), ModelError> {
        let schema = context
            .json_schema_for_insert
            .as_ref()
            .ok_or_else(|| ModelError::MissingInput {
                path: "jsonSchemaForInsert".to_string(),
            })?;

        if schema_type(schema) != Some("object") {
            check_keywords(schema, "$")?;
            return Err(ModelError::InvalidRootSchema {
                path: "$".to_string(),
            });
        }

        let validator = SchemaValidator { context: &*context };
        validator.validate_node(schema, "$", &JsonPathExpression::root())
    }
}

struct SchemaValidator<'a> {
    context: &'a RelationalModelBuilderContext,
}

impl SchemaValidator<'_> {
    fn validate_node(
        &self,
        schema: &Value,
        schema_path: &str,
        data_path: &JsonPathExpression,
    ) -> Result<(), ModelError> {
        check_keywords(schema, schema_path)?;

        let type_name = match schema.get("type") {
            Some(Value::String(t)) => t.as_str(),
            _ => {
                return Err(ModelError::UnsupportedSchemaConstruct {
                    keyword: "type".to_string(),
                    path: format!("{}.type", schema_path),
                });
            }
        };

        if schema.get("enum").is_some() && type_name != "string" {
            return Err(ModelError::UnsupportedSchemaConstruct {
                keyword: "enum".to_string(),
                path: format!("{}.enum", schema_path),
            });
        }

        match type_name {
            "object" => {
                if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                    for (name, property) in properties {
                        // Extension payloads belong to their own project's model.
                        if name == EXTENSION_PROPERTY {
                            continue;
                        }
                        self.validate_node(
                            property,
                            &format!("{}.properties.{}", schema_path, name),
                            &data_path.child_property(name),
                        )?;
                    }
                }
                Ok(())
            }
            "array" => self.validate_items(schema, schema_path, data_path),
            t if SCALAR_TYPES.contains(&t) => Ok(()),
            _ => Err(ModelError::UnsupportedSchemaConstruct {
                keyword: "type".to_string(),
                path: format!("{}.type", schema_path),
            }),
        }
    }

    fn validate_items(
        &self,
        schema: &Value,
        schema_path: &str,
        data_path: &JsonPathExpression,
    ) -> Result<(), ModelError> {
        let items_path = format!("{}.items", schema_path);
        let element_path = data_path.child_any_element();
        let items = schema
            .get("items")
            .filter(|i| i.is_object())
            .ok_or_else(|| ModelError::UnsupportedArrayItems {
                path: items_path.clone(),
            })?;

        match schema_type(items) {
            Some("object") => self.validate_node(items, &items_path, &element_path),
            Some("string") if self.context.descriptor_paths.contains_key(&element_path) => {
                check_keywords(items, &items_path)
            }
            _ => {
                check_keywords(items, &items_path)?;
                Err(ModelError::UnsupportedArrayItems { path: items_path })
            }
        }
    }
}

fn check_keywords(schema: &Value, schema_path: &str) -> Result<(), ModelError> {
    for keyword in UNSUPPORTED_KEYWORDS {
        if schema.get(*keyword).is_some() {
            return Err(ModelError::UnsupportedSchemaConstruct {
                keyword: keyword.to_string(),
                path: format!("{}.{}", schema_path, keyword),
            });
        }
    }
    Ok(())
}
