//! Locates `_ext` properties so later steps can leave them out.

use serde_json::Value;

use super::{RelationalModelBuilderStep, schema_type};
use crate::model::ModelError;
use crate::model::context::RelationalModelBuilderContext;
use crate::model::definition::ExtensionSite;
use crate::model::path::JsonPathExpression;

pub const EXTENSION_PROPERTY: &str = "_ext";

pub struct DiscoverExtensionSitesStep;

impl RelationalModelBuilderStep for DiscoverExtensionSitesStep {
    fn name(&self) -> &'static str {
        "DiscoverExtensionSites"
    }

    fn execute(&self, context: &mut RelationalModelBuilderContext) -> Result<(), ModelError> {
        let schema = context
            .json_schema_for_insert
            .as_ref()
            .ok_or_else(|| ModelError::MissingInput {
                path: "jsonSchemaForInsert".to_string(),
            })?;

        let mut sites = Vec::new();
        collect_sites(schema, &JsonPathExpression::root(), &mut sites);
        context.extension_sites = sites;
        Ok(())
    }
}

fn collect_sites(schema: &Value, path: &JsonPathExpression, sites: &mut Vec<ExtensionSite>) {
    match schema_type(schema) {
        Some("object") => {
            let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
                return;
            };
            for (name, property) in properties {
                if name == EXTENSION_PROPERTY {
                    let mut project_keys: Vec<String> = property
                        .get("properties")
                        .and_then(Value::as_object)
                        .map(|p| p.keys().cloned().collect())
                        .unwrap_or_default();
                    project_keys.sort();
                    sites.push(ExtensionSite {
                        owning_scope: path.clone(),
                        extension_path: path.child_property(name),
                        project_keys,
                    });
                } else {
                    collect_sites(property, &path.child_property(name), sites);
                }
            }
        }
        Some("array") => {
            if let Some(items) = schema.get("items") {
                collect_sites(items, &path.child_any_element(), sites);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pipeline::test_support::school_api_schema;
    use crate::model::pipeline::{ExtractInputsStep, ValidateJsonSchemaStep};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn test_finds_root_extension_site() {
        let mut context = RelationalModelBuilderContext::new(school_api_schema(), "schools");
        ExtractInputsStep.execute(&mut context).unwrap();
        ValidateJsonSchemaStep.execute(&mut context).unwrap();
        DiscoverExtensionSitesStep.execute(&mut context).unwrap();

        assert_eq!(context.extension_sites.len(), 1);
        let site = &context.extension_sites[0];
        assert_eq!(site.owning_scope.canonical(), "$");
        assert_eq!(site.extension_path.canonical(), "$._ext");
        assert_eq!(site.project_keys, vec!["sample".to_string()]);
    }

    #[rstest]
    fn test_finds_sites_inside_collections() {
        let schema = json!({
            "type": "object",
            "properties": {
                "addresses": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "_ext": {
                                "type": "object",
                                "properties": {
                                    "tpdm": { "type": "object", "properties": {} },
                                    "sample": { "type": "object", "properties": {} }
                                }
                            }
                        }
                    }
                }
            }
        });
        let mut sites = Vec::new();
        collect_sites(&schema, &JsonPathExpression::root(), &mut sites);

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].owning_scope.canonical(), "$.addresses[*]");
        assert_eq!(sites[0].extension_path.canonical(), "$.addresses[*]._ext");
        assert_eq!(sites[0].project_keys, vec!["sample".to_string(), "tpdm".to_string()]);
    }
}
