//! Ordered build steps over a shared `RelationalModelBuilderContext`.
//!
//! Steps communicate only through the context. The standard order is fixed:
//! extract inputs, validate the schema, discover `_ext` sites, derive table
//! scopes and keys, derive columns and descriptor edges, canonicalize.

mod canonicalize;
mod columns;
mod extension_sites;
mod extract_inputs;
mod table_scopes;
mod validate_schema;

pub use canonicalize::CanonicalizeOrderingStep;
pub use columns::DeriveColumnsAndDescriptorEdgesStep;
pub use extension_sites::DiscoverExtensionSitesStep;
pub use extract_inputs::ExtractInputsStep;
pub use table_scopes::DeriveTableScopesAndKeysStep;
pub use validate_schema::ValidateJsonSchemaStep;

use tracing::debug;

use super::ModelError;
use super::context::{RelationalModelBuildResult, RelationalModelBuilderContext};

/// A single-purpose transform over the builder context.
pub trait RelationalModelBuilderStep: Send + Sync {
    /// Step name for logging.
    fn name(&self) -> &'static str;

    fn execute(&self, context: &mut RelationalModelBuilderContext) -> Result<(), ModelError>;
}

/// Runs steps strictly in construction order.
pub struct RelationalModelBuilderPipeline {
    steps: Vec<Box<dyn RelationalModelBuilderStep>>,
}

impl RelationalModelBuilderPipeline {
    pub fn new(steps: Vec<Box<dyn RelationalModelBuilderStep>>) -> Self {
        Self { steps }
    }

    /// The six steps in their fixed order.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ExtractInputsStep),
            Box::new(ValidateJsonSchemaStep),
            Box::new(DiscoverExtensionSitesStep),
            Box::new(DeriveTableScopesAndKeysStep),
            Box::new(DeriveColumnsAndDescriptorEdgesStep),
            Box::new(CanonicalizeOrderingStep),
        ])
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn run(
        &self,
        mut context: RelationalModelBuilderContext,
    ) -> Result<RelationalModelBuildResult, ModelError> {
        for step in &self.steps {
            debug!(
                step = step.name(),
                resource = %context.resource_endpoint_name,
                "running model builder step"
            );
            step.execute(&mut context)?;
        }
        context.into_result()
    }
}

impl Default for RelationalModelBuilderPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Read `type` from a schema node, if it is a single string.
pub(crate) fn schema_type(schema: &serde_json::Value) -> Option<&str> {
    schema.get("type").and_then(|t| t.as_str())
}

/// Names listed in a schema node's `required` array.
pub(crate) fn required_names(schema: &serde_json::Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::test_support::school_api_schema;
    use super::*;
    use rstest::rstest;

    struct RecordingStep(&'static str);

    impl RelationalModelBuilderStep for RecordingStep {
        fn name(&self) -> &'static str {
            self.0
        }

        fn execute(&self, context: &mut RelationalModelBuilderContext) -> Result<(), ModelError> {
            context.resource_name.push_str(self.0);
            Ok(())
        }
    }

    #[rstest]
    fn test_standard_step_order() {
        let pipeline = RelationalModelBuilderPipeline::standard();
        assert_eq!(
            pipeline.step_names(),
            vec![
                "ExtractInputs",
                "ValidateJsonSchema",
                "DiscoverExtensionSites",
                "DeriveTableScopesAndKeys",
                "DeriveColumnsAndDescriptorEdges",
                "CanonicalizeOrdering",
            ]
        );
    }

    #[rstest]
    fn test_steps_run_in_construction_order() {
        let pipeline = RelationalModelBuilderPipeline::new(vec![
            Box::new(ExtractInputsStep),
            Box::new(RecordingStep("A")),
            Box::new(RecordingStep("B")),
        ]);
        let context = RelationalModelBuilderContext::new(school_api_schema(), "schools");
        let result = pipeline.run(context).unwrap();
        assert_eq!(result.resource_model.resource.resource_name, "SchoolAB");
    }

    #[rstest]
    fn test_failing_step_aborts_run() {
        let pipeline = RelationalModelBuilderPipeline::standard();
        let context = RelationalModelBuilderContext::new(school_api_schema(), "missing");
        let err = pipeline.run(context).unwrap_err();
        assert!(matches!(err, ModelError::MissingInput { .. }));
    }
}
