//! Flattens each table scope's properties into columns.
//!
//! Inline objects become prefixed columns (`$.birthData.city` -> `BirthDataCity`).
//! Descriptor-valued strings are replaced by a `{Name}_DescriptorId` foreign
//! key; document references by a `{Base}_DocumentId` key plus one column per
//! identity field. Nothing under `_ext` produces a column.

use serde_json::Value;

use super::extension_sites::EXTENSION_PROPERTY;
use super::{RelationalModelBuilderStep, required_names, schema_type};
use crate::model::ModelError;
use crate::model::context::{
    DocumentReferenceMapping, RelationalModelBuilderContext, TableScope,
};
use crate::model::definition::{
    DbColumnModel, DbColumnName, DbSchemaName, DbTableName, DescriptorEdgeSource,
    DocumentReferenceBinding, ReferenceIdentityColumn, ReferentialAction, RelationalScalarType,
    TableConstraint,
};
use crate::model::naming::{ColumnNameRegistry, RelationalNameConventions};
use crate::model::path::{JsonPathExpression, JsonPathSegment};

pub struct DeriveColumnsAndDescriptorEdgesStep;

impl RelationalModelBuilderStep for DeriveColumnsAndDescriptorEdgesStep {
    fn name(&self) -> &'static str {
        "DeriveColumnsAndDescriptorEdges"
    }

    fn execute(&self, context: &mut RelationalModelBuilderContext) -> Result<(), ModelError> {
        let schema = context
            .json_schema_for_insert
            .clone()
            .ok_or_else(|| ModelError::MissingInput {
                path: "jsonSchemaForInsert".to_string(),
            })?;

        for index in 0..context.table_scopes.len() {
            let derived = {
                let mut deriver = ColumnDeriver::new(context, index)?;
                deriver.derive(&schema)?;
                deriver.finish()
            };

            let table = &mut context.tables[index];
            table.columns.extend(derived.columns);
            table.constraints.extend(derived.constraints);
            context.descriptor_edges.extend(derived.edges);
            context.document_reference_bindings.extend(derived.bindings);
        }

        add_identity_constraint(context)
    }
}

/// Everything one scope contributes.
#[derive(Default)]
struct DerivedColumns {
    columns: Vec<DbColumnModel>,
    constraints: Vec<TableConstraint>,
    edges: Vec<DescriptorEdgeSource>,
    bindings: Vec<DocumentReferenceBinding>,
}

struct ColumnDeriver<'a> {
    context: &'a RelationalModelBuilderContext,
    scope: &'a TableScope,
    registry: ColumnNameRegistry,
    derived: DerivedColumns,
}

impl<'a> ColumnDeriver<'a> {
    fn new(context: &'a RelationalModelBuilderContext, index: usize) -> Result<Self, ModelError> {
        let scope = &context.table_scopes[index];
        let mut registry = ColumnNameRegistry::new(context.resource(), scope.table.clone());
        let key_source = format!("{} (key)", scope.path);
        for key_column in &context.tables[index].key.columns {
            registry.register(&key_column.name, &key_source)?;
        }
        Ok(Self {
            context,
            scope,
            registry,
            derived: DerivedColumns::default(),
        })
    }

    fn finish(self) -> DerivedColumns {
        self.derived
    }

    fn derive(&mut self, root_schema: &Value) -> Result<(), ModelError> {
        let scope = self.scope;
        let Some(scope_schema) = schema_at(root_schema, &scope.path) else {
            return Err(ModelError::MissingInput {
                path: scope.path.to_string(),
            });
        };

        if scope.is_descriptor_collection {
            return self
                .descriptor_column(&scope.base_name, &scope.path, false)
                .map(|_| ());
        }

        self.walk_object(scope_schema, &scope.path, &mut Vec::new(), true)
    }

    fn walk_object(
        &mut self,
        schema: &Value,
        path: &JsonPathExpression,
        prefix: &mut Vec<String>,
        all_required: bool,
    ) -> Result<(), ModelError> {
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return Ok(());
        };
        let required = required_names(schema);

        for (name, property) in properties {
            if name == EXTENSION_PROPERTY {
                continue;
            }
            let property_path = path.child_property(name);
            if self.context.is_extension_path(&property_path) {
                continue;
            }

            let is_required =
                all_required && required.contains(&name.as_str()) && !is_x_nullable(property);

            match schema_type(property) {
                Some("array") => {}
                Some("object") => {
                    if let Some(mapping) = self.reference_at(&property_path) {
                        let mut parts: Vec<&str> = prefix.iter().map(String::as_str).collect();
                        let base = RelationalNameConventions::reference_base_name(name);
                        parts.push(&base);
                        let base = RelationalNameConventions::to_column_name(&parts);
                        self.reference_columns(mapping, property, &base, !is_required)?;
                    } else {
                        prefix.push(name.clone());
                        self.walk_object(property, &property_path, prefix, is_required)?;
                        prefix.pop();
                    }
                }
                _ => {
                    let mut parts: Vec<&str> = prefix.iter().map(String::as_str).collect();
                    parts.push(name);
                    let stem = RelationalNameConventions::to_column_name(&parts);
                    self.leaf_column(&stem, property, &property_path, !is_required)?;
                }
            }
        }
        Ok(())
    }

    fn reference_at(&self, path: &JsonPathExpression) -> Option<&'a DocumentReferenceMapping> {
        self.context
            .document_references
            .iter()
            .find(|r| &r.reference_object_path == path)
    }

    /// A scalar or descriptor column for a leaf property.
    fn leaf_column(
        &mut self,
        stem: &str,
        schema: &Value,
        path: &JsonPathExpression,
        is_nullable: bool,
    ) -> Result<DbColumnName, ModelError> {
        if self.context.descriptor_paths.contains_key(path) {
            return self.descriptor_column(stem, path, is_nullable);
        }

        let name = self.claim(DbColumnName::new(stem), path)?;
        let scalar_type = self.scalar_type(schema, path)?;
        self.derived.columns.push(DbColumnModel::scalar(
            name.clone(),
            scalar_type,
            is_nullable,
            path.clone(),
        ));
        Ok(name)
    }

    fn descriptor_column(
        &mut self,
        stem: &str,
        path: &JsonPathExpression,
        is_nullable: bool,
    ) -> Result<DbColumnName, ModelError> {
        let descriptor_resource = self
            .context
            .descriptor_paths
            .get(path)
            .cloned()
            .ok_or_else(|| ModelError::MissingInput {
                path: format!("documentPathsMapping[{}]", path),
            })?;

        let name = self.claim(RelationalNameConventions::descriptor_column_name(stem), path)?;
        let table = &self.scope.table;
        let columns = vec![name.clone()];

        self.derived.constraints.push(TableConstraint::ForeignKey {
            name: RelationalNameConventions::foreign_key_name(table, &columns)?,
            columns,
            target_table: self.context.core_names.descriptor_table(),
            target_columns: vec![self.context.core_names.document_id_column()],
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        });
        self.derived.edges.push(DescriptorEdgeSource {
            table: table.clone(),
            column: name.clone(),
            source_path: path.clone(),
            is_identity_component: self.context.identity_paths.contains(path),
            descriptor_resource: descriptor_resource.clone(),
        });
        self.derived.columns.push(DbColumnModel::descriptor_fk(
            name.clone(),
            is_nullable,
            path.clone(),
            descriptor_resource,
        ));
        Ok(name)
    }

    fn reference_columns(
        &mut self,
        mapping: &DocumentReferenceMapping,
        schema: &Value,
        base: &str,
        is_nullable: bool,
    ) -> Result<(), ModelError> {
        let reference_path = &mapping.reference_object_path;
        let fk_column = self.claim(
            RelationalNameConventions::document_fk_column_name(base),
            reference_path,
        )?;
        self.derived.columns.push(DbColumnModel::document_fk(
            fk_column.clone(),
            is_nullable,
            reference_path.clone(),
            mapping.target_resource.clone(),
        ));

        let mut identity_columns = Vec::with_capacity(mapping.identity_paths.len());
        for (identity_path, path) in &mapping.identity_paths {
            let field = path.last_property().unwrap_or_default();
            let field_schema = schema_at(schema, &relative_to(path, reference_path))
                .cloned()
                .unwrap_or(Value::Null);
            let stem = format!("{}_{}", base, RelationalNameConventions::to_pascal_case(field));
            let column = self.leaf_column(&stem, &field_schema, path, is_nullable)?;
            identity_columns.push(ReferenceIdentityColumn {
                identity_path: identity_path.clone(),
                reference_path: path.clone(),
                column,
            });
        }

        let table = &self.scope.table;
        let fk_columns = vec![fk_column.clone()];
        let target = &mapping.target_resource;
        self.derived.constraints.push(TableConstraint::ForeignKey {
            name: RelationalNameConventions::foreign_key_name(table, &fk_columns)?,
            columns: fk_columns,
            target_table: DbTableName::new(
                DbSchemaName::new(&target.project_name),
                RelationalNameConventions::to_pascal_case(&target.resource_name),
            ),
            target_columns: vec![self.context.core_names.document_id_column()],
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        });

        if is_nullable {
            self.derived.constraints.push(TableConstraint::AllOrNoneNullability {
                name: RelationalNameConventions::all_or_none_constraint_name(table, &fk_column),
                fk_column: fk_column.clone(),
                dependent_columns: identity_columns.iter().map(|c| c.column.clone()).collect(),
            });
        }

        self.derived.bindings.push(DocumentReferenceBinding {
            reference_path: reference_path.clone(),
            table: table.clone(),
            fk_column,
            target_resource: target.clone(),
            is_required: !is_nullable,
            identity_columns,
        });
        Ok(())
    }

    /// Apply any configured override, then register the name.
    fn claim(
        &mut self,
        default_name: DbColumnName,
        path: &JsonPathExpression,
    ) -> Result<DbColumnName, ModelError> {
        let name = self
            .context
            .name_overrides
            .get(path.canonical())
            .map(DbColumnName::new)
            .unwrap_or(default_name);
        self.registry.register(&name, path.canonical())?;
        Ok(name)
    }

    fn scalar_type(
        &self,
        schema: &Value,
        path: &JsonPathExpression,
    ) -> Result<RelationalScalarType, ModelError> {
        match schema_type(schema) {
            Some("string") => self.string_type(schema, path),
            Some("integer") => Ok(integer_type(schema)),
            Some("number") => self.decimal_type(path),
            Some("boolean") => Ok(RelationalScalarType::Boolean),
            _ => Err(ModelError::UnsupportedSchemaConstruct {
                keyword: "type".to_string(),
                path: path.to_string(),
            }),
        }
    }

    fn string_type(
        &self,
        schema: &Value,
        path: &JsonPathExpression,
    ) -> Result<RelationalScalarType, ModelError> {
        match schema.get("format").and_then(Value::as_str) {
            Some("date") => return Ok(RelationalScalarType::Date),
            Some("date-time") => return Ok(RelationalScalarType::DateTime),
            Some("time") => return Ok(RelationalScalarType::Time),
            _ => {}
        }

        if let Some(max_length) = schema.get("maxLength").and_then(Value::as_u64) {
            let max_length = u32::try_from(max_length).map_err(|_| ModelError::ValueOutOfRange {
                keyword: "maxLength".to_string(),
                path: path.to_string(),
                value: max_length,
            })?;
            return Ok(RelationalScalarType::String {
                max_length: Some(max_length),
            });
        }

        if let Some(values) = schema.get("enum").and_then(Value::as_array) {
            let longest = values
                .iter()
                .filter_map(Value::as_str)
                .map(|v| v.chars().count() as u32)
                .max()
                .unwrap_or(0);
            return Ok(RelationalScalarType::String {
                max_length: Some(longest.max(1)),
            });
        }

        if self.context.string_max_length_omissions.contains(path.canonical()) {
            return Ok(RelationalScalarType::String { max_length: None });
        }

        Err(ModelError::MissingStringMaxLength {
            path: path.to_string(),
        })
    }

    fn decimal_type(&self, path: &JsonPathExpression) -> Result<RelationalScalarType, ModelError> {
        let info = self
            .context
            .decimal_validation
            .get(path)
            .ok_or_else(|| ModelError::MissingDecimalInfo {
                path: path.to_string(),
            })?;
        match (info.total_digits, info.decimal_places) {
            (Some(precision), Some(scale)) => Ok(RelationalScalarType::Decimal { precision, scale }),
            _ => Err(ModelError::IncompleteDecimalInfo {
                path: path.to_string(),
            }),
        }
    }
}

fn integer_type(schema: &Value) -> RelationalScalarType {
    if schema.get("format").and_then(Value::as_str) == Some("int64") {
        return RelationalScalarType::Int64;
    }
    let beyond_i32 = |key: &str| {
        schema
            .get(key)
            .and_then(Value::as_f64)
            .is_some_and(|v| v < i32::MIN as f64 || v > i32::MAX as f64)
    };
    if beyond_i32("minimum") || beyond_i32("maximum") {
        RelationalScalarType::Int64
    } else {
        RelationalScalarType::Int32
    }
}

fn is_x_nullable(schema: &Value) -> bool {
    schema.get("x-nullable").and_then(Value::as_bool).unwrap_or(false)
}

/// Follow `path` from `schema` through `properties` and `items`.
fn schema_at<'v>(schema: &'v Value, path: &JsonPathExpression) -> Option<&'v Value> {
    path.segments().iter().try_fold(schema, |node, segment| match segment {
        JsonPathSegment::Property(name) => node.get("properties")?.get(name),
        JsonPathSegment::AnyArrayElement => node.get("items"),
    })
}

/// `path` with the leading `prefix` segments removed, rooted at `$`.
fn relative_to(path: &JsonPathExpression, prefix: &JsonPathExpression) -> JsonPathExpression {
    let skip = prefix.segments().len();
    JsonPathExpression::from_segments(path.segments().iter().skip(skip).cloned().collect())
}

/// Adds the natural-key unique constraint to the root table.
fn add_identity_constraint(context: &mut RelationalModelBuilderContext) -> Result<(), ModelError> {
    if context.identity_paths.is_empty() {
        return Ok(());
    }
    let Some(root) = context.tables.first_mut() else {
        return Ok(());
    };

    let columns: Option<Vec<DbColumnName>> = context
        .identity_paths
        .iter()
        .map(|path| {
            root.columns
                .iter()
                .find(|c| c.source_path.as_ref() == Some(path))
                .map(|c| c.name.clone())
        })
        .collect();

    if let Some(columns) = columns {
        root.constraints.push(TableConstraint::Unique {
            name: RelationalNameConventions::unique_constraint_name(&root.table, &columns)?,
            columns,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::definition::{ColumnKind, DbTableModel};
    use crate::model::pipeline::test_support::{api_schema_with, school_api_schema};
    use crate::model::pipeline::{
        DeriveTableScopesAndKeysStep, DiscoverExtensionSitesStep, ExtractInputsStep,
        ValidateJsonSchemaStep,
    };
    use rstest::rstest;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn derive(context: &mut RelationalModelBuilderContext) -> Result<(), ModelError> {
        ExtractInputsStep.execute(context)?;
        ValidateJsonSchemaStep.execute(context)?;
        DiscoverExtensionSitesStep.execute(context)?;
        DeriveTableScopesAndKeysStep.execute(context)?;
        DeriveColumnsAndDescriptorEdgesStep.execute(context)
    }

    fn school() -> RelationalModelBuilderContext {
        let mut context = RelationalModelBuilderContext::new(school_api_schema(), "schools");
        derive(&mut context).unwrap();
        context
    }

    fn widget(properties: Value, required: Value) -> Result<RelationalModelBuilderContext, ModelError> {
        let api_schema = api_schema_with(json!({
            "resourceName": "Widget",
            "identityJsonPaths": [],
            "decimalPropertyValidationInfos": [
                { "path": "$.partial", "totalDigits": 5 }
            ],
            "jsonSchemaForInsert": {
                "type": "object",
                "required": required,
                "properties": properties
            }
        }));
        let mut context = RelationalModelBuilderContext::new(api_schema, "schools");
        derive(&mut context)?;
        Ok(context)
    }

    fn table<'a>(context: &'a RelationalModelBuilderContext, name: &str) -> &'a DbTableModel {
        context.tables.iter().find(|t| t.table.name == name).unwrap()
    }

    fn column<'a>(table: &'a DbTableModel, name: &str) -> &'a DbColumnModel {
        table
            .column(&DbColumnName::new(name))
            .unwrap_or_else(|| panic!("missing column {}", name))
    }

    #[rstest]
    fn test_scalar_columns_and_nullability() {
        let context = school();
        let root = table(&context, "School");

        let name = column(root, "NameOfInstitution");
        assert_eq!(name.scalar_type, Some(RelationalScalarType::String { max_length: Some(75) }));
        assert!(!name.is_nullable);

        let opened = column(root, "OpenedOn");
        assert_eq!(opened.scalar_type, Some(RelationalScalarType::Date));
        assert!(opened.is_nullable);

        let budget = column(root, "Budget");
        assert_eq!(
            budget.scalar_type,
            Some(RelationalScalarType::Decimal { precision: 9, scale: 2 })
        );
    }

    #[rstest]
    fn test_descriptor_substitution() {
        let context = school();
        let root = table(&context, "School");
        let descriptor_path = JsonPathExpression::compile("$.schoolTypeDescriptor").unwrap();

        let scalars_for_path = root
            .columns
            .iter()
            .filter(|c| c.source_path.as_ref() == Some(&descriptor_path))
            .collect::<Vec<_>>();
        assert_eq!(scalars_for_path.len(), 1);
        assert_eq!(scalars_for_path[0].kind, ColumnKind::DescriptorFk);
        assert_eq!(scalars_for_path[0].name.as_str(), "SchoolTypeDescriptor_DescriptorId");

        let fks_to_descriptor = root
            .constraints
            .iter()
            .filter(|c| matches!(c, TableConstraint::ForeignKey { target_table, .. } if target_table.to_string() == "dms.Descriptor"))
            .count();
        assert_eq!(fks_to_descriptor, 1);

        let edges: Vec<_> = context
            .descriptor_edges
            .iter()
            .filter(|e| e.source_path == descriptor_path)
            .collect();
        assert_eq!(edges.len(), 1);
        assert!(!edges[0].is_identity_component);
    }

    #[rstest]
    fn test_descriptor_in_collection() {
        let context = school();
        let grade = table(&context, "SchoolGradeLevel");
        let fk = column(grade, "GradeLevelDescriptor_DescriptorId");
        assert!(!fk.is_nullable);
        assert_eq!(
            fk.target_resource.as_ref().unwrap().resource_name,
            "GradeLevelDescriptor"
        );
    }

    #[rstest]
    fn test_document_reference_columns() {
        let context = school();
        let root = table(&context, "School");

        let fk = column(root, "LocalEducationAgency_DocumentId");
        assert_eq!(fk.kind, ColumnKind::DocumentFk);
        assert!(fk.is_nullable);
        let identity = column(root, "LocalEducationAgency_LocalEducationAgencyId");
        assert_eq!(identity.scalar_type, Some(RelationalScalarType::Int32));

        assert!(root.constraints.iter().any(|c| matches!(
            c,
            TableConstraint::ForeignKey { target_table, .. } if target_table.to_string() == "edfi.LocalEducationAgency"
        )));
        assert!(root.constraints.iter().any(|c| matches!(
            c,
            TableConstraint::AllOrNoneNullability { dependent_columns, .. } if dependent_columns.len() == 1
        )));

        let binding = &context.document_reference_bindings[0];
        assert!(!binding.is_required);
        assert_eq!(binding.identity_columns.len(), 1);
    }

    #[rstest]
    fn test_identity_unique_constraint() {
        let context = school();
        let root = table(&context, "School");
        assert!(root.constraints.iter().any(|c| matches!(
            c,
            TableConstraint::Unique { name, .. } if name.as_str() == "UX_School_SchoolId"
        )));
    }

    #[rstest]
    fn test_extension_properties_produce_no_columns() {
        let context = school();
        for table in &context.tables {
            for column in &table.columns {
                assert!(!column.name.as_str().contains("Exemplary"));
                assert!(!column.name.as_str().contains("PetName"));
            }
        }
    }

    #[rstest]
    fn test_inline_object_prefixes_columns() {
        let context = widget(
            json!({
                "birthData": {
                    "type": "object",
                    "properties": { "birthCity": { "type": "string", "maxLength": 30 } }
                }
            }),
            json!([]),
        )
        .unwrap();
        let root = table(&context, "Widget");
        assert!(column(root, "BirthDataBirthCity").is_nullable);
    }

    #[rstest]
    fn test_column_collision_reported() {
        let err = widget(
            json!({
                "a-b": { "type": "string", "maxLength": 5 },
                "a_b": { "type": "string", "maxLength": 5 }
            }),
            json!([]),
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Ed-Fi.Widget"));
        assert!(message.contains("$.a-b"));
        assert!(message.contains("$.a_b"));
        assert!(message.contains("relational.nameOverrides"));
    }

    #[rstest]
    fn test_case_only_column_collision_reported() {
        let err = widget(
            json!({
                "aB": { "type": "string", "maxLength": 5 },
                "ab": { "type": "string", "maxLength": 5 }
            }),
            json!([]),
        )
        .unwrap_err();
        match err {
            ModelError::ColumnNameCollision {
                first_path,
                second_path,
                ..
            } => {
                let mut paths = vec![first_path, second_path];
                paths.sort();
                assert_eq!(paths, vec!["$.aB", "$.ab"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[rstest]
    fn test_property_colliding_with_key_column_reported() {
        let err = widget(json!({ "documentId": { "type": "integer" } }), json!([])).unwrap_err();
        assert!(matches!(err, ModelError::ColumnNameCollision { .. }));
    }

    #[rstest]
    fn test_oversized_max_length_rejected() {
        let err = widget(
            json!({ "notes": { "type": "string", "maxLength": 5_000_000_000u64 } }),
            json!([]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::ValueOutOfRange {
                keyword: "maxLength".to_string(),
                path: "$.notes".to_string(),
                value: 5_000_000_000,
            }
        );
    }

    #[rstest]
    fn test_name_override_resolves_collision() {
        let api_schema = api_schema_with(json!({
            "resourceName": "Widget",
            "jsonSchemaForInsert": {
                "type": "object",
                "properties": {
                    "a-b": { "type": "string", "maxLength": 5 },
                    "a_b": { "type": "string", "maxLength": 5 }
                }
            }
        }));
        let overrides = BTreeMap::from([("$.a_b".to_string(), "AUnderscoreB".to_string())]);
        let mut context =
            RelationalModelBuilderContext::new(api_schema, "schools").with_name_overrides(overrides);
        derive(&mut context).unwrap();
        let root = table(&context, "Widget");
        assert!(root.column(&DbColumnName::new("AUnderscoreB")).is_some());
        assert!(root.column(&DbColumnName::new("AB")).is_some());
    }

    #[rstest]
    #[case(json!({ "name": { "type": "string" } }), "MissingStringMaxLength")]
    #[case(json!({ "amount": { "type": "number" } }), "MissingDecimalInfo")]
    #[case(json!({ "partial": { "type": "number" } }), "IncompleteDecimalInfo")]
    fn test_missing_metadata_names_path(#[case] properties: Value, #[case] expected: &str) {
        let err = widget(properties, json!([])).unwrap_err();
        let (kind, path) = match &err {
            ModelError::MissingStringMaxLength { path } => ("MissingStringMaxLength", path),
            ModelError::MissingDecimalInfo { path } => ("MissingDecimalInfo", path),
            ModelError::IncompleteDecimalInfo { path } => ("IncompleteDecimalInfo", path),
            other => panic!("unexpected error {:?}", other),
        };
        assert_eq!(kind, expected);
        assert!(path.starts_with("$."));
    }

    #[rstest]
    fn test_string_without_max_length_allowed_when_exempted() {
        let api_schema = api_schema_with(json!({
            "resourceName": "Widget",
            "jsonSchemaForInsert": {
                "type": "object",
                "properties": {
                    "duration": { "type": "string" },
                    "status": { "type": "string", "enum": ["Open", "Closed"] }
                }
            }
        }));
        let omissions = ["$.duration".to_string()].into_iter().collect();
        let mut context = RelationalModelBuilderContext::new(api_schema, "schools")
            .with_string_max_length_omissions(omissions);
        derive(&mut context).unwrap();

        let root = table(&context, "Widget");
        assert_eq!(
            column(root, "Duration").scalar_type,
            Some(RelationalScalarType::String { max_length: None })
        );
        assert_eq!(
            column(root, "Status").scalar_type,
            Some(RelationalScalarType::String { max_length: Some(6) })
        );
    }

    #[rstest]
    #[case(json!({ "type": "integer" }), RelationalScalarType::Int32)]
    #[case(json!({ "type": "integer", "format": "int64" }), RelationalScalarType::Int64)]
    #[case(json!({ "type": "integer", "maximum": 9_999_999_999u64 }), RelationalScalarType::Int64)]
    fn test_integer_width(#[case] schema: Value, #[case] expected: RelationalScalarType) {
        assert_eq!(integer_type(&schema), expected);
    }

    #[rstest]
    fn test_x_nullable_overrides_required() {
        let context = widget(
            json!({ "code": { "type": "string", "maxLength": 5, "x-nullable": true } }),
            json!(["code"]),
        )
        .unwrap();
        assert!(column(table(&context, "Widget"), "Code").is_nullable);
    }
}
