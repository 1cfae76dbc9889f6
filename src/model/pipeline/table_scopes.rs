//! Finds every table-producing scope and derives its primary key.
//!
//! The root scope `$` keys on `DocumentId`. Every array below it, at any
//! depth, becomes a child table keyed by its parent's key plus `Ordinal`.

use std::collections::BTreeMap;

use serde_json::Value;

use super::extension_sites::EXTENSION_PROPERTY;
use super::{RelationalModelBuilderStep, schema_type};
use crate::model::ModelError;
use crate::model::context::{RelationalModelBuilderContext, TableScope};
use crate::model::definition::{
    ColumnKind, DbColumnModel, DbColumnName, DbKeyColumn, DbTableModel, DbTableName,
    ReferentialAction, RelationalScalarType, TableConstraint, TableKey,
};
use crate::model::naming::RelationalNameConventions;
use crate::model::path::JsonPathExpression;

pub const ORDINAL_COLUMN: &str = "Ordinal";

pub struct DeriveTableScopesAndKeysStep;

impl RelationalModelBuilderStep for DeriveTableScopesAndKeysStep {
    fn name(&self) -> &'static str {
        "DeriveTableScopesAndKeys"
    }

    fn execute(&self, context: &mut RelationalModelBuilderContext) -> Result<(), ModelError> {
        let schema = context
            .json_schema_for_insert
            .clone()
            .ok_or_else(|| ModelError::MissingInput {
                path: "jsonSchemaForInsert".to_string(),
            })?;
        let physical_schema = context
            .physical_schema
            .clone()
            .ok_or_else(|| ModelError::MissingInput {
                path: "$.projectSchema.projectEndpointName".to_string(),
            })?;

        let root_name = RelationalNameConventions::to_pascal_case(&context.resource_name);
        context.table_scopes.push(TableScope {
            path: JsonPathExpression::root(),
            parent: None,
            table: DbTableName::new(physical_schema, root_name.clone()),
            base_name: root_name,
            is_descriptor_collection: false,
        });

        collect_child_scopes(context, &schema, &JsonPathExpression::root(), 0, &mut Vec::new());
        check_table_names(context)?;

        for index in 0..context.table_scopes.len() {
            let table = build_keyed_table(context, index)?;
            context.tables.push(table);
        }
        Ok(())
    }
}

fn collect_child_scopes(
    context: &mut RelationalModelBuilderContext,
    schema: &Value,
    path: &JsonPathExpression,
    scope_index: usize,
    inline_prefix: &mut Vec<String>,
) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };

    for (name, property) in properties {
        if name == EXTENSION_PROPERTY {
            continue;
        }
        let property_path = path.child_property(name);
        match schema_type(property) {
            Some("object") => {
                inline_prefix.push(name.clone());
                collect_child_scopes(context, property, &property_path, scope_index, inline_prefix);
                inline_prefix.pop();
            }
            Some("array") => {
                let element_path = property_path.child_any_element();
                let items = property.get("items").cloned().unwrap_or(Value::Null);
                let base_name = RelationalNameConventions::to_collection_base_name(name);
                let parent_table = &context.table_scopes[scope_index].table;
                let prefix: String = inline_prefix
                    .iter()
                    .map(|p| RelationalNameConventions::to_pascal_case(p))
                    .collect();
                let table = DbTableName::new(
                    parent_table.schema.clone(),
                    format!("{}{}{}", parent_table.name, prefix, base_name),
                );

                context.table_scopes.push(TableScope {
                    path: element_path.clone(),
                    parent: Some(scope_index),
                    table,
                    base_name,
                    is_descriptor_collection: schema_type(&items) != Some("object"),
                });
                let child_index = context.table_scopes.len() - 1;
                collect_child_scopes(context, &items, &element_path, child_index, &mut Vec::new());
            }
            _ => {}
        }
    }
}

fn check_table_names(context: &RelationalModelBuilderContext) -> Result<(), ModelError> {
    let mut seen: BTreeMap<&DbTableName, &JsonPathExpression> = BTreeMap::new();
    for scope in &context.table_scopes {
        if let Some(first) = seen.insert(&scope.table, &scope.path) {
            return Err(ModelError::TableNameCollision {
                resource: context.resource().to_string(),
                table: scope.table.to_string(),
                first_scope: first.to_string(),
                second_scope: scope.path.to_string(),
            });
        }
    }
    Ok(())
}

fn build_keyed_table(
    context: &RelationalModelBuilderContext,
    index: usize,
) -> Result<DbTableModel, ModelError> {
    let scope = &context.table_scopes[index];
    let document_id = context.core_names.document_id_column();

    let Some(parent_index) = scope.parent else {
        let key = TableKey {
            columns: vec![DbKeyColumn {
                name: document_id.clone(),
                kind: ColumnKind::ParentKeyPart,
            }],
        };
        let columns = vec![DbColumnModel::key_part(
            document_id.clone(),
            ColumnKind::ParentKeyPart,
            RelationalScalarType::Int64,
        )];
        let fk_columns = vec![document_id.clone()];
        let constraints = vec![TableConstraint::ForeignKey {
            name: RelationalNameConventions::foreign_key_name(&scope.table, &fk_columns)?,
            columns: fk_columns,
            target_table: context.core_names.document_table(),
            target_columns: vec![document_id],
            on_delete: ReferentialAction::Cascade,
            on_update: ReferentialAction::NoAction,
        }];
        return Ok(DbTableModel {
            table: scope.table.clone(),
            json_scope: scope.path.clone(),
            key,
            columns,
            constraints,
        });
    };

    let parent_scope = &context.table_scopes[parent_index];
    let parent_table = &context.tables[parent_index];
    let root_table = &context.table_scopes[0].table;

    let mut key = TableKey::default();
    let mut columns = Vec::new();
    let mut local_parent_columns = Vec::new();

    for parent_column in &parent_table.key.columns {
        let renamed = match parent_column.kind {
            ColumnKind::Ordinal => DbColumnName::new(format!("{}Ordinal", parent_scope.base_name)),
            _ if parent_column.name == document_id => {
                RelationalNameConventions::document_fk_column_name(&root_table.name)
            }
            _ => parent_column.name.clone(),
        };
        let scalar_type = parent_table
            .column(&parent_column.name)
            .and_then(|c| c.scalar_type)
            .unwrap_or(RelationalScalarType::Int64);

        key.columns.push(DbKeyColumn {
            name: renamed.clone(),
            kind: ColumnKind::ParentKeyPart,
        });
        columns.push(DbColumnModel::key_part(
            renamed.clone(),
            ColumnKind::ParentKeyPart,
            scalar_type,
        ));
        local_parent_columns.push(renamed);
    }

    let ordinal = DbColumnName::new(ORDINAL_COLUMN);
    key.columns.push(DbKeyColumn {
        name: ordinal.clone(),
        kind: ColumnKind::Ordinal,
    });
    columns.push(DbColumnModel::key_part(
        ordinal,
        ColumnKind::Ordinal,
        RelationalScalarType::Int32,
    ));

    let constraints = vec![TableConstraint::ForeignKey {
        name: RelationalNameConventions::foreign_key_name(&scope.table, &local_parent_columns)?,
        columns: local_parent_columns,
        target_table: parent_table.table.clone(),
        target_columns: parent_table.key.column_names(),
        on_delete: ReferentialAction::Cascade,
        on_update: ReferentialAction::NoAction,
    }];

    Ok(DbTableModel {
        table: scope.table.clone(),
        json_scope: scope.path.clone(),
        key,
        columns,
        constraints,
    })
}
