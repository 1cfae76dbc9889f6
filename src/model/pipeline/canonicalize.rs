//! Fixes every ordering in the model so equal inputs give identical output.

use std::cmp::Ordering;

use super::RelationalModelBuilderStep;
use crate::model::ModelError;
use crate::model::context::RelationalModelBuilderContext;
use crate::model::definition::{DbColumnModel, DbTableModel};

pub struct CanonicalizeOrderingStep;

impl RelationalModelBuilderStep for CanonicalizeOrderingStep {
    fn name(&self) -> &'static str {
        "CanonicalizeOrdering"
    }

    fn execute(&self, context: &mut RelationalModelBuilderContext) -> Result<(), ModelError> {
        sort_tables_by_scope(context);

        for table in &mut context.tables {
            sort_columns(table);
            table
                .constraints
                .sort_by(|a, b| a.kind_rank().cmp(&b.kind_rank()).then_with(|| a.name().cmp(b.name())));
        }

        let mut read_order: Vec<usize> = (0..context.tables.len()).collect();
        read_order.sort_by_key(|&i| (context.tables[i].depth(), i));
        context.read_order = read_order;
        context.write_order = write_order(context);

        context
            .descriptor_edges
            .sort_by(|a, b| (&a.table, &a.column).cmp(&(&b.table, &b.column)));
        context
            .document_reference_bindings
            .sort_by(|a, b| (&a.reference_path, &a.table).cmp(&(&b.reference_path, &b.table)));
        context
            .extension_sites
            .sort_by(|a, b| a.extension_path.cmp(&b.extension_path));
        Ok(())
    }
}

/// Reorder tables and scopes together by scope path, remapping parent links.
fn sort_tables_by_scope(context: &mut RelationalModelBuilderContext) {
    let mut order: Vec<usize> = (0..context.table_scopes.len()).collect();
    order.sort_by(|&a, &b| context.table_scopes[a].path.cmp(&context.table_scopes[b].path));

    let mut new_index = vec![0; order.len()];
    for (new, &old) in order.iter().enumerate() {
        new_index[old] = new;
    }

    let mut scopes = std::mem::take(&mut context.table_scopes)
        .into_iter()
        .map(Some)
        .collect::<Vec<_>>();
    let mut tables = std::mem::take(&mut context.tables)
        .into_iter()
        .map(Some)
        .collect::<Vec<_>>();

    for &old in &order {
        if let (Some(mut scope), Some(table)) = (scopes[old].take(), tables[old].take()) {
            scope.parent = scope.parent.map(|p| new_index[p]);
            context.table_scopes.push(scope);
            context.tables.push(table);
        }
    }
}

fn sort_columns(table: &mut DbTableModel) {
    let key_position = |column: &DbColumnModel| {
        table
            .key
            .columns
            .iter()
            .position(|k| k.name == column.name)
    };
    let mut columns = std::mem::take(&mut table.columns);
    columns.sort_by(|a, b| match (key_position(a), key_position(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .source_path
            .cmp(&b.source_path)
            .then_with(|| a.name.cmp(&b.name)),
    });
    table.columns = columns;
}

/// Depth-first pre-order: every parent precedes its children.
fn write_order(context: &RelationalModelBuilderContext) -> Vec<usize> {
    fn visit(context: &RelationalModelBuilderContext, index: usize, order: &mut Vec<usize>) {
        order.push(index);
        for (child, scope) in context.table_scopes.iter().enumerate() {
            if scope.parent == Some(index) {
                visit(context, child, order);
            }
        }
    }

    let mut order = Vec::with_capacity(context.table_scopes.len());
    for (index, scope) in context.table_scopes.iter().enumerate() {
        if scope.parent.is_none() {
            visit(context, index, &mut order);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::definition::TableConstraint;
    use crate::model::pipeline::RelationalModelBuilderPipeline;
    use crate::model::pipeline::test_support::school_api_schema;
    use rstest::{fixture, rstest};

    #[fixture]
    fn built() -> crate::model::RelationalModelBuildResult {
        RelationalModelBuilderPipeline::standard()
            .run(RelationalModelBuilderContext::new(school_api_schema(), "schools"))
            .unwrap()
    }

    fn names(tables: impl Iterator<Item = String>) -> Vec<String> {
        tables.collect()
    }

    #[rstest]
    fn test_tables_sorted_by_scope(built: crate::model::RelationalModelBuildResult) {
        let scopes: Vec<_> = built
            .resource_model
            .tables
            .iter()
            .map(|t| t.json_scope.canonical().to_string())
            .collect();
        assert_eq!(
            scopes,
            vec!["$", "$.addresses[*]", "$.addresses[*].periods[*]", "$.gradeLevels[*]"]
        );
    }

    #[rstest]
    fn test_read_order_is_breadth_first(built: crate::model::RelationalModelBuildResult) {
        let model = &built.resource_model;
        let order = names(model.tables_in_read_order().map(|t| t.table.name.clone()));
        assert_eq!(
            order,
            vec!["School", "SchoolAddress", "SchoolGradeLevel", "SchoolAddressPeriod"]
        );
    }

    #[rstest]
    fn test_write_order_puts_parents_first(built: crate::model::RelationalModelBuildResult) {
        let model = &built.resource_model;
        let order = names(model.tables_in_write_order().map(|t| t.table.name.clone()));
        assert_eq!(
            order,
            vec!["School", "SchoolAddress", "SchoolAddressPeriod", "SchoolGradeLevel"]
        );
    }

    #[rstest]
    fn test_key_columns_lead(built: crate::model::RelationalModelBuildResult) {
        let root = built.resource_model.root_table().unwrap();
        assert_eq!(root.columns[0].name.as_str(), "DocumentId");

        let period = &built.resource_model.tables[2];
        let leading: Vec<_> = period.columns.iter().take(3).map(|c| c.name.as_str()).collect();
        assert_eq!(leading, vec!["School_DocumentId", "AddressOrdinal", "Ordinal"]);
    }

    #[rstest]
    fn test_constraints_ordered_by_kind_then_name(built: crate::model::RelationalModelBuildResult) {
        let root = built.resource_model.root_table().unwrap();
        let ranks: Vec<_> = root.constraints.iter().map(TableConstraint::kind_rank).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
        assert!(matches!(root.constraints[0], TableConstraint::Unique { .. }));
    }

    #[rstest]
    fn test_repeated_runs_are_identical() {
        let run = || {
            RelationalModelBuilderPipeline::standard()
                .run(RelationalModelBuilderContext::new(school_api_schema(), "schools"))
                .unwrap()
        };
        assert_eq!(run(), run());
    }
}
