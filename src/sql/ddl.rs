//! DDL for a set of derived resource models.
//!
//! Output is grouped into phases so every referenced table exists before the
//! constraint that references it:
//!
//! 1. schemas
//! 2. tables, each with its PK and the constraints that stay inside its
//!    resource (or point at the core schema)
//! 3. cross-resource document-reference foreign keys
//! 4. indexes backing foreign keys that are not a key prefix
//! 5. document stamp triggers
//!
//! Every statement uses the dialect's idempotent pattern, so the script can
//! be applied repeatedly.

use std::collections::BTreeSet;

use tracing::debug;

use super::dialect::{SqlDialect, SqlDialectOps, SqlDialectRules};
use super::writer::SqlWriter;
use crate::model::core_names::CoreSchemaNames;
use crate::model::definition::{
    DbColumnModel, DbColumnName, DbIndexModel, DbIndexName, DbSchemaName, DbTableModel,
    DbTableName, DbTriggerModel, DbTriggerName, ReferentialAction, RelationalResourceModel,
    TableConstraint,
};
use crate::model::naming::RelationalNameConventions;

/// Everything needed to emit DDL for a group of resources.
#[derive(Debug, Clone)]
pub struct DerivedRelationalModelSet {
    pub dialect: SqlDialect,
    pub core_names: CoreSchemaNames,
    pub resources: Vec<RelationalResourceModel>,
}

impl DerivedRelationalModelSet {
    pub fn new(dialect: SqlDialect, resources: Vec<RelationalResourceModel>) -> Self {
        Self {
            dialect,
            core_names: CoreSchemaNames::default(),
            resources,
        }
    }

    pub fn with_core_names(mut self, core_names: CoreSchemaNames) -> Self {
        self.core_names = core_names;
        self
    }
}

pub struct RelationalModelDdlEmitter;

impl RelationalModelDdlEmitter {
    pub fn emit(set: &DerivedRelationalModelSet) -> String {
        let mut resources: Vec<&RelationalResourceModel> = set.resources.iter().collect();
        resources.sort_by(|a, b| a.resource.cmp(&b.resource));

        let names = IdentifierFitter::new(&set.dialect);
        let mut writer = SqlWriter::new();

        writer.append_line("-- Phase 1: Schemas");
        let schemas: BTreeSet<&DbSchemaName> = resources
            .iter()
            .flat_map(|r| r.tables.iter().map(|t| &t.table.schema))
            .collect();
        for schema in schemas {
            set.dialect.write_create_schema(&mut writer, schema);
        }

        writer.blank_line();
        writer.append_line("-- Phase 2: Tables");
        let mut cross_resource = Vec::new();
        let mut indexes = Vec::new();
        let mut triggers = Vec::new();
        for resource in &resources {
            let local: BTreeSet<&DbTableName> = resource.tables.iter().map(|t| &t.table).collect();
            for table in resource.tables_in_write_order() {
                debug!(table = %table.table, "Emitting table");
                let mut lines: Vec<String> = table
                    .columns
                    .iter()
                    .map(|c| column_definition(&set.dialect, &names, c))
                    .collect();
                lines.push(format!(
                    "CONSTRAINT {} PRIMARY KEY ({})",
                    names.quoted(RelationalNameConventions::primary_key_name(&table.table).as_str()),
                    names.column_list(&table.key.column_names())
                ));
                for constraint in &table.constraints {
                    let inline = match constraint {
                        TableConstraint::ForeignKey { target_table, .. } => {
                            local.contains(target_table)
                                || target_table.schema == set.core_names.schema
                        }
                        _ => true,
                    };
                    let definition = constraint_definition(&set.dialect, &names, constraint);
                    if inline {
                        lines.push(format!(
                            "CONSTRAINT {} {}",
                            names.quoted(constraint.name().as_str()),
                            definition
                        ));
                    } else {
                        cross_resource.push((table.table.clone(), constraint.name().to_string(), definition));
                    }
                }
                write_table(&set.dialect, &mut writer, &names.table(&table.table), &lines);

                indexes.extend(foreign_key_indexes(&names, table));
                if let Some(key) = table.key.columns.first() {
                    triggers.push(DbTriggerModel {
                        name: DbTriggerName::new(
                            names.fit(RelationalNameConventions::trigger_name(&table.table).as_str()),
                        ),
                        table: names.table(&table.table),
                        document_id_column: names.column(&key.name),
                    });
                }
            }
        }

        writer.blank_line();
        writer.append_line("-- Phase 3: Foreign Keys");
        cross_resource.sort();
        for (table, name, definition) in &cross_resource {
            set.dialect
                .write_add_constraint(&mut writer, &names.table(table), &names.fit(name), definition);
        }

        writer.blank_line();
        writer.append_line("-- Phase 4: Indexes");
        indexes.sort_by(|a, b| (&a.table, &a.name).cmp(&(&b.table, &b.name)));
        indexes.dedup();
        for index in &indexes {
            set.dialect.write_create_index(&mut writer, index);
        }

        writer.blank_line();
        writer.append_line("-- Phase 5: Triggers");
        triggers.sort_by(|a, b| (&a.table, &a.name).cmp(&(&b.table, &b.name)));
        for trigger in &triggers {
            set.dialect
                .write_stamp_trigger(&mut writer, trigger, &set.core_names);
        }

        debug!(
            resources = resources.len(),
            foreign_keys = cross_resource.len(),
            indexes = indexes.len(),
            "Emitted resource DDL"
        );
        writer.finish()
    }
}

/// Applies the dialect's identifier length limit before quoting.
pub(crate) struct IdentifierFitter<'a> {
    dialect: &'a SqlDialect,
    max_len: usize,
}

impl<'a> IdentifierFitter<'a> {
    pub(crate) fn new(dialect: &'a SqlDialect) -> Self {
        Self {
            dialect,
            max_len: dialect.max_identifier_length(),
        }
    }

    pub(crate) fn fit(&self, name: &str) -> String {
        RelationalNameConventions::fit_identifier(name, self.max_len)
    }

    pub(crate) fn quoted(&self, name: &str) -> String {
        self.dialect.quote_identifier(&self.fit(name))
    }

    pub(crate) fn table(&self, table: &DbTableName) -> DbTableName {
        DbTableName::new(table.schema.clone(), self.fit(&table.name))
    }

    pub(crate) fn column(&self, column: &DbColumnName) -> DbColumnName {
        DbColumnName::new(self.fit(column.as_str()))
    }

    pub(crate) fn column_list(&self, columns: &[DbColumnName]) -> String {
        let fitted: Vec<DbColumnName> = columns.iter().map(|c| self.column(c)).collect();
        self.dialect.column_list(&fitted)
    }
}

fn column_definition(dialect: &SqlDialect, names: &IdentifierFitter<'_>, column: &DbColumnModel) -> String {
    let sql_type = column
        .scalar_type
        .as_ref()
        .map(|t| dialect.render_column_type(t))
        .unwrap_or_else(|| dialect.scalar_type_defaults().int64.to_string());
    format!(
        "{} {} {}",
        names.quoted(column.name.as_str()),
        sql_type,
        if column.is_nullable { "NULL" } else { "NOT NULL" }
    )
}

/// Body of a constraint after `CONSTRAINT name`.
fn constraint_definition(
    dialect: &SqlDialect,
    names: &IdentifierFitter<'_>,
    constraint: &TableConstraint,
) -> String {
    match constraint {
        TableConstraint::Unique { columns, .. } => format!("UNIQUE ({})", names.column_list(columns)),
        TableConstraint::ForeignKey {
            columns,
            target_table,
            target_columns,
            on_delete,
            on_update,
            ..
        } => foreign_key_clause(
            dialect,
            &names.column_list(columns),
            &names.table(target_table),
            &names.column_list(target_columns),
            *on_delete,
            *on_update,
        ),
        TableConstraint::AllOrNoneNullability {
            fk_column,
            dependent_columns,
            ..
        } => {
            let all: Vec<String> = std::iter::once(fk_column)
                .chain(dependent_columns)
                .map(|c| names.quoted(c.as_str()))
                .collect();
            let each = |test: &str| {
                all.iter()
                    .map(|c| format!("{} {}", c, test))
                    .collect::<Vec<_>>()
                    .join(" AND ")
            };
            format!("CHECK (({}) OR ({}))", each("IS NULL"), each("IS NOT NULL"))
        }
    }
}

/// `FOREIGN KEY (..) REFERENCES t (..)` plus any non-default actions.
pub(crate) fn foreign_key_clause(
    dialect: &SqlDialect,
    columns: &str,
    target_table: &DbTableName,
    target_columns: &str,
    on_delete: ReferentialAction,
    on_update: ReferentialAction,
) -> String {
    let mut clause = format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        columns,
        dialect.qualify_table(target_table),
        target_columns
    );
    if let Some(action) = dialect.render_referential_action(on_delete) {
        clause.push_str(" ON DELETE ");
        clause.push_str(action);
    }
    if let Some(action) = dialect.render_referential_action(on_update) {
        clause.push_str(" ON UPDATE ");
        clause.push_str(action);
    }
    clause
}

/// `CREATE TABLE` with one definition per line.
pub(crate) fn write_table(
    dialect: &SqlDialect,
    writer: &mut SqlWriter,
    table: &DbTableName,
    lines: &[String],
) {
    dialect.write_create_table_start(writer, table);
    {
        let mut body = writer.indent();
        for (i, line) in lines.iter().enumerate() {
            body.append(line);
            body.append_line(if i + 1 < lines.len() { "," } else { "" });
        }
    }
    writer.append_line(");");
}

/// Indexes for FKs whose columns are not already a prefix of the table key.
fn foreign_key_indexes(names: &IdentifierFitter<'_>, table: &DbTableModel) -> Vec<DbIndexModel> {
    let key = table.key.column_names();
    table
        .constraints
        .iter()
        .filter_map(|constraint| match constraint {
            TableConstraint::ForeignKey { columns, .. } => Some(columns),
            _ => None,
        })
        .filter(|columns| !key.starts_with(columns))
        .filter_map(|columns| {
            RelationalNameConventions::index_name(&table.table, columns)
                .ok()
                .map(|name| DbIndexModel {
                    name: DbIndexName::new(names.fit(name.as_str())),
                    table: names.table(&table.table),
                    columns: columns.iter().map(|c| names.column(c)).collect(),
                    is_unique: false,
                })
        })
        .collect()
}
