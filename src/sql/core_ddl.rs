//! DDL for the shared core schema (`dms` by default).
//!
//! Tables are created with only their PK/UNIQUE/CHECK constraints; every
//! foreign key is added afterwards so the script has no ordering hazards.

use tracing::debug;

use super::ddl::{foreign_key_clause, write_table};
use super::dialect::{SqlDialect, SqlDialectOps, SqlDialectRules};
use super::writer::SqlWriter;
use crate::model::core_names::CoreSchemaNames;
use crate::model::definition::{
    DbColumnName, DbIndexModel, DbIndexName, DbTableName, DbTriggerModel, DbTriggerName,
    ReferentialAction, RelationalScalarType,
};

const RESOURCE_KEY_ID: &str = "ResourceKeyId";
const EFFECTIVE_SCHEMA_HASH: &str = "EffectiveSchemaHash";

pub struct CoreDdlEmitter {
    dialect: SqlDialect,
}

/// One column of a core table.
struct CoreColumn {
    name: String,
    sql_type: String,
    nullable: bool,
    suffix: Option<String>,
}

/// Core FKs reference the same-named key column of their target.
struct CoreForeignKey {
    table: DbTableName,
    name: String,
    columns: Vec<DbColumnName>,
    target: DbTableName,
    on_delete: ReferentialAction,
}

impl CoreDdlEmitter {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn emit(&self, names: &CoreSchemaNames) -> String {
        let mut writer = SqlWriter::new();

        writer.append_line("-- Phase 1: Schemas");
        self.dialect.write_prerequisites(&mut writer);
        self.dialect.write_create_schema(&mut writer, &names.schema);

        writer.blank_line();
        writer.append_line("-- Phase 2: Sequences");
        self.dialect
            .write_create_sequence(&mut writer, &names.schema, &names.change_version_sequence);

        writer.blank_line();
        writer.append_line("-- Phase 3: Tables");
        self.write_tables(&mut writer, names);

        writer.blank_line();
        writer.append_line("-- Phase 4: Foreign Keys");
        let mut foreign_keys = self.foreign_keys(names);
        foreign_keys.sort_by(|a, b| (&a.table, &a.name).cmp(&(&b.table, &b.name)));
        for fk in &foreign_keys {
            let definition = foreign_key_clause(
                &self.dialect,
                &self.dialect.column_list(&fk.columns),
                &fk.target,
                &self.dialect.column_list(&fk.columns),
                fk.on_delete,
                ReferentialAction::NoAction,
            );
            self.dialect
                .write_add_constraint(&mut writer, &fk.table, &fk.name, &definition);
        }

        writer.blank_line();
        writer.append_line("-- Phase 5: Indexes");
        let mut indexes = vec![
            index(names.document_table(), RESOURCE_KEY_ID),
            index(names.referential_identity_table(), names.document_id_column().as_str()),
        ];
        indexes.sort_by(|a, b| (&a.table, &a.name).cmp(&(&b.table, &b.name)));
        for index in &indexes {
            self.dialect.write_create_index(&mut writer, index);
        }

        writer.blank_line();
        writer.append_line("-- Phase 6: Functions and Triggers");
        self.dialect.write_uuidv5_function(&mut writer, names);
        let descriptor = names.descriptor_table();
        self.dialect.write_stamp_trigger(
            &mut writer,
            &DbTriggerModel {
                name: DbTriggerName::new(format!("TR_{}_Stamp", descriptor.name)),
                table: descriptor,
                document_id_column: names.document_id_column(),
            },
            names,
        );

        debug!(dialect = %self.dialect.kind(), schema = %names.schema, "Emitted core DDL");
        writer.finish()
    }

    fn write_tables(&self, writer: &mut SqlWriter, names: &CoreSchemaNames) {
        let d = &self.dialect;
        let string = |n: u32| d.render_column_type(&RelationalScalarType::String { max_length: Some(n) });
        let smallint = || "smallint".to_string();
        let bigint = || d.render_column_type(&RelationalScalarType::Int64);
        let timestamp = || d.render_column_type(&RelationalScalarType::DateTime);
        let now = || Some(format!("DEFAULT ({})", d.utc_now()));
        let document_id = names.document_id_column();
        let document_id = document_id.as_str();

        self.write_core_table(
            writer,
            &names.resource_key_table(),
            vec![
                column(RESOURCE_KEY_ID, smallint(), false, None),
                column("ProjectName", string(256), false, None),
                column("ResourceName", string(256), false, None),
                column("ResourceVersion", string(32), false, None),
            ],
            &[RESOURCE_KEY_ID],
            Some(&["ProjectName", "ResourceName"]),
            None,
        );

        let sequence = d.next_sequence_value(&names.schema, &names.change_version_sequence);
        self.write_core_table(
            writer,
            &names.document_table(),
            vec![
                column(document_id, bigint(), false, Some(d.identity_clause().to_string())),
                column("DocumentUuid", d.uuid_type().to_string(), false, None),
                column(RESOURCE_KEY_ID, smallint(), false, None),
                column("ContentVersion", bigint(), false, Some(format!("DEFAULT ({})", sequence))),
                column("ContentLastModifiedAt", timestamp(), false, now()),
                column("CreatedAt", timestamp(), false, now()),
            ],
            &[document_id],
            Some(&["DocumentUuid"]),
            None,
        );

        self.write_core_table(
            writer,
            &names.descriptor_table(),
            vec![
                column(document_id, bigint(), false, None),
                column("Namespace", string(255), false, None),
                column("CodeValue", string(50), false, None),
                column("ShortDescription", string(75), false, None),
                column("Description", string(1024), true, None),
                column("Discriminator", string(128), false, None),
                column("Uri", string(306), false, None),
            ],
            &[document_id],
            Some(&["Uri", "Discriminator"]),
            None,
        );

        self.write_core_table(
            writer,
            &names.referential_identity_table(),
            vec![
                column("ReferentialId", d.uuid_type().to_string(), false, None),
                column(document_id, bigint(), false, None),
                column(RESOURCE_KEY_ID, smallint(), false, None),
            ],
            &["ReferentialId"],
            None,
            None,
        );

        let effective_schema = names.effective_schema_table();
        self.write_core_table(
            writer,
            &effective_schema,
            vec![
                column("EffectiveSchemaId", smallint(), false, None),
                column("ApiSchemaFormatVersion", string(64), false, None),
                column(EFFECTIVE_SCHEMA_HASH, string(64), false, None),
                column("ResourceKeyCount", smallint(), false, None),
                column("ResourceKeySeedHash", d.binary_type(32), false, None),
                column("AppliedAt", timestamp(), false, now()),
            ],
            &["EffectiveSchemaId"],
            None,
            Some((
                format!("CK_{}_Singleton", effective_schema.name),
                format!("{} = 1", d.quote_identifier("EffectiveSchemaId")),
            )),
        );

        self.write_core_table(
            writer,
            &names.schema_component_table(),
            vec![
                column(EFFECTIVE_SCHEMA_HASH, string(64), false, None),
                column("ProjectEndpointName", string(128), false, None),
                column("ProjectName", string(256), false, None),
                column("ProjectVersion", string(64), false, None),
                column(
                    "IsExtensionProject",
                    d.render_column_type(&RelationalScalarType::Boolean),
                    false,
                    None,
                ),
            ],
            &[EFFECTIVE_SCHEMA_HASH, "ProjectEndpointName"],
            None,
            None,
        );
    }

    fn write_core_table(
        &self,
        writer: &mut SqlWriter,
        table: &DbTableName,
        columns: Vec<CoreColumn>,
        key: &[&str],
        unique: Option<&[&str]>,
        check: Option<(String, String)>,
    ) {
        let d = &self.dialect;
        let mut lines: Vec<String> = columns
            .into_iter()
            .map(|c| {
                let mut line = format!(
                    "{} {} {}",
                    d.quote_identifier(&c.name),
                    c.sql_type,
                    if c.nullable { "NULL" } else { "NOT NULL" }
                );
                if let Some(suffix) = c.suffix {
                    line.push(' ');
                    line.push_str(&suffix);
                }
                line
            })
            .collect();
        lines.push(format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            d.quote_identifier(&format!("PK_{}", table.name)),
            d.column_list(&column_names(key))
        ));
        if let Some(columns) = unique {
            lines.push(format!(
                "CONSTRAINT {} UNIQUE ({})",
                d.quote_identifier(&format!("UX_{}_{}", table.name, columns.join("_"))),
                d.column_list(&column_names(columns))
            ));
        }
        if let Some((name, condition)) = check {
            lines.push(format!(
                "CONSTRAINT {} CHECK ({})",
                d.quote_identifier(&name),
                condition
            ));
        }
        write_table(d, writer, table, &lines);
    }

    fn foreign_keys(&self, names: &CoreSchemaNames) -> Vec<CoreForeignKey> {
        let document_id = vec![names.document_id_column()];
        let resource_key_id = vec![DbColumnName::new(RESOURCE_KEY_ID)];
        let fk = |table: DbTableName,
                  columns: &Vec<DbColumnName>,
                  target: DbTableName,
                  on_delete: ReferentialAction| {
            CoreForeignKey {
                name: format!("FK_{}_{}", table.name, target.name),
                table,
                columns: columns.clone(),
                target,
                on_delete,
            }
        };
        vec![
            fk(
                names.document_table(),
                &resource_key_id,
                names.resource_key_table(),
                ReferentialAction::NoAction,
            ),
            fk(
                names.descriptor_table(),
                &document_id,
                names.document_table(),
                ReferentialAction::Cascade,
            ),
            fk(
                names.referential_identity_table(),
                &document_id,
                names.document_table(),
                ReferentialAction::Cascade,
            ),
            fk(
                names.referential_identity_table(),
                &resource_key_id,
                names.resource_key_table(),
                ReferentialAction::NoAction,
            ),
        ]
    }
}

fn column(name: &str, sql_type: String, nullable: bool, suffix: Option<String>) -> CoreColumn {
    CoreColumn {
        name: name.to_string(),
        sql_type,
        nullable,
        suffix,
    }
}

fn column_names(names: &[&str]) -> Vec<DbColumnName> {
    names.iter().map(|n| DbColumnName::new(*n)).collect()
}

fn index(table: DbTableName, column: &str) -> DbIndexModel {
    DbIndexModel {
        name: DbIndexName::new(format!("IX_{}_{}", table.name, column)),
        table,
        columns: vec![DbColumnName::new(column)],
        is_unique: false,
    }
}
