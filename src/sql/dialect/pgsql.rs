//! PostgreSQL rendering.

use super::{
    DdlObjectKind, DdlPattern, ScalarTypeDefaults, SqlDialectKind, SqlDialectOps, SqlDialectRules,
    delimit,
};
use crate::model::core_names::CoreSchemaNames;
use crate::model::definition::{
    DbColumnName, DbIndexModel, DbSchemaName, DbTableName, DbTriggerModel,
};
use crate::sql::escape::quote_string;
use crate::sql::writer::SqlWriter;

const PGSQL_TYPES: ScalarTypeDefaults = ScalarTypeDefaults {
    string: "varchar",
    unbounded_string: "text",
    int32: "integer",
    int64: "bigint",
    boolean: "boolean",
    date: "date",
    date_time: "timestamp with time zone",
    time: "time",
    decimal: "numeric",
};

/// A dollar-quote delimiter that occurs in none of `parts`.
fn dollar_quote_tag(parts: &[&str]) -> String {
    let mut tag = "$ddl$".to_string();
    let mut n = 0;
    while parts.iter().any(|p| p.contains(&tag)) {
        n += 1;
        tag = format!("$ddl{}$", n);
    }
    tag
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PgsqlDialect;

impl PgsqlDialect {
    /// `DO $ddl$ BEGIN IF <guard> THEN <body> END IF; END $ddl$;`
    fn write_guarded_block(&self, writer: &mut SqlWriter, guard: &str, body: &str) {
        let tag = dollar_quote_tag(&[guard, body]);
        writer.append_line(&format!("DO {}", tag));
        writer.append_line("BEGIN");
        {
            let mut block = writer.indent();
            block.append("IF ").append(guard).append_line(" THEN");
            {
                let mut inner = block.indent();
                inner.append_line(body);
            }
            block.append_line("END IF;");
        }
        writer.append_line(&format!("END {};", tag));
    }

    fn write_stamp_update(
        &self,
        writer: &mut SqlWriter,
        core_names: &CoreSchemaNames,
        row: &str,
        document_id_column: &DbColumnName,
    ) {
        let sequence = self.next_sequence_value(&core_names.schema, &core_names.change_version_sequence);
        writer
            .append("UPDATE ")
            .append_line(&self.qualify_table(&core_names.document_table()));
        writer.append_line(&format!(
            "SET {} = {},",
            self.quote_identifier(core_names.content_version_column().as_str()),
            sequence
        ));
        {
            let mut set = writer.indent();
            set.append_line(&format!(
                "{} = {}",
                self.quote_identifier(core_names.content_last_modified_column().as_str()),
                self.utc_now()
            ));
        }
        writer.append_line(&format!(
            "WHERE {} = {}.{};",
            self.quote_identifier(core_names.document_id_column().as_str()),
            row,
            self.quote_identifier(document_id_column.as_str())
        ));
    }
}

impl SqlDialectRules for PgsqlDialect {
    fn kind(&self) -> SqlDialectKind {
        SqlDialectKind::Pgsql
    }

    fn max_identifier_length(&self) -> usize {
        63
    }

    fn scalar_type_defaults(&self) -> ScalarTypeDefaults {
        PGSQL_TYPES
    }

    fn default_schema(&self) -> &'static str {
        "public"
    }
}

impl SqlDialectOps for PgsqlDialect {
    fn quote_identifier(&self, name: &str) -> String {
        delimit(name, '"', '"')
    }

    fn uuid_type(&self) -> &'static str {
        "uuid"
    }

    fn binary_type(&self, _length: u32) -> String {
        "bytea".to_string()
    }

    fn identity_clause(&self) -> &'static str {
        "GENERATED BY DEFAULT AS IDENTITY"
    }

    fn next_sequence_value(&self, schema: &DbSchemaName, sequence: &str) -> String {
        format!("nextval({})", quote_string(&self.qualify_name(schema, sequence)))
    }

    fn utc_now(&self) -> &'static str {
        "now()"
    }

    fn ddl_pattern(&self, kind: DdlObjectKind) -> DdlPattern {
        match kind {
            DdlObjectKind::Schema | DdlObjectKind::Table => DdlPattern::IfNotExists,
            DdlObjectKind::Constraint | DdlObjectKind::Sequence | DdlObjectKind::Index => {
                DdlPattern::CatalogGuard
            }
            DdlObjectKind::Trigger => DdlPattern::DropThenCreate,
            DdlObjectKind::Function => DdlPattern::CreateOrReplace,
        }
    }

    fn write_prerequisites(&self, writer: &mut SqlWriter) {
        // digest() used by uuidv5
        writer.append_line("CREATE EXTENSION IF NOT EXISTS pgcrypto;");
    }

    fn write_create_schema(&self, writer: &mut SqlWriter, schema: &DbSchemaName) {
        writer.append_line(&format!(
            "CREATE SCHEMA IF NOT EXISTS {};",
            self.quote_identifier(schema.as_str())
        ));
    }

    fn write_create_table_start(&self, writer: &mut SqlWriter, table: &DbTableName) {
        writer.append_line(&format!("CREATE TABLE IF NOT EXISTS {} (", self.qualify_table(table)));
    }

    fn write_add_constraint(
        &self,
        writer: &mut SqlWriter,
        table: &DbTableName,
        constraint_name: &str,
        definition: &str,
    ) {
        let qualified = self.qualify_table(table);
        let guard = format!(
            "NOT EXISTS (\n    SELECT 1 FROM pg_constraint\n    WHERE conname = {}\n        AND conrelid = to_regclass({})\n)",
            quote_string(constraint_name),
            quote_string(&qualified)
        );
        let body = format!(
            "ALTER TABLE {}\nADD CONSTRAINT {} {};",
            qualified,
            self.quote_identifier(constraint_name),
            definition
        );
        self.write_guarded_block(writer, &guard, &body);
    }

    fn write_create_sequence(&self, writer: &mut SqlWriter, schema: &DbSchemaName, name: &str) {
        let qualified = self.qualify_name(schema, name);
        let guard = format!("to_regclass({}) IS NULL", quote_string(&qualified));
        let body = format!("CREATE SEQUENCE {} START WITH 1;", qualified);
        self.write_guarded_block(writer, &guard, &body);
    }

    fn write_create_index(&self, writer: &mut SqlWriter, index: &DbIndexModel) {
        let index_name = self.qualify_name(&index.table.schema, index.name.as_str());
        let guard = format!("to_regclass({}) IS NULL", quote_string(&index_name));
        let body = format!(
            "CREATE {}INDEX {} ON {} ({});",
            if index.is_unique { "UNIQUE " } else { "" },
            self.quote_identifier(index.name.as_str()),
            self.qualify_table(&index.table),
            self.column_list(&index.columns)
        );
        self.write_guarded_block(writer, &guard, &body);
    }

    fn write_stamp_trigger(
        &self,
        writer: &mut SqlWriter,
        trigger: &DbTriggerModel,
        core_names: &CoreSchemaNames,
    ) {
        let function = self.qualify_name(&trigger.table.schema, trigger.name.as_str());
        writer.append_line(&format!("CREATE OR REPLACE FUNCTION {}()", function));
        writer.append_line("RETURNS trigger");
        writer.append_line("LANGUAGE plpgsql");
        writer.append_line("AS $$");
        writer.append_line("BEGIN");
        {
            let mut body = writer.indent();
            body.append_line("IF TG_OP = 'DELETE' THEN");
            {
                let mut deleted = body.indent();
                self.write_stamp_update(&mut deleted, core_names, "OLD", &trigger.document_id_column);
                deleted.append_line("RETURN OLD;");
            }
            body.append_line("END IF;");
            self.write_stamp_update(&mut body, core_names, "NEW", &trigger.document_id_column);
            body.append_line("RETURN NEW;");
        }
        writer.append_line("END;");
        writer.append_line("$$;");

        let name = self.quote_identifier(trigger.name.as_str());
        let table = self.qualify_table(&trigger.table);
        writer.append_line(&format!("DROP TRIGGER IF EXISTS {} ON {};", name, table));
        writer.append_line(&format!("CREATE TRIGGER {}", name));
        writer.append_line(&format!("AFTER INSERT OR UPDATE OR DELETE ON {}", table));
        writer.append_line(&format!("FOR EACH ROW EXECUTE FUNCTION {}();", function));
    }

    fn write_uuidv5_function(&self, writer: &mut SqlWriter, core_names: &CoreSchemaNames) {
        writer.append_line(&format!(
            "CREATE OR REPLACE FUNCTION {}(namespace_uuid uuid, name_text text)",
            self.qualify_name(&core_names.schema, &core_names.uuidv5_function)
        ));
        writer.append_line("RETURNS uuid");
        writer.append_line("LANGUAGE plpgsql");
        writer.append_line("IMMUTABLE STRICT");
        writer.append_line("AS $$");
        writer.append_line("DECLARE");
        {
            let mut declare = writer.indent();
            declare.append_line("hash bytea;");
        }
        writer.append_line("BEGIN");
        {
            let mut body = writer.indent();
            body.append_line(
                "hash := digest(uuid_send(namespace_uuid) || convert_to(name_text, 'UTF8'), 'sha1');",
            );
            body.append_line("hash := set_byte(hash, 6, (get_byte(hash, 6) & 15) | 80);");
            body.append_line("hash := set_byte(hash, 8, (get_byte(hash, 8) & 63) | 128);");
            body.append_line("RETURN encode(substring(hash from 1 for 16), 'hex')::uuid;");
        }
        writer.append_line("END;");
        writer.append_line("$$;");
    }

    fn string_literal(&self, value: &str) -> String {
        quote_string(value)
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("decode('{}', 'hex')", hex::encode(bytes))
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "TRUE" } else { "FALSE" }.to_string()
    }

    fn paging_clause(&self, offset_parameter: &str, limit_parameter: &str) -> String {
        format!("LIMIT @{} OFFSET @{}", limit_parameter, offset_parameter)
    }

    fn write_raise_error_if(&self, writer: &mut SqlWriter, condition: &str, message: &str) {
        let body = format!("RAISE EXCEPTION USING MESSAGE = {};", quote_string(message));
        self.write_guarded_block(writer, condition, &body);
    }

    fn write_insert_if_missing(
        &self,
        writer: &mut SqlWriter,
        table: &DbTableName,
        columns: &[DbColumnName],
        values: &[String],
        _key_count: usize,
    ) {
        writer.append_line(&format!(
            "INSERT INTO {} ({})",
            self.qualify_table(table),
            self.column_list(columns)
        ));
        writer.append_line(&format!("VALUES ({})", values.join(", ")));
        writer.append_line("ON CONFLICT DO NOTHING;");
    }

    fn binary_equals(&self, left: &str, right: &str) -> String {
        format!("{} = {}", left, right)
    }
}
