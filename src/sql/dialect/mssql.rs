//! SQL Server rendering.

use super::{
    DdlObjectKind, DdlPattern, ScalarTypeDefaults, SqlDialectKind, SqlDialectOps, SqlDialectRules,
    delimit,
};
use crate::model::core_names::CoreSchemaNames;
use crate::model::definition::{
    DbColumnName, DbIndexModel, DbSchemaName, DbTableName, DbTriggerModel,
};
use crate::sql::escape::escape_string;
use crate::sql::writer::SqlWriter;

const MSSQL_TYPES: ScalarTypeDefaults = ScalarTypeDefaults {
    string: "nvarchar",
    unbounded_string: "nvarchar(max)",
    int32: "int",
    int64: "bigint",
    boolean: "bit",
    date: "date",
    date_time: "datetime2(7)",
    time: "time(7)",
    decimal: "decimal",
};

const BATCH_SEPARATOR: &str = "GO";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MssqlDialect;

impl MssqlDialect {
    fn unicode_literal(value: &str) -> String {
        format!("N'{}'", escape_string(value))
    }

    /// `IF NOT EXISTS (<probe>)` followed by an indented `BEGIN ... END;` body.
    fn write_if_not_exists(&self, writer: &mut SqlWriter, probe: &str, body: &str) {
        writer.append("IF NOT EXISTS (").append(probe).append_line(")");
        writer.append_line("BEGIN");
        {
            let mut inner = writer.indent();
            inner.append_line(body);
        }
        writer.append_line("END;");
    }
}

impl SqlDialectRules for MssqlDialect {
    fn kind(&self) -> SqlDialectKind {
        SqlDialectKind::Mssql
    }

    fn max_identifier_length(&self) -> usize {
        128
    }

    fn scalar_type_defaults(&self) -> ScalarTypeDefaults {
        MSSQL_TYPES
    }

    fn default_schema(&self) -> &'static str {
        "dbo"
    }
}

impl SqlDialectOps for MssqlDialect {
    fn quote_identifier(&self, name: &str) -> String {
        delimit(name, '[', ']')
    }

    fn uuid_type(&self) -> &'static str {
        "uniqueidentifier"
    }

    fn binary_type(&self, length: u32) -> String {
        format!("binary({})", length)
    }

    fn identity_clause(&self) -> &'static str {
        "IDENTITY(1,1)"
    }

    fn next_sequence_value(&self, schema: &DbSchemaName, sequence: &str) -> String {
        format!("NEXT VALUE FOR {}", self.qualify_name(schema, sequence))
    }

    fn utc_now(&self) -> &'static str {
        "SYSUTCDATETIME()"
    }

    fn ddl_pattern(&self, kind: DdlObjectKind) -> DdlPattern {
        match kind {
            DdlObjectKind::Trigger | DdlObjectKind::Function => DdlPattern::CreateOrAlter,
            _ => DdlPattern::CatalogGuard,
        }
    }

    fn write_create_schema(&self, writer: &mut SqlWriter, schema: &DbSchemaName) {
        let create = format!("CREATE SCHEMA {}", self.quote_identifier(schema.as_str()));
        writer.append_line(&format!(
            "IF NOT EXISTS (SELECT 1 FROM sys.schemas WHERE name = {})",
            Self::unicode_literal(schema.as_str())
        ));
        {
            let mut inner = writer.indent();
            inner.append_line(&format!("EXEC({});", Self::unicode_literal(&create)));
        }
    }

    fn write_create_table_start(&self, writer: &mut SqlWriter, table: &DbTableName) {
        let qualified = self.qualify_table(table);
        writer.append_line(&format!(
            "IF OBJECT_ID({}, N'U') IS NULL",
            Self::unicode_literal(&qualified)
        ));
        writer.append_line(&format!("CREATE TABLE {} (", qualified));
    }

    fn write_add_constraint(
        &self,
        writer: &mut SqlWriter,
        table: &DbTableName,
        constraint_name: &str,
        definition: &str,
    ) {
        let qualified = self.qualify_table(table);
        let probe = format!(
            "\n    SELECT 1 FROM sys.objects\n    WHERE name = {}\n        AND parent_object_id = OBJECT_ID({})\n",
            Self::unicode_literal(constraint_name),
            Self::unicode_literal(&qualified)
        );
        let body = format!(
            "ALTER TABLE {}\nADD CONSTRAINT {} {};",
            qualified,
            self.quote_identifier(constraint_name),
            definition
        );
        self.write_if_not_exists(writer, &probe, &body);
    }

    fn write_create_sequence(&self, writer: &mut SqlWriter, schema: &DbSchemaName, name: &str) {
        let probe = format!(
            "SELECT 1 FROM sys.sequences WHERE name = {} AND schema_id = SCHEMA_ID({})",
            Self::unicode_literal(name),
            Self::unicode_literal(schema.as_str())
        );
        let body = format!(
            "CREATE SEQUENCE {} AS bigint START WITH 1 INCREMENT BY 1;",
            self.qualify_name(schema, name)
        );
        self.write_if_not_exists(writer, &probe, &body);
    }

    fn write_create_index(&self, writer: &mut SqlWriter, index: &DbIndexModel) {
        let qualified = self.qualify_table(&index.table);
        let probe = format!(
            "SELECT 1 FROM sys.indexes WHERE name = {} AND object_id = OBJECT_ID({})",
            Self::unicode_literal(index.name.as_str()),
            Self::unicode_literal(&qualified)
        );
        let body = format!(
            "CREATE {}INDEX {} ON {} ({});",
            if index.is_unique { "UNIQUE " } else { "" },
            self.quote_identifier(index.name.as_str()),
            qualified,
            self.column_list(&index.columns)
        );
        self.write_if_not_exists(writer, &probe, &body);
    }

    fn write_stamp_trigger(
        &self,
        writer: &mut SqlWriter,
        trigger: &DbTriggerModel,
        core_names: &CoreSchemaNames,
    ) {
        let document_id = self.quote_identifier(core_names.document_id_column().as_str());
        let row_id = self.quote_identifier(trigger.document_id_column.as_str());

        // CREATE TRIGGER must be the only statement in its batch
        writer.append_line(BATCH_SEPARATOR);
        writer.append_line(&format!(
            "CREATE OR ALTER TRIGGER {}",
            self.qualify_name(&trigger.table.schema, trigger.name.as_str())
        ));
        writer.append_line(&format!("ON {}", self.qualify_table(&trigger.table)));
        writer.append_line("AFTER INSERT, UPDATE, DELETE");
        writer.append_line("AS");
        writer.append_line("BEGIN");
        {
            let mut body = writer.indent();
            body.append_line("SET NOCOUNT ON;");
            body.append_line("UPDATE d");
            body.append_line(&format!(
                "SET {} = {},",
                self.quote_identifier(core_names.content_version_column().as_str()),
                self.next_sequence_value(&core_names.schema, &core_names.change_version_sequence)
            ));
            {
                let mut set = body.indent();
                set.append_line(&format!(
                    "{} = {}",
                    self.quote_identifier(core_names.content_last_modified_column().as_str()),
                    self.utc_now()
                ));
            }
            body.append_line(&format!(
                "FROM {} d",
                self.qualify_table(&core_names.document_table())
            ));
            body.append_line(&format!(
                "WHERE EXISTS (SELECT 1 FROM inserted i WHERE i.{} = d.{})",
                row_id, document_id
            ));
            body.append_line(&format!(
                "    OR EXISTS (SELECT 1 FROM deleted x WHERE x.{} = d.{});",
                row_id, document_id
            ));
        }
        writer.append_line("END;");
        writer.append_line(BATCH_SEPARATOR);
    }

    fn write_uuidv5_function(&self, writer: &mut SqlWriter, core_names: &CoreSchemaNames) {
        writer.append_line(BATCH_SEPARATOR);
        writer.append_line(&format!(
            "CREATE OR ALTER FUNCTION {}(@namespace uniqueidentifier, @name nvarchar(max))",
            self.qualify_name(&core_names.schema, &core_names.uuidv5_function)
        ));
        writer.append_line("RETURNS uniqueidentifier");
        writer.append_line("WITH SCHEMABINDING");
        writer.append_line("AS");
        writer.append_line("BEGIN");
        {
            let mut body = writer.indent();
            // uniqueidentifier stores the first three groups little-endian
            body.append_line("DECLARE @ns varbinary(16) = CAST(@namespace AS varbinary(16));");
            body.append_line(
                "DECLARE @nsBigEndian varbinary(16) = SUBSTRING(@ns, 4, 1) + SUBSTRING(@ns, 3, 1) + SUBSTRING(@ns, 2, 1) + SUBSTRING(@ns, 1, 1)",
            );
            {
                let mut cont = body.indent();
                cont.append_line("+ SUBSTRING(@ns, 6, 1) + SUBSTRING(@ns, 5, 1)");
                cont.append_line("+ SUBSTRING(@ns, 8, 1) + SUBSTRING(@ns, 7, 1)");
                cont.append_line("+ SUBSTRING(@ns, 9, 8);");
            }
            body.append_line(
                "DECLARE @hash varbinary(20) = HASHBYTES('SHA1', @nsBigEndian + CAST(CAST(@name AS varchar(max) COLLATE Latin1_General_100_CI_AS_SC_UTF8) AS varbinary(max)));",
            );
            body.append_line("DECLARE @b varbinary(16) = SUBSTRING(@hash, 1, 6)");
            {
                let mut cont = body.indent();
                cont.append_line("+ CAST((CAST(SUBSTRING(@hash, 7, 1) AS tinyint) & 15) | 80 AS binary(1))");
                cont.append_line("+ SUBSTRING(@hash, 8, 1)");
                cont.append_line("+ CAST((CAST(SUBSTRING(@hash, 9, 1) AS tinyint) & 63) | 128 AS binary(1))");
                cont.append_line("+ SUBSTRING(@hash, 10, 7);");
            }
            body.append_line(
                "RETURN CAST(SUBSTRING(@b, 4, 1) + SUBSTRING(@b, 3, 1) + SUBSTRING(@b, 2, 1) + SUBSTRING(@b, 1, 1)",
            );
            {
                let mut cont = body.indent();
                cont.append_line("+ SUBSTRING(@b, 6, 1) + SUBSTRING(@b, 5, 1)");
                cont.append_line("+ SUBSTRING(@b, 8, 1) + SUBSTRING(@b, 7, 1)");
                cont.append_line("+ SUBSTRING(@b, 9, 8) AS uniqueidentifier);");
            }
        }
        writer.append_line("END;");
        writer.append_line(BATCH_SEPARATOR);
    }

    fn string_literal(&self, value: &str) -> String {
        Self::unicode_literal(value)
    }

    fn binary_literal(&self, bytes: &[u8]) -> String {
        format!("0x{}", hex::encode_upper(bytes))
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_string()
    }

    fn paging_clause(&self, offset_parameter: &str, limit_parameter: &str) -> String {
        format!(
            "OFFSET @{} ROWS FETCH NEXT @{} ROWS ONLY",
            offset_parameter, limit_parameter
        )
    }

    fn write_raise_error_if(&self, writer: &mut SqlWriter, condition: &str, message: &str) {
        writer.append("IF ").append_line(condition);
        writer.append_line("BEGIN");
        {
            let mut inner = writer.indent();
            inner.append_line(&format!("THROW 50000, {}, 1;", Self::unicode_literal(message)));
        }
        writer.append_line("END;");
    }

    fn write_insert_if_missing(
        &self,
        writer: &mut SqlWriter,
        table: &DbTableName,
        columns: &[DbColumnName],
        values: &[String],
        key_count: usize,
    ) {
        let qualified = self.qualify_table(table);
        let key_match = columns
            .iter()
            .zip(values)
            .take(key_count.max(1))
            .map(|(column, value)| format!("{} = {}", self.quote_identifier(column.as_str()), value))
            .collect::<Vec<_>>()
            .join(" AND ");
        let probe = format!("SELECT 1 FROM {} WHERE {}", qualified, key_match);
        let body = format!(
            "INSERT INTO {} ({})\nVALUES ({});",
            qualified,
            self.column_list(columns),
            values.join(", ")
        );
        self.write_if_not_exists(writer, &probe, &body);
    }

    fn binary_equals(&self, left: &str, right: &str) -> String {
        format!("{} COLLATE Latin1_General_100_BIN2 = {}", left, right)
    }

    fn batch_separator(&self) -> Option<&'static str> {
        Some(BATCH_SEPARATOR)
    }
}
