//! Canonical multi-line `INSERT` with bound parameters.

use super::params::bind;
use crate::model::definition::{DbColumnName, DbTableName};
use crate::sql::SqlError;
use crate::sql::dialect::{SqlDialect, SqlDialectOps};
use crate::sql::writer::SqlWriter;

pub struct ToyInsertSqlEmitter {
    dialect: SqlDialect,
}

impl ToyInsertSqlEmitter {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    /// `columns[i]` is bound to `@parameter_names[i]`.
    pub fn emit(
        &self,
        table: &DbTableName,
        columns: &[DbColumnName],
        parameter_names: &[&str],
    ) -> Result<String, SqlError> {
        if columns.len() != parameter_names.len() {
            return Err(SqlError::ColumnParameterCountMismatch {
                columns: columns.len(),
                parameters: parameter_names.len(),
            });
        }
        if columns.is_empty() {
            return Err(SqlError::EmptyColumnList);
        }
        let parameters = parameter_names
            .iter()
            .map(|name| bind(name))
            .collect::<Result<Vec<_>, _>>()?;
        let columns: Vec<String> = columns
            .iter()
            .map(|c| self.dialect.quote_identifier(c.as_str()))
            .collect();

        let mut writer = SqlWriter::new();
        writer
            .append("INSERT INTO ")
            .append_line(&self.dialect.qualify_table(table));
        write_list(&mut writer, &columns);
        writer.append_line("VALUES");
        write_list(&mut writer, &parameters);
        let mut sql = writer.finish();
        sql.truncate(sql.trim_end().len());
        sql.push_str(";\n");
        Ok(sql)
    }
}

fn write_list(writer: &mut SqlWriter, items: &[String]) {
    writer.append_line("(");
    {
        let mut inner = writer.indent();
        for (i, item) in items.iter().enumerate() {
            inner.append(item);
            inner.append_line(if i + 1 < items.len() { "," } else { "" });
        }
    }
    writer.append_line(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::definition::DbSchemaName;
    use crate::sql::dialect::{SqlDialectFactory, SqlDialectKind};
    use rstest::rstest;

    fn student() -> DbTableName {
        DbTableName::new(DbSchemaName::new("edfi"), "Student")
    }

    fn columns(names: &[&str]) -> Vec<DbColumnName> {
        names.iter().map(|n| DbColumnName::new(*n)).collect()
    }

    #[rstest]
    fn test_three_column_insert() {
        let sql = ToyInsertSqlEmitter::new(SqlDialectFactory::create(SqlDialectKind::Pgsql))
            .emit(
                &student(),
                &columns(&["DocumentId", "StudentUniqueId", "FirstName"]),
                &["documentId", "studentUniqueId", "firstName"],
            )
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"edfi\".\"Student\"\n(\n    \"DocumentId\",\n    \"StudentUniqueId\",\n    \"FirstName\"\n)\nVALUES\n(\n    @documentId,\n    @studentUniqueId,\n    @firstName\n);\n"
        );
    }

    #[rstest]
    fn test_mssql_quoting() {
        let sql = ToyInsertSqlEmitter::new(SqlDialectFactory::create(SqlDialectKind::Mssql))
            .emit(&student(), &columns(&["DocumentId"]), &["documentId"])
            .unwrap();
        assert!(sql.starts_with("INSERT INTO [edfi].[Student]\n(\n    [DocumentId]\n)\n"));
    }

    #[rstest]
    fn test_count_mismatch_message() {
        let err = ToyInsertSqlEmitter::new(SqlDialectFactory::create(SqlDialectKind::Pgsql))
            .emit(&student(), &columns(&["A", "B"]), &["a"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Column and parameter counts must match. Column count: 2. Parameter count: 1."
        );
    }

    #[rstest]
    #[case("@a")]
    #[case(":a")]
    fn test_sigil_parameter_rejected(#[case] name: &str) {
        let err = ToyInsertSqlEmitter::new(SqlDialectFactory::create(SqlDialectKind::Pgsql))
            .emit(&student(), &columns(&["A"]), &[name])
            .unwrap_err();
        assert!(matches!(err, SqlError::SigilParameterName { .. }));
    }

    #[rstest]
    fn test_empty_column_list_rejected() {
        let err = ToyInsertSqlEmitter::new(SqlDialectFactory::create(SqlDialectKind::Pgsql))
            .emit(&student(), &[], &[])
            .unwrap_err();
        assert_eq!(err, SqlError::EmptyColumnList);
    }
}
