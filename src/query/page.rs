//! Paged `DocumentId` queries over a resource root table.
//!
//! A predicate bound to a column with a unified-alias mapping is rewritten to
//! the unified column. When the mapping carries a presence column, the
//! predicate is gated with `presence IS NOT NULL AND ...` so rows where the
//! optional path is absent never match.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::params::bind;
use crate::model::definition::{DbColumnName, DbTableName};
use crate::sql::SqlError;
use crate::sql::dialect::{SqlDialect, SqlDialectOps};
use crate::sql::writer::SqlWriter;

const ROOT_ALIAS: &str = "r";
const DOCUMENT_ID_COLUMN: &str = "DocumentId";
const COMPILER_NAME: &str = "PageDocumentIdSqlCompiler";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryComparisonOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Like,
    In,
}

impl QueryComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryComparisonOperator::Equal => "Equal",
            QueryComparisonOperator::NotEqual => "NotEqual",
            QueryComparisonOperator::LessThan => "LessThan",
            QueryComparisonOperator::LessThanOrEqual => "LessThanOrEqual",
            QueryComparisonOperator::GreaterThan => "GreaterThan",
            QueryComparisonOperator::GreaterThanOrEqual => "GreaterThanOrEqual",
            QueryComparisonOperator::Like => "Like",
            QueryComparisonOperator::In => "In",
        }
    }

    /// SQL operator token; `None` for operators this compiler cannot express.
    fn sql_token(&self) -> Option<&'static str> {
        match self {
            QueryComparisonOperator::Equal => Some("="),
            QueryComparisonOperator::NotEqual => Some("<>"),
            QueryComparisonOperator::LessThan => Some("<"),
            QueryComparisonOperator::LessThanOrEqual => Some("<="),
            QueryComparisonOperator::GreaterThan => Some(">"),
            QueryComparisonOperator::GreaterThanOrEqual => Some(">="),
            QueryComparisonOperator::Like => Some("LIKE"),
            QueryComparisonOperator::In => None,
        }
    }
}

impl fmt::Display for QueryComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `column <operator> @parameter_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryValuePredicate {
    pub column: DbColumnName,
    pub operator: QueryComparisonOperator,
    pub parameter_name: String,
}

/// The canonical column answering queries on a bound column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedAliasMapping {
    pub unified_column: DbColumnName,
    /// Must be non-null for the optional path to be present
    pub presence_column: Option<DbColumnName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocumentIdQuerySpec {
    pub root_table: DbTableName,
    /// Combined with `AND`, in order
    pub predicates: Vec<QueryValuePredicate>,
    /// Keyed by the column a predicate is bound to
    pub unified_alias_mappings: BTreeMap<DbColumnName, UnifiedAliasMapping>,
    pub offset_parameter_name: String,
    pub limit_parameter_name: String,
    pub include_total_count: bool,
}

impl PageDocumentIdQuerySpec {
    pub fn new(root_table: DbTableName) -> Self {
        Self {
            root_table,
            predicates: Vec::new(),
            unified_alias_mappings: BTreeMap::new(),
            offset_parameter_name: "offset".to_string(),
            limit_parameter_name: "limit".to_string(),
            include_total_count: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocumentIdSql {
    pub page_sql: String,
    pub total_count_sql: Option<String>,
}

pub struct PageDocumentIdSqlCompiler {
    dialect: SqlDialect,
}

impl PageDocumentIdSqlCompiler {
    pub fn new(dialect: SqlDialect) -> Self {
        Self { dialect }
    }

    pub fn compile(&self, spec: &PageDocumentIdQuerySpec) -> Result<PageDocumentIdSql, SqlError> {
        let conditions = spec
            .predicates
            .iter()
            .map(|p| self.render_predicate(p, &spec.unified_alias_mappings))
            .collect::<Result<Vec<_>, _>>()?;
        bind(&spec.offset_parameter_name)?;
        bind(&spec.limit_parameter_name)?;

        let table = self.dialect.qualify_table(&spec.root_table);
        let document_id = self.column(DOCUMENT_ID_COLUMN);

        let mut page = SqlWriter::new();
        page.append("SELECT ").append_line(&document_id);
        page.append_line(&format!("FROM {} {}", table, ROOT_ALIAS));
        self.write_where(&mut page, &conditions);
        page.append_line(&format!("ORDER BY {} ASC", document_id));
        page.append(&self.dialect.paging_clause(
            &spec.offset_parameter_name,
            &spec.limit_parameter_name,
        ))
        .append_line(";");

        let total_count_sql = spec.include_total_count.then(|| {
            let mut count = SqlWriter::new();
            count.append_line("SELECT COUNT(1)");
            count.append_line(&format!("FROM {} {}", table, ROOT_ALIAS));
            self.write_where(&mut count, &conditions);
            let mut sql = count.finish();
            if sql.ends_with('\n') {
                sql.pop();
            }
            sql.push_str(";\n");
            sql
        });

        debug!(
            table = %spec.root_table,
            predicates = conditions.len(),
            total_count = spec.include_total_count,
            "Compiled page query"
        );
        Ok(PageDocumentIdSql {
            page_sql: page.finish(),
            total_count_sql,
        })
    }

    fn column(&self, name: &str) -> String {
        format!("{}.{}", ROOT_ALIAS, self.dialect.quote_identifier(name))
    }

    fn render_predicate(
        &self,
        predicate: &QueryValuePredicate,
        mappings: &BTreeMap<DbColumnName, UnifiedAliasMapping>,
    ) -> Result<String, SqlError> {
        let token = predicate
            .operator
            .sql_token()
            .ok_or_else(|| SqlError::UnsupportedOperator {
                operator: predicate.operator.to_string(),
                compiler: COMPILER_NAME,
            })?;
        let parameter = bind(&predicate.parameter_name)?;

        let Some(mapping) = mappings.get(&predicate.column) else {
            return Ok(format!(
                "{} {} {}",
                self.column(predicate.column.as_str()),
                token,
                parameter
            ));
        };
        let comparison = format!(
            "{} {} {}",
            self.column(mapping.unified_column.as_str()),
            token,
            parameter
        );
        Ok(match &mapping.presence_column {
            Some(presence) => format!(
                "{} IS NOT NULL AND {}",
                self.column(presence.as_str()),
                comparison
            ),
            None => comparison,
        })
    }

    fn write_where(&self, writer: &mut SqlWriter, conditions: &[String]) {
        for (i, condition) in conditions.iter().enumerate() {
            if i == 0 {
                writer.append("WHERE ").append_line(condition);
            } else {
                writer.append("    AND ").append_line(condition);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::definition::DbSchemaName;
    use crate::sql::dialect::{SqlDialectFactory, SqlDialectKind};
    use rstest::{fixture, rstest};

    #[fixture]
    fn spec() -> PageDocumentIdQuerySpec {
        let mut spec = PageDocumentIdQuerySpec::new(DbTableName::new(
            DbSchemaName::new("edfi"),
            "StudentSchoolAssociation",
        ));
        spec.predicates.push(QueryValuePredicate {
            column: DbColumnName::new("Student_StudentUniqueId"),
            operator: QueryComparisonOperator::Equal,
            parameter_name: "studentUniqueId".to_string(),
        });
        spec.unified_alias_mappings.insert(
            DbColumnName::new("Student_StudentUniqueId"),
            UnifiedAliasMapping {
                unified_column: DbColumnName::new("StudentUniqueId_Unified"),
                presence_column: Some(DbColumnName::new("Student_DocumentId")),
            },
        );
        spec
    }

    fn compile(kind: SqlDialectKind, spec: &PageDocumentIdQuerySpec) -> Result<PageDocumentIdSql, SqlError> {
        PageDocumentIdSqlCompiler::new(SqlDialectFactory::create(kind)).compile(spec)
    }

    #[rstest]
    fn test_gated_unified_alias_rewrite(spec: PageDocumentIdQuerySpec) {
        let sql = compile(SqlDialectKind::Pgsql, &spec).unwrap().page_sql;
        assert!(sql.contains(
            "r.\"Student_DocumentId\" IS NOT NULL AND r.\"StudentUniqueId_Unified\" = @studentUniqueId"
        ));
        assert!(!sql.contains("Student_StudentUniqueId"));
    }

    #[rstest]
    fn test_ungated_mapping_has_no_presence_check(mut spec: PageDocumentIdQuerySpec) {
        for mapping in spec.unified_alias_mappings.values_mut() {
            mapping.presence_column = None;
        }
        let sql = compile(SqlDialectKind::Pgsql, &spec).unwrap().page_sql;
        assert!(!sql.contains("IS NOT NULL"));
        assert!(sql.contains("WHERE r.\"StudentUniqueId_Unified\" = @studentUniqueId"));
    }

    #[rstest]
    fn test_unmapped_predicate_kept(mut spec: PageDocumentIdQuerySpec) {
        spec.unified_alias_mappings.clear();
        let sql = compile(SqlDialectKind::Pgsql, &spec).unwrap().page_sql;
        assert!(sql.contains("WHERE r.\"Student_StudentUniqueId\" = @studentUniqueId"));
    }

    #[rstest]
    fn test_pgsql_page_query(spec: PageDocumentIdQuerySpec) {
        let sql = compile(SqlDialectKind::Pgsql, &spec).unwrap().page_sql;
        assert_eq!(
            sql,
            "SELECT r.\"DocumentId\"\n\
             FROM \"edfi\".\"StudentSchoolAssociation\" r\n\
             WHERE r.\"Student_DocumentId\" IS NOT NULL AND r.\"StudentUniqueId_Unified\" = @studentUniqueId\n\
             ORDER BY r.\"DocumentId\" ASC\n\
             LIMIT @limit OFFSET @offset;\n"
        );
    }

    #[rstest]
    fn test_mssql_paging_and_count(mut spec: PageDocumentIdQuerySpec) {
        spec.include_total_count = true;
        spec.predicates.push(QueryValuePredicate {
            column: DbColumnName::new("SchoolId"),
            operator: QueryComparisonOperator::GreaterThanOrEqual,
            parameter_name: "schoolId".to_string(),
        });
        let sql = compile(SqlDialectKind::Mssql, &spec).unwrap();
        assert!(sql.page_sql.ends_with("OFFSET @offset ROWS FETCH NEXT @limit ROWS ONLY;\n"));
        assert!(sql.page_sql.contains("    AND r.[SchoolId] >= @schoolId\n"));
        let count = sql.total_count_sql.unwrap();
        assert!(count.starts_with("SELECT COUNT(1)\nFROM [edfi].[StudentSchoolAssociation] r\nWHERE "));
        assert!(count.ends_with("AND r.[SchoolId] >= @schoolId;\n"));
        assert!(!count.contains("ORDER BY"));
    }

    #[rstest]
    fn test_in_operator_rejected(mut spec: PageDocumentIdQuerySpec) {
        spec.predicates[0].operator = QueryComparisonOperator::In;
        let err = compile(SqlDialectKind::Pgsql, &spec).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operator 'In' is not supported by PageDocumentIdSqlCompiler."
        );
    }

    #[rstest]
    fn test_unsafe_paging_parameter_rejected(mut spec: PageDocumentIdQuerySpec) {
        spec.limit_parameter_name = "limit; --".to_string();
        assert_eq!(
            compile(SqlDialectKind::Pgsql, &spec).unwrap_err(),
            SqlError::UnsafeParameterName {
                name: "limit; --".to_string()
            }
        );
    }
}
