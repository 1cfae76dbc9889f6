//! SQL dialects.
//!
//! `SqlDialect` is a closed enum over the supported dialects. Every
//! operation is declared once on `SqlDialectOps` and dispatched with
//! `enum_dispatch`, so adding a dialect forces an implementation of each
//! operation.
//!
//! Idempotent DDL per object kind:
//!
//! | Object      | PostgreSQL                    | SQL Server                     |
//! |-------------|-------------------------------|--------------------------------|
//! | schema      | `CREATE SCHEMA IF NOT EXISTS` | `sys.schemas` guard + `EXEC`   |
//! | table       | `CREATE TABLE IF NOT EXISTS`  | `OBJECT_ID` guard              |
//! | constraint  | `DO $ddl$` + `pg_constraint`  | `sys.objects` guard            |
//! | sequence    | `DO $ddl$` + `to_regclass`    | `sys.sequences` guard          |
//! | index       | `DO $ddl$` + `to_regclass`    | `sys.indexes` guard            |
//! | trigger     | drop then create              | `CREATE OR ALTER`              |
//! | function    | `CREATE OR REPLACE`           | `CREATE OR ALTER`              |

mod mssql;
mod pgsql;

pub use mssql::MssqlDialect;
pub use pgsql::PgsqlDialect;

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use super::SqlError;
use super::escape::escape_string_for_quote;
use super::writer::SqlWriter;
use crate::model::core_names::CoreSchemaNames;
use crate::model::definition::{
    DbColumnName, DbIndexModel, DbSchemaName, DbTableName, DbTriggerModel, ReferentialAction,
    RelationalScalarType,
};

/// Identity of a supported dialect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialectKind {
    /// PostgreSQL
    #[default]
    Pgsql,
    /// Microsoft SQL Server
    Mssql,
}

impl SqlDialectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlDialectKind::Pgsql => "pgsql",
            SqlDialectKind::Mssql => "mssql",
        }
    }
}

impl fmt::Display for SqlDialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SqlDialectKind {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pgsql" | "postgres" | "postgresql" => Ok(SqlDialectKind::Pgsql),
            "mssql" | "sqlserver" => Ok(SqlDialectKind::Mssql),
            _ => Err(SqlError::UnsupportedDialect(s.to_string())),
        }
    }
}

impl TryFrom<u8> for SqlDialectKind {
    type Error = SqlError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SqlDialectKind::Pgsql),
            1 => Ok(SqlDialectKind::Mssql),
            other => Err(SqlError::UnsupportedDialect(other.to_string())),
        }
    }
}

/// Base SQL type names for each scalar kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarTypeDefaults {
    pub string: &'static str,
    pub unbounded_string: &'static str,
    pub int32: &'static str,
    pub int64: &'static str,
    pub boolean: &'static str,
    pub date: &'static str,
    pub date_time: &'static str,
    pub time: &'static str,
    pub decimal: &'static str,
}

/// Object kinds with a dialect-specific idempotent creation pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdlObjectKind {
    Schema,
    Table,
    Constraint,
    Sequence,
    Index,
    Trigger,
    Function,
}

/// How a dialect makes a `CREATE` safe to repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdlPattern {
    /// Native `IF NOT EXISTS`
    IfNotExists,
    /// Existence check against the catalog before creating
    CatalogGuard,
    CreateOrReplace,
    CreateOrAlter,
    /// Drop any existing object, then create it
    DropThenCreate,
}

/// Dialect identity plus shared limits and defaults.
#[enum_dispatch]
pub trait SqlDialectRules {
    fn kind(&self) -> SqlDialectKind;

    /// Longest identifier the server accepts without truncation.
    fn max_identifier_length(&self) -> usize;

    fn scalar_type_defaults(&self) -> ScalarTypeDefaults;

    fn default_schema(&self) -> &'static str;
}

/// Text-rendering operations of a dialect.
#[enum_dispatch]
pub trait SqlDialectOps: SqlDialectRules {
    /// Quote an identifier, doubling the dialect's closing delimiter.
    fn quote_identifier(&self, name: &str) -> String;

    fn qualify_name(&self, schema: &DbSchemaName, name: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(schema.as_str()),
            self.quote_identifier(name)
        )
    }

    fn qualify_table(&self, table: &DbTableName) -> String {
        self.qualify_name(&table.schema, &table.name)
    }

    /// Comma-separated quoted column list.
    fn column_list(&self, columns: &[DbColumnName]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_column_type(&self, scalar_type: &RelationalScalarType) -> String {
        let defaults = self.scalar_type_defaults();
        match *scalar_type {
            RelationalScalarType::String {
                max_length: Some(length),
            } => format!("{}({})", defaults.string, length),
            RelationalScalarType::String { max_length: None } => defaults.unbounded_string.to_string(),
            RelationalScalarType::Int32 => defaults.int32.to_string(),
            RelationalScalarType::Int64 => defaults.int64.to_string(),
            RelationalScalarType::Boolean => defaults.boolean.to_string(),
            RelationalScalarType::Date => defaults.date.to_string(),
            RelationalScalarType::DateTime => defaults.date_time.to_string(),
            RelationalScalarType::Time => defaults.time.to_string(),
            RelationalScalarType::Decimal { precision, scale } => {
                format!("{}({},{})", defaults.decimal, precision, scale)
            }
        }
    }

    fn uuid_type(&self) -> &'static str;

    fn binary_type(&self, length: u32) -> String;

    /// Column suffix for a server-generated `bigint` key.
    fn identity_clause(&self) -> &'static str;

    /// Expression drawing the next value from a sequence.
    fn next_sequence_value(&self, schema: &DbSchemaName, sequence: &str) -> String;

    fn utc_now(&self) -> &'static str;

    fn ddl_pattern(&self, kind: DdlObjectKind) -> DdlPattern;

    /// Statements a fresh database needs before any schema object.
    fn write_prerequisites(&self, _writer: &mut SqlWriter) {}

    fn write_create_schema(&self, writer: &mut SqlWriter, schema: &DbSchemaName);

    /// The guard (if any) and the `CREATE TABLE name (` line.
    fn write_create_table_start(&self, writer: &mut SqlWriter, table: &DbTableName);

    /// `ALTER TABLE ... ADD CONSTRAINT name definition`, skipped when present.
    fn write_add_constraint(
        &self,
        writer: &mut SqlWriter,
        table: &DbTableName,
        constraint_name: &str,
        definition: &str,
    );

    fn write_create_sequence(&self, writer: &mut SqlWriter, schema: &DbSchemaName, name: &str);

    fn write_create_index(&self, writer: &mut SqlWriter, index: &DbIndexModel);

    /// Row trigger that bumps `ContentVersion` on the owning document.
    fn write_stamp_trigger(
        &self,
        writer: &mut SqlWriter,
        trigger: &DbTriggerModel,
        core_names: &CoreSchemaNames,
    );

    /// Deterministic RFC 4122 version-5 UUID over (namespace, UTF-8 name).
    fn write_uuidv5_function(&self, writer: &mut SqlWriter, core_names: &CoreSchemaNames);

    /// `None` for the default action, which is never rendered.
    fn render_referential_action(&self, action: ReferentialAction) -> Option<&'static str> {
        match action {
            ReferentialAction::NoAction => None,
            ReferentialAction::Cascade => Some("CASCADE"),
            ReferentialAction::SetNull => Some("SET NULL"),
        }
    }

    fn string_literal(&self, value: &str) -> String;

    fn binary_literal(&self, bytes: &[u8]) -> String;

    fn boolean_literal(&self, value: bool) -> String;

    /// Paging clause over bind parameters (names without sigil).
    fn paging_clause(&self, offset_parameter: &str, limit_parameter: &str) -> String;

    /// Fail the script with `message` when `condition` holds.
    fn write_raise_error_if(&self, writer: &mut SqlWriter, condition: &str, message: &str);

    /// Insert one row unless a row with the same key exists. The first
    /// `key_count` columns form the key.
    fn write_insert_if_missing(
        &self,
        writer: &mut SqlWriter,
        table: &DbTableName,
        columns: &[DbColumnName],
        values: &[String],
        key_count: usize,
    );

    /// Byte-exact comparison of two text expressions.
    fn binary_equals(&self, left: &str, right: &str) -> String;

    /// Line that ends a batch, for dialects whose tools need one.
    fn batch_separator(&self) -> Option<&'static str> {
        None
    }
}

/// The closed set of supported dialects.
#[enum_dispatch(SqlDialectRules, SqlDialectOps)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Pgsql(PgsqlDialect),
    Mssql(MssqlDialect),
}

pub struct SqlDialectFactory;

impl SqlDialectFactory {
    pub fn create(kind: SqlDialectKind) -> SqlDialect {
        match kind {
            SqlDialectKind::Pgsql => PgsqlDialect.into(),
            SqlDialectKind::Mssql => MssqlDialect.into(),
        }
    }

    pub fn create_from_rules(rules: &dyn SqlDialectRules) -> SqlDialect {
        Self::create(rules.kind())
    }

    /// Build from a raw dialect number; values outside the enum fail.
    pub fn create_from_value(value: u8) -> Result<SqlDialect, SqlError> {
        SqlDialectKind::try_from(value).map(Self::create)
    }
}

/// Quote with `open`/`close`, doubling `close` inside.
pub(crate) fn delimit(name: &str, open: char, close: char) -> String {
    format!("{}{}{}", open, escape_string_for_quote(name, close), close)
}
