//! relational_model library - ApiSchema to relational model compiler
//!
//! Derives a deterministic relational model (tables, columns, keys and
//! constraints) from Ed-Fi ApiSchema resource documents, and emits
//! PostgreSQL or SQL Server DDL, seed DML and document query SQL for it.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod model;
pub mod output;
pub mod query;
pub mod sql;

#[macro_use]
pub mod test_macros;
