//! OakDB - A small relational database engine written in Rust
//!
//! This library provides the core components for a SQL database:
//! - SQL parsing (lexer, parser, AST)
//! - Typed storage with constraint enforcement and a B-Tree index
//! - Query execution (access-path planner, executor)
//! - Per-table JSON persistence
//!
//! The engine is single-threaded: every operation runs to completion on the
//! caller's thread. Embedders that serve multiple clients are responsible
//! for serializing access to the [`Database`] handle.

pub mod catalog;
pub mod database;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use catalog::{Column, ColumnType, Schema};
pub use database::Database;
pub use error::{Error, Result};
pub use executor::{QueryResult, StatementKind};
pub use storage::value::Value;
