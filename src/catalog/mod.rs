//! Column metadata for OakDB

mod schema;
mod types;

pub use schema::{Column, Schema};
pub use types::ColumnType;
