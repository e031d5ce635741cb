//! Schema definitions for OakDB
//!
//! This module defines table schemas and column metadata.

use super::types::ColumnType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column definition in a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within the table, case-sensitive)
    pub name: String,
    /// Data type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Is this the primary key column?
    pub primary_key: bool,
    /// Must values be unique?
    pub unique: bool,
    /// Are NULL values rejected?
    pub not_null: bool,
}

impl Column {
    /// Create a new column with no constraints
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            unique: false,
            not_null: false,
        }
    }

    /// Set the primary key flag. A primary key implies UNIQUE and NOT NULL.
    pub fn primary_key(mut self, pk: bool) -> Self {
        self.primary_key = pk;
        if pk {
            self.unique = true;
            self.not_null = true;
        }
        self
    }

    /// Set the unique flag
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set the NOT NULL flag
    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    /// Whether this column is backed by an index at table creation
    pub fn indexed(&self) -> bool {
        self.primary_key || self.unique
    }
}

/// Table schema - an ordered list of columns
#[derive(Debug, Clone)]
pub struct Schema {
    /// Ordered list of columns
    columns: Vec<Column>,
    /// Column name to position mapping
    name_to_index: HashMap<String, usize>,
}

impl Schema {
    /// Create a schema from a list of columns.
    ///
    /// Rejects duplicate column names and more than one primary key.
    pub fn from_columns(table: &str, columns: Vec<Column>) -> Result<Self> {
        let mut name_to_index = HashMap::new();
        let mut primary_keys = 0;

        for (position, col) in columns.iter().enumerate() {
            if name_to_index.insert(col.name.clone(), position).is_some() {
                return Err(Error::DuplicateColumn(col.name.clone()));
            }
            if col.primary_key {
                primary_keys += 1;
            }
        }

        if primary_keys > 1 {
            return Err(Error::MultiplePrimaryKeys(table.to_string()));
        }

        Ok(Self {
            columns,
            name_to_index,
        })
    }

    /// Get column by name (case-sensitive)
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.name_to_index.get(name).map(|&idx| &self.columns[idx])
    }

    /// Check if a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Get all columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let schema = Schema::from_columns(
            "users",
            vec![
                Column::new("id", ColumnType::Integer).primary_key(true),
                Column::new("name", ColumnType::Text).not_null(true),
                Column::new("email", ColumnType::Text).unique(true),
            ],
        )
        .unwrap();

        assert_eq!(schema.column_count(), 3);
        assert!(schema.has_column("id"));
        assert!(!schema.has_column("unknown"));

        let id = schema.column("id").unwrap();
        assert!(id.primary_key);
        assert!(id.unique);
        assert!(id.not_null);
        assert!(id.indexed());

        let name = schema.column("name").unwrap();
        assert!(name.not_null);
        assert!(!name.indexed());
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let schema = Schema::from_columns(
            "t",
            vec![Column::new("Name", ColumnType::Text)],
        )
        .unwrap();

        assert!(schema.has_column("Name"));
        assert!(!schema.has_column("name"));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Schema::from_columns(
            "t",
            vec![
                Column::new("a", ColumnType::Integer),
                Column::new("a", ColumnType::Text),
            ],
        );
        assert!(matches!(result, Err(Error::DuplicateColumn(_))));
    }

    #[test]
    fn test_multiple_primary_keys_rejected() {
        let result = Schema::from_columns(
            "t",
            vec![
                Column::new("a", ColumnType::Integer).primary_key(true),
                Column::new("b", ColumnType::Integer).primary_key(true),
            ],
        );
        assert!(matches!(result, Err(Error::MultiplePrimaryKeys(_))));
    }
}
