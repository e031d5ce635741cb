//! Column types for OakDB
//!
//! This module defines the SQL data types supported by the database.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// 64-bit signed integer
    Integer,
    /// UTF-8 text of arbitrary length
    Text,
    /// 64-bit floating point
    Float,
    /// Boolean
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Float => write!(f, "FLOAT"),
            ColumnType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ColumnType::Integer.to_string(), "INTEGER");
        assert_eq!(ColumnType::Boolean.to_string(), "BOOLEAN");
    }

    #[test]
    fn test_serializes_as_keyword() {
        let json = serde_json::to_string(&ColumnType::Float).unwrap();
        assert_eq!(json, "\"FLOAT\"");
        let back: ColumnType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ColumnType::Float);
    }
}
