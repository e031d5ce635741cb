//! Error types for OakDB
//!
//! This module defines all error types used throughout the database engine.

use thiserror::Error;

/// The main error type for OakDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lexer error: unexpected character '{0}' at byte {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Lexer error: unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),

    #[error("Lexer error: invalid number format at byte {0}")]
    InvalidNumber(usize),

    // ========== Parser Errors ==========
    #[error("Parse error: unexpected token '{found}' at byte {offset}, expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("Parse error: unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    // ========== Plan Errors ==========
    #[error("Plan error: table '{0}' not found")]
    TableNotFound(String),

    #[error("Plan error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Plan error: column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Plan error: ambiguous column reference '{0}'")]
    AmbiguousColumn(String),

    // ========== Constraint Errors ==========
    #[error("Constraint error: cannot store {found} in {expected} column '{column}'")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Constraint error: column '{0}' cannot be NULL")]
    NullNotAllowed(String),

    #[error("Constraint error: duplicate value '{value}' for unique column '{column}'")]
    UniqueViolation { column: String, value: String },

    #[error("Constraint error: duplicate value '{value}' for primary key column '{column}'")]
    PrimaryKeyViolation { column: String, value: String },

    #[error("Constraint error: unknown column '{0}' in table '{1}'")]
    UnknownColumn(String, String),

    #[error("Constraint error: duplicate column '{0}' in table definition")]
    DuplicateColumn(String),

    #[error("Constraint error: table '{0}' declares more than one primary key")]
    MultiplePrimaryKeys(String),

    #[error(
        "Constraint error: table '{table}' expects {expected} values but {found} were supplied"
    )]
    ValueCountMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    // ========== Storage Errors ==========
    #[error("Storage error: corrupt table document '{0}'")]
    Corrupt(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for OakDB operations
pub type Result<T> = std::result::Result<T, Error>;
