//! Error types for skyfunctor core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Invalid column key {key}: {message}")]
    InvalidKey { key: String, message: String },

    #[error("Length mismatch for column '{column}': expected {expected} rows, got {actual}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Type mismatch for column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Row index mismatch: {0}")]
    IndexMismatch(String),

    #[error("Table load failed: {0}")]
    LoadFailed(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
