//! Error types for tablekit.
//!
//! Every failure is raised synchronously at the offending call. Nothing is
//! retried; a failed mutation leaves the table untouched.

use thiserror::Error;

/// Table engine error type
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    #[error("Type mismatch on column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Column '{0}' does not allow null values")]
    NullViolation(String),

    #[error("Value {value} violates uniqueness of column '{column}'")]
    UniquenessViolation { column: String, value: String },

    #[error("Column '{0}' is read-only")]
    ReadOnlyViolation(String),

    #[error("Row has {found} values but the table has {expected} columns")]
    TooManyValues { expected: usize, found: usize },

    #[error("Row index {index} out of range (row count {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Table '{0}' not found")]
    UnknownTable(String),

    #[error("Table '{0}' already exists")]
    DuplicateTable(String),

    #[error("Relation '{0}' not found")]
    UnknownRelation(String),

    #[error("Relation '{0}' already exists")]
    DuplicateRelation(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("Default factory '{0}' is not registered")]
    UnknownFactory(String),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Row source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TableError {
    pub(crate) fn type_mismatch(
        column: impl Into<String>,
        expected: impl std::fmt::Display,
        found: impl std::fmt::Display,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

impl serde::Serialize for TableError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
