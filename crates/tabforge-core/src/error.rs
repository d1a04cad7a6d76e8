//! Error types for tabforge-core

use std::fmt;

use thiserror::Error;

use crate::value::DType;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Stable classification of every failure the engine can report.
///
/// Every crate's error type maps onto one of these through a `kind()` method,
/// so callers outside the core only ever branch on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ErrorKind {
    /// Malformed expression or name
    SyntaxError,
    /// Reference to a column that does not exist
    UnknownColumn,
    /// Column name already taken
    DuplicateName,
    /// Operand types are not compatible with the operator
    TypeMismatch,
    /// Column length differs from the dataset row count
    RowCountMismatch,
    /// Column is still referenced by a later operation
    DependencyConflict,
    /// Evaluation produced no usable value
    EvaluationError,
    /// Crop window outside the dataset
    InvalidRowRange,
    /// Replaying the history does not reproduce the live dataset
    ReplayMismatch,
}

impl ErrorKind {
    /// The canonical upper-case name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SYNTAX_ERROR",
            ErrorKind::UnknownColumn => "UNKNOWN_COLUMN",
            ErrorKind::DuplicateName => "DUPLICATE_NAME",
            ErrorKind::TypeMismatch => "TYPE_MISMATCH",
            ErrorKind::RowCountMismatch => "ROW_COUNT_MISMATCH",
            ErrorKind::DependencyConflict => "DEPENDENCY_CONFLICT",
            ErrorKind::EvaluationError => "EVALUATION_ERROR",
            ErrorKind::InvalidRowRange => "INVALID_ROW_RANGE",
            ErrorKind::ReplayMismatch => "REPLAY_MISMATCH",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in tabforge-core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Column name already exists in the dataset
    #[error("Column already exists: {0}")]
    DuplicateName(String),

    /// Column name is empty or blank
    #[error("Invalid column name: {0:?}")]
    InvalidName(String),

    /// Column not found by name
    #[error("Column not found: {0}")]
    UnknownColumn(String),

    /// Column length does not match the dataset
    #[error("Column {name} has {actual} rows, dataset has {expected}")]
    RowCountMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A value does not match the declared dtype of its column
    #[error("Value at row {row} is {actual}, column dtype is {expected}")]
    DtypeMismatch {
        row: usize,
        expected: DType,
        actual: DType,
    },

    /// Column is referenced by later operations
    #[error("Column {column} is used by later operations {dependents:?}")]
    DependencyConflict {
        column: String,
        dependents: Vec<u64>,
    },

    /// Crop window is empty or out of bounds
    #[error("Invalid row range {start}..={end} for {rows} rows")]
    InvalidRowRange { start: usize, end: usize, rows: usize },
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DuplicateName(_) => ErrorKind::DuplicateName,
            Error::InvalidName(_) => ErrorKind::SyntaxError,
            Error::UnknownColumn(_) => ErrorKind::UnknownColumn,
            Error::RowCountMismatch { .. } => ErrorKind::RowCountMismatch,
            Error::DtypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::DependencyConflict { .. } => ErrorKind::DependencyConflict,
            Error::InvalidRowRange { .. } => ErrorKind::InvalidRowRange,
        }
    }
}
