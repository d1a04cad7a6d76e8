//! Expression error types

use tabforge_core::ErrorKind;
use thiserror::Error;

/// Result type for expression operations
pub type ExprResult<T> = std::result::Result<T, ExprError>;

/// Errors that can occur while validating or evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// Malformed expression
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Identifier does not name a column
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Proposed column name is already taken
    #[error("Column already exists: {0}")]
    DuplicateName(String),

    /// Operand types do not fit the operator
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Evaluation produced no defined value
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Result column could not be stored
    #[error(transparent)]
    Core(#[from] tabforge_core::Error),
}

impl ExprError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExprError::Syntax(_) => ErrorKind::SyntaxError,
            ExprError::UnknownColumn(_) => ErrorKind::UnknownColumn,
            ExprError::DuplicateName(_) => ErrorKind::DuplicateName,
            ExprError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            ExprError::Evaluation(_) => ErrorKind::EvaluationError,
            ExprError::Core(e) => e.kind(),
        }
    }
}
