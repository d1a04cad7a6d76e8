//! Engine error types

use tabforge_core::{DType, ErrorKind};
use tabforge_csv::CsvError;
use tabforge_expr::ExprError;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the transformation engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Dataset store rejected the change
    #[error(transparent)]
    Core(#[from] tabforge_core::Error),

    /// Expression failed validation or evaluation
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// CSV import or export failed
    #[error(transparent)]
    Csv(#[from] CsvError),

    /// Suggestion payload is not valid JSON for the expected schema
    #[error("Invalid suggestion payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A flag rule whose condition is not boolean
    #[error("Flag rule {name} must evaluate to boolean, got {dtype}")]
    NotBoolean { name: String, dtype: DType },

    /// No history entry produced the named column
    #[error("No operation produced column {0}")]
    UnknownOperation(String),

    /// No history entry has this sequence number
    #[error("No history entry with sequence number {0}")]
    UnknownSequence(u64),

    /// Replaying the history disagrees with the live dataset
    #[error("Replay does not reproduce the live dataset: {0}")]
    ReplayMismatch(String),
}

impl EngineError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(e) => e.kind(),
            EngineError::Expr(e) => e.kind(),
            EngineError::Csv(e) => e.kind(),
            EngineError::Json(_) => ErrorKind::SyntaxError,
            EngineError::NotBoolean { .. } => ErrorKind::TypeMismatch,
            EngineError::UnknownOperation(_) | EngineError::UnknownSequence(_) => {
                ErrorKind::UnknownColumn
            }
            EngineError::ReplayMismatch(_) => ErrorKind::ReplayMismatch,
        }
    }
}
