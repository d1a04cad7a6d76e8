//! CSV error types

use tabforge_core::ErrorKind;
use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur during CSV operations
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error (bad quoting, ragged rows, ...)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Header or column could not be turned into a dataset
    #[error("Core error: {0}")]
    Core(#[from] tabforge_core::Error),
}

impl CsvError {
    /// Classify this error
    ///
    /// Malformed input is reported as a syntax error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CsvError::Core(e) => e.kind(),
            CsvError::Io(_) | CsvError::Csv(_) => ErrorKind::SyntaxError,
        }
    }
}
