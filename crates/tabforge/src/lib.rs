//! # tabforge
//!
//! Validated, replayable column transformations over tabular datasets.
//!
//! tabforge turns a proposed derived column or flag rule (from a user or an
//! AI collaborator) into a new column, guarding the dataset with a restricted
//! expression language, static validation and an operation history that can
//! always be replayed from the original upload.
//!
//! ## Features
//!
//! - Restricted expression language: arithmetic, comparison, `and`/`or`/`not`
//! - Static validation of names, columns and types before anything runs
//! - Vectorized evaluation with per-row undefined values
//! - Operation history with dependency-protected removal and replay
//! - Row cropping, CSV import/export, collaborator context and suggestions
//!
//! ## Example
//!
//! ```rust
//! use tabforge::prelude::*;
//!
//! let csv = "Price,Quantity\n10,2\n20,3\n0,5\n";
//! let dataset = Dataset::from_csv_str(csv).unwrap();
//!
//! let mut engine = TransformEngine::new(dataset);
//! engine.apply_derived_column("Revenue", "Price * Quantity");
//! engine.apply_flag_rule("HighValue", "Revenue > 50");
//!
//! assert_eq!(
//!     engine.dataset().to_csv_string().unwrap(),
//!     "Price,Quantity,Revenue,HighValue\n10,2,20,false\n20,3,60,true\n0,5,0,false\n"
//! );
//! ```

pub mod engine;
pub mod error;
pub mod history;
pub mod prelude;
pub mod result;
pub mod suggestion;

pub use engine::{EngineOptions, TransformEngine};
pub use error::{EngineError, EngineResult};
pub use history::{HistoryEntry, OperationHistory, OperationKind, OperationSpec};
pub use result::{OperationError, OperationResult};
pub use suggestion::{
    AnalysisSuggestions, ColumnSummary, DerivedColumnSuggestion, FlagRuleSuggestion, Proposal,
    SuggestionContext,
};

// Re-export core types
pub use tabforge_core::{
    Column, DType, Dataset, DatasetBuilder, DatasetStore, DependencyLookup, ErrorKind, RowRange,
    Value,
};

// Re-export expression types
pub use tabforge_expr::{
    analyze, evaluate, parse_expression, validate, BinaryOperator, Expr, ExprError, UnaryOperator,
    Validated, MAX_DEPTH,
};

// Re-export I/O types
pub use tabforge_csv::{
    CsvError, CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter, LineTerminator,
};

use std::path::Path;

/// Extension trait for Dataset to add CSV I/O
pub trait DatasetExt: Sized {
    /// Open a dataset from a CSV file
    fn open_csv<P: AsRef<Path>>(path: P) -> EngineResult<Self>;

    /// Parse a dataset from CSV text
    fn from_csv_str(text: &str) -> EngineResult<Self>;

    /// Save the dataset to a CSV file
    fn save_csv<P: AsRef<Path>>(&self, path: P) -> EngineResult<()>;

    /// Render the dataset as CSV text
    fn to_csv_string(&self) -> EngineResult<String>;
}

impl DatasetExt for Dataset {
    fn open_csv<P: AsRef<Path>>(path: P) -> EngineResult<Dataset> {
        Ok(CsvReader::read_file(path, &CsvReadOptions::default())?)
    }

    fn from_csv_str(text: &str) -> EngineResult<Dataset> {
        Ok(CsvReader::read_str(text, &CsvReadOptions::default())?)
    }

    fn save_csv<P: AsRef<Path>>(&self, path: P) -> EngineResult<()> {
        Ok(CsvWriter::write_file(self, path, &CsvWriteOptions::default())?)
    }

    fn to_csv_string(&self) -> EngineResult<String> {
        Ok(CsvWriter::write_string(self, &CsvWriteOptions::default())?)
    }
}
