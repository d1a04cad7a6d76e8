//! Prelude module - common imports for tabforge users
//!
//! ```rust
//! use tabforge::prelude::*;
//! ```

pub use crate::{
    // Suggestion types
    AnalysisSuggestions,
    // Core types
    Column,
    DType,
    Dataset,
    // Extension traits
    DatasetExt,
    // Error types
    EngineError,
    EngineOptions,
    EngineResult,
    ErrorKind,
    // History types
    HistoryEntry,
    OperationKind,
    // Results
    OperationResult,
    Proposal,
    RowRange,
    SuggestionContext,
    // Main types
    TransformEngine,
    Value,
};
