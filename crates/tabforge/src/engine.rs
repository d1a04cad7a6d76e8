//! Transformation engine
//!
//! Orchestrates every change to a dataset: a proposed derived column or flag
//! rule is validated, evaluated, committed to the store and recorded in the
//! history, in that order. A failure at any stage leaves the dataset and the
//! history exactly as they were.
//!
//! # Example
//!
//! ```rust
//! use tabforge::prelude::*;
//!
//! let dataset = Dataset::builder()
//!     .column("Price", [10.0, 20.0, 0.0])
//!     .column("Quantity", [2.0, 3.0, 5.0])
//!     .build()
//!     .unwrap();
//!
//! let mut engine = TransformEngine::new(dataset);
//! assert!(engine.apply_derived_column("Revenue", "Price * Quantity").ok);
//! assert!(engine.apply_flag_rule("HighValue", "Revenue > 50").ok);
//!
//! let blocked = engine.remove_operation("Revenue");
//! assert_eq!(blocked.error_kind(), Some(ErrorKind::DependencyConflict));
//! ```

use serde::{Deserialize, Serialize};
use tabforge_core::{DType, Dataset, DatasetStore, RowRange};
use tabforge_expr::{analyze, evaluate_expr, validate, Validated};
use tracing::{error, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::history::{HistoryEntry, OperationHistory, OperationKind, OperationSpec};
use crate::result::OperationResult;
use crate::suggestion::{Proposal, SuggestionContext};

/// Options for the transformation engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Rows included in the suggestion context (default: 5)
    pub sample_rows: usize,
    /// Prefix for unnamed suggested flag rules (default: `Flag_`)
    pub flag_prefix: String,
    /// Replay and compare after every mutation, repairing on mismatch
    pub verify_replay: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sample_rows: 5,
            flag_prefix: "Flag_".to_string(),
            verify_replay: false,
        }
    }
}

/// Single-writer engine owning one dataset and its history
#[derive(Debug, Clone)]
pub struct TransformEngine {
    store: DatasetStore,
    history: OperationHistory,
    options: EngineOptions,
}

impl TransformEngine {
    /// Create an engine for an uploaded dataset with default options
    pub fn new(dataset: Dataset) -> Self {
        Self::with_options(dataset, EngineOptions::default())
    }

    /// Create an engine with custom options
    pub fn with_options(dataset: Dataset, options: EngineOptions) -> Self {
        info!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "dataset loaded"
        );
        Self {
            store: DatasetStore::new(dataset),
            history: OperationHistory::new(),
            options,
        }
    }

    /// Discard the current dataset, history and crops and start over
    pub fn load(&mut self, dataset: Dataset) {
        info!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            discarded = self.history.len(),
            "new dataset loaded"
        );
        self.store.reset(dataset);
        self.history = OperationHistory::new();
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // === Operations ===

    /// Add a column computed from `expression`
    pub fn apply_derived_column(&mut self, name: &str, expression: &str) -> OperationResult {
        let result = self.try_apply(OperationKind::DerivedColumn, name, expression, None);
        self.report("apply_derived_column", name, result)
    }

    /// Add a boolean column computed from `condition`
    pub fn apply_flag_rule(&mut self, name: &str, condition: &str) -> OperationResult {
        let result = self.try_apply(OperationKind::FlagRule, name, condition, None);
        self.report("apply_flag_rule", name, result)
    }

    /// Apply a proposal from the UI or the collaborator
    pub fn apply_proposal(&mut self, proposal: &Proposal) -> OperationResult {
        let result = self.try_apply(
            proposal.kind,
            &proposal.name,
            &proposal.expression,
            proposal.description.clone(),
        );
        self.report("apply_proposal", &proposal.name, result)
    }

    /// Remove the column `name` and the history entry that produced it
    pub fn remove_operation(&mut self, name: &str) -> OperationResult {
        let result = self.try_remove(name);
        self.report("remove_operation", name, result)
    }

    /// Keep only rows `start..=end`
    ///
    /// Cropping is not a history entry. The window is recorded so replay
    /// starts from the equally cropped original.
    pub fn crop_rows(&mut self, start: usize, end: usize) -> OperationResult {
        let range = RowRange::new(start, end);
        let result = self.store.crop(range).map_err(EngineError::from);
        if result.is_ok() {
            self.after_mutation();
        }
        let result: OperationResult = result.into();
        if let Some(error) = &result.error {
            let kind = error.kind;
            warn!(range = %range, kind = %kind, "crop rejected: {}", error.message);
        }
        result
    }

    /// Run the full pipeline, returning the committed column name
    pub(crate) fn try_apply(
        &mut self,
        kind: OperationKind,
        name: &str,
        expression: &str,
        description: Option<String>,
    ) -> EngineResult<String> {
        // Phase 1: static checks
        let Validated {
            expr,
            dependencies,
            dtype,
        } = validate(expression, self.store.live(), name)?;
        if kind == OperationKind::FlagRule && dtype != DType::Boolean {
            return Err(EngineError::NotBoolean {
                name: name.to_string(),
                dtype,
            });
        }

        // Phase 2: evaluate against the live dataset
        let column = evaluate_expr(&expr, self.store.live())?;

        // Phase 3: commit; the store re-checks name and row count
        self.store.add_column(name, column)?;

        // Phase 4: record
        let spec =
            OperationSpec::new(name, expression, dependencies).with_description(description);
        let sequence = self.history.append(kind, spec);
        info!(sequence, column = name, kind = %kind, expression, "operation applied");

        self.after_mutation();
        Ok(name.to_string())
    }

    /// Remove by produced column name, returning the removed column name
    pub(crate) fn try_remove(&mut self, name: &str) -> EngineResult<String> {
        let sequence = self
            .history
            .find_by_column(name)
            .map(|entry| entry.sequence)
            .ok_or_else(|| EngineError::UnknownOperation(name.to_string()))?;

        let entry = self.history.remove(sequence, &mut self.store)?;
        self.after_mutation();
        Ok(entry.spec.name)
    }

    /// Validate an expression against the live dataset without applying it
    pub fn check(&self, expression: &str) -> EngineResult<Validated> {
        Ok(analyze(expression, self.store.live())?)
    }

    // === Views ===

    /// Applied operations in order
    pub fn list_history(&self) -> &[HistoryEntry] {
        self.history.entries()
    }

    pub fn history(&self) -> &OperationHistory {
        &self.history
    }

    /// The live dataset
    pub fn dataset(&self) -> &Dataset {
        self.store.live()
    }

    /// Copy of the live dataset
    pub fn snapshot(&self) -> Dataset {
        self.store.snapshot()
    }

    /// Copy of the dataset as uploaded
    pub fn original_snapshot(&self) -> Dataset {
        self.store.original_snapshot()
    }

    /// Read-only context for the collaborator
    pub fn suggestion_context(&self) -> SuggestionContext {
        SuggestionContext::new(self.store.live(), &self.history, self.options.sample_rows)
    }

    // === Replay ===

    /// Rebuild the dataset from the (cropped) original by replaying history
    pub fn replay(&self) -> EngineResult<Dataset> {
        let base = self.store.replay_base()?;
        self.history.replay(&base)
    }

    /// Check that replaying the history reproduces the live dataset
    pub fn verify(&self) -> EngineResult<()> {
        let replayed = self.replay()?;
        match first_difference(self.store.live(), &replayed) {
            None => Ok(()),
            Some(difference) => {
                error!(%difference, "live dataset out of sync with history");
                Err(EngineError::ReplayMismatch(difference))
            }
        }
    }

    /// Replace the live dataset with the replayed one
    pub fn resync(&mut self) -> EngineResult<()> {
        let replayed = self.replay()?;
        self.store.replace_live(replayed);
        info!(entries = self.history.len(), "live dataset rebuilt from history");
        Ok(())
    }

    fn after_mutation(&mut self) {
        if !self.options.verify_replay || self.verify().is_ok() {
            return;
        }
        if let Err(e) = self.resync() {
            error!(error = %e, "replay repair failed");
        }
    }

    fn report<T>(&self, operation: &str, name: &str, result: EngineResult<T>) -> OperationResult
    where
        OperationResult: From<EngineResult<T>>,
    {
        if let Err(e) = &result {
            let kind = e.kind();
            warn!(operation, column = name, kind = %kind, "operation rejected: {}", e);
        }
        result.into()
    }
}

/// Describe the first disagreement between two datasets
fn first_difference(live: &Dataset, replayed: &Dataset) -> Option<String> {
    if live.row_count() != replayed.row_count() {
        return Some(format!(
            "{} live rows, {} replayed rows",
            live.row_count(),
            replayed.row_count()
        ));
    }

    let live_names: Vec<_> = live.column_names().collect();
    let replayed_names: Vec<_> = replayed.column_names().collect();
    if live_names != replayed_names {
        return Some(format!(
            "live columns {:?}, replayed columns {:?}",
            live_names, replayed_names
        ));
    }

    live.iter()
        .find(|(name, column)| replayed.column(name) != Some(*column))
        .map(|(name, _)| format!("column {} differs", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabforge_core::{Column, ErrorKind};

    fn engine() -> TransformEngine {
        TransformEngine::new(
            Dataset::builder()
                .column("Price", [10.0, 20.0, 0.0])
                .column("Quantity", [2.0, 3.0, 5.0])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_flag_rule_must_be_boolean() {
        let mut engine = engine();
        let result = engine.apply_flag_rule("Bad", "Price * 2");
        assert_eq!(result.error_kind(), Some(ErrorKind::TypeMismatch));
        assert!(engine.list_history().is_empty());
    }

    #[test]
    fn test_failed_evaluation_changes_nothing() {
        let mut engine = engine();
        let before = engine.snapshot();
        let result = engine.apply_derived_column("Nothing", "Price / 0");
        assert_eq!(result.error_kind(), Some(ErrorKind::EvaluationError));
        assert_eq!(engine.snapshot(), before);
        assert!(engine.list_history().is_empty());
    }

    #[test]
    fn test_deeply_nested_expression_is_rejected() {
        let mut engine = engine();
        let before = engine.snapshot();

        let nested = format!("{}Price{}", "(".repeat(3_000), ")".repeat(3_000));
        let result = engine.apply_derived_column("Deep", &nested);
        assert_eq!(result.error_kind(), Some(ErrorKind::SyntaxError));

        let chain = vec!["Price"; 2_000].join(" + ");
        let result = engine.apply_derived_column("Long", &chain);
        assert_eq!(result.error_kind(), Some(ErrorKind::SyntaxError));

        let result = engine.apply_flag_rule("Flag", &format!("{}Price > 0", "not ".repeat(1_000)));
        assert_eq!(result.error_kind(), Some(ErrorKind::SyntaxError));

        assert_eq!(engine.snapshot(), before);
        assert!(engine.list_history().is_empty());

        // Right at the limit still commits
        let chain = vec!["Price"; tabforge_expr::MAX_DEPTH].join(" + ");
        assert!(engine.apply_derived_column("Long", &chain).ok);
        assert!(engine.verify().is_ok());
    }

    #[test]
    fn test_remove_original_column_is_not_an_operation() {
        let mut engine = engine();
        let result = engine.remove_operation("Price");
        assert_eq!(result.error_kind(), Some(ErrorKind::UnknownColumn));
        assert!(engine.dataset().contains("Price"));
    }

    #[test]
    fn test_crop_rows() {
        let mut engine = engine();
        assert!(engine.apply_derived_column("Revenue", "Price * Quantity").ok);
        assert_eq!(engine.crop_rows(1, 2), OperationResult::done());
        assert_eq!(
            engine.dataset().column("Revenue").unwrap(),
            &Column::numbers([60.0, 0.0])
        );
        assert!(engine.verify().is_ok());

        let result = engine.crop_rows(1, 5);
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidRowRange));
        assert_eq!(engine.dataset().row_count(), 2);
    }

    #[test]
    fn test_verify_detects_and_resync_repairs() {
        let mut engine = engine();
        assert!(engine.apply_derived_column("Revenue", "Price * Quantity").ok);

        // Tamper with the live dataset behind the history's back
        let mut tampered = engine.snapshot();
        tampered.remove_column("Revenue").unwrap();
        engine.store.replace_live(tampered);

        let err = engine.verify().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReplayMismatch);

        engine.resync().unwrap();
        assert!(engine.verify().is_ok());
        assert!(engine.dataset().contains("Revenue"));
    }

    #[test]
    fn test_verify_replay_option_repairs_automatically() {
        let mut engine = TransformEngine::with_options(
            engine().original_snapshot(),
            EngineOptions {
                verify_replay: true,
                ..Default::default()
            },
        );
        assert!(engine.apply_derived_column("Revenue", "Price * Quantity").ok);

        let mut tampered = engine.snapshot();
        tampered.remove_column("Revenue").unwrap();
        engine.store.replace_live(tampered);

        // The next mutation notices and repairs before returning
        assert!(engine.apply_flag_rule("HighValue", "Price > 15").ok);
        assert!(engine.dataset().contains("Revenue"));
        assert!(engine.verify().is_ok());
    }

    #[test]
    fn test_load_discards_everything() {
        let mut engine = engine();
        assert!(engine.apply_derived_column("Revenue", "Price * Quantity").ok);
        engine.crop_rows(0, 0);

        let fresh = Dataset::builder().column("A", [1.0]).build().unwrap();
        engine.load(fresh.clone());
        assert_eq!(engine.snapshot(), fresh);
        assert!(engine.list_history().is_empty());
        assert_eq!(engine.replay().unwrap(), fresh);
    }

    #[test]
    fn test_options_from_json() {
        let options: EngineOptions = serde_json::from_str(r#"{"sample_rows": 2}"#).unwrap();
        assert_eq!(options.sample_rows, 2);
        assert_eq!(options.flag_prefix, "Flag_");
        assert!(!options.verify_replay);
    }

    #[test]
    fn test_check_does_not_apply() {
        let engine = engine();
        let validated = engine.check("Price > 1").unwrap();
        assert_eq!(validated.dtype, DType::Boolean);
        assert_eq!(engine.dataset().column_count(), 2);
    }
}
