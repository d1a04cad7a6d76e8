//! Operation history
//!
//! An ordered log of committed derived columns and flag rules. The log is
//! append-only apart from explicit removal, and doubles as the dependency
//! index the dataset store consults before dropping a column.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tabforge_core::{Dataset, DatasetStore, DependencyLookup};
use tabforge_expr::{evaluate_rows, parse_expression};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

/// What kind of operation produced a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    DerivedColumn,
    FlagRule,
}

impl OperationKind {
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::DerivedColumn => "derived column",
            OperationKind::FlagRule => "flag rule",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable record of a committed expression
///
/// Derived columns and flag rules share this shape; for a flag rule the
/// expression is the condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationSpec {
    /// Produced column
    pub name: String,
    pub expression: String,
    /// Columns the expression read when it was applied
    pub dependencies: BTreeSet<String>,
    /// Sequence number assigned on append
    pub created_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OperationSpec {
    /// Create a spec; `created_at` is filled in by [`OperationHistory::append`]
    pub fn new<N, E>(name: N, expression: E, dependencies: BTreeSet<String>) -> Self
    where
        N: Into<String>,
        E: Into<String>,
    {
        Self {
            name: name.into(),
            expression: expression.into(),
            dependencies,
            created_at: 0,
            description: None,
        }
    }

    /// Attach a human readable description
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }
}

/// One applied operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub kind: OperationKind,
    pub spec: OperationSpec,
    pub sequence: u64,
}

impl HistoryEntry {
    /// Column this entry produced
    pub fn column_name(&self) -> &str {
        &self.spec.name
    }

    /// Check whether the entry's expression reads `column`
    pub fn depends_on(&self, column: &str) -> bool {
        self.spec.dependencies.contains(column)
    }

    /// One-line display form
    ///
    /// `Revenue = Price * Quantity` for derived columns,
    /// `HighValue: Revenue > 50` for flag rules.
    pub fn describe(&self) -> String {
        match self.kind {
            OperationKind::DerivedColumn => {
                format!("{} = {}", self.spec.name, self.spec.expression)
            }
            OperationKind::FlagRule => format!("{}: {}", self.spec.name, self.spec.expression),
        }
    }
}

/// Ordered log of applied operations
#[derive(Debug, Clone)]
pub struct OperationHistory {
    entries: Vec<HistoryEntry>,
    /// Next sequence number; never reused, even after removal
    next_sequence: u64,
}

impl Default for OperationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_sequence: 1,
        }
    }

    /// Entries in application order
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a committed operation, returning its sequence number
    pub fn append(&mut self, kind: OperationKind, mut spec: OperationSpec) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        spec.created_at = sequence;
        debug!(sequence, column = %spec.name, kind = %kind, "history entry appended");
        self.entries.push(HistoryEntry {
            kind,
            spec,
            sequence,
        });
        sequence
    }

    /// The entry that produced `column`, if any
    pub fn find_by_column(&self, column: &str) -> Option<&HistoryEntry> {
        self.entries.iter().rev().find(|e| e.spec.name == column)
    }

    /// The entry with this sequence number, if any
    pub fn get(&self, sequence: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.sequence == sequence)
    }

    /// Remove one entry together with the column it produced
    ///
    /// The column goes first; if the store refuses (a later entry still
    /// reads it) the history is left untouched.
    pub fn remove(&mut self, sequence: u64, store: &mut DatasetStore) -> EngineResult<HistoryEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.sequence == sequence)
            .ok_or(EngineError::UnknownSequence(sequence))?;

        let name = self.entries[index].spec.name.clone();
        store.remove_column(&name, &*self)?;

        let entry = self.entries.remove(index);
        info!(sequence, column = %name, "operation removed");
        Ok(entry)
    }

    /// Rebuild a dataset by re-running every entry in order on top of `base`
    pub fn replay(&self, base: &Dataset) -> EngineResult<Dataset> {
        let mut dataset = base.clone();
        for entry in &self.entries {
            let expr = parse_expression(&entry.spec.expression)?;
            let column = evaluate_rows(&expr, &dataset)?;
            dataset.insert_column(entry.spec.name.clone(), column)?;
        }
        debug!(
            entries = self.entries.len(),
            columns = dataset.column_count(),
            "history replayed"
        );
        Ok(dataset)
    }

    /// Forget every entry; sequence numbering continues
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl DependencyLookup for OperationHistory {
    fn producer_of(&self, column: &str) -> Option<u64> {
        self.find_by_column(column).map(|e| e.sequence)
    }

    fn entries_depending_on(&self, column: &str, after: Option<u64>) -> Vec<u64> {
        self.entries
            .iter()
            .filter(|e| after.map_or(true, |after| e.sequence > after))
            .filter(|e| e.depends_on(column))
            .map(|e| e.sequence)
            .collect()
    }
}
