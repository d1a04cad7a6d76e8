//! Exchange with the AI collaborator
//!
//! Outbound, a read-only [`SuggestionContext`] describing the dataset.
//! Inbound, [`AnalysisSuggestions`] in the JSON shape the collaborator
//! answers with, turned into [`Proposal`]s that go through the same
//! validate/evaluate/commit pipeline as any other operation.

use serde::{Deserialize, Serialize};
use tabforge_core::{DType, Dataset, Value};

use crate::error::EngineResult;
use crate::history::{OperationHistory, OperationKind};

/// A proposed operation, from the UI or the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub name: String,
    pub expression: String,
    pub kind: OperationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Proposal {
    pub fn derived_column<N: Into<String>, E: Into<String>>(name: N, expression: E) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            kind: OperationKind::DerivedColumn,
            description: None,
        }
    }

    pub fn flag_rule<N: Into<String>, E: Into<String>>(name: N, condition: E) -> Self {
        Self {
            name: name.into(),
            expression: condition.into(),
            kind: OperationKind::FlagRule,
            description: None,
        }
    }
}

/// A derived column suggested by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedColumnSuggestion {
    pub name: String,
    pub formula: String,
    #[serde(default)]
    pub description: String,
}

/// A flag rule suggested by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRuleSuggestion {
    pub rule: String,
    #[serde(default)]
    pub description: String,
    /// Column name; defaults to the flag prefix followed by the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The collaborator's answer
///
/// ```json
/// {
///   "derived_columns": [{"name": "Revenue", "formula": "Price * Quantity", "description": "..."}],
///   "flag_rules": [{"rule": "Revenue > 50", "description": "..."}]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisSuggestions {
    #[serde(default)]
    pub derived_columns: Vec<DerivedColumnSuggestion>,
    #[serde(default)]
    pub flag_rules: Vec<FlagRuleSuggestion>,
}

impl AnalysisSuggestions {
    /// Parse the collaborator's JSON answer
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Turn every suggestion into a proposal, derived columns first
    ///
    /// Flag rules without a name are called `{flag_prefix}{rule}`.
    pub fn into_proposals(self, flag_prefix: &str) -> Vec<Proposal> {
        let derived = self.derived_columns.into_iter().map(|s| Proposal {
            name: s.name,
            expression: s.formula,
            kind: OperationKind::DerivedColumn,
            description: non_empty(s.description),
        });

        let flags = self.flag_rules.into_iter().map(|s| Proposal {
            name: s
                .name
                .unwrap_or_else(|| format!("{}{}", flag_prefix, s.rule)),
            expression: s.rule,
            kind: OperationKind::FlagRule,
            description: non_empty(s.description),
        });

        derived.chain(flags).collect()
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Name and dtype of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: DType,
}

/// Read-only view of the dataset handed to the collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionContext {
    pub columns: Vec<ColumnSummary>,
    pub row_count: usize,
    /// First rows, values in column order
    pub sample_rows: Vec<Vec<Value>>,
    /// Applied operations, as [`HistoryEntry::describe`](crate::HistoryEntry::describe) renders them
    pub history: Vec<String>,
}

impl SuggestionContext {
    /// Summarize a dataset and its history
    pub fn new(dataset: &Dataset, history: &OperationHistory, sample_rows: usize) -> Self {
        let columns = dataset
            .iter()
            .map(|(name, column)| ColumnSummary {
                name: name.to_string(),
                dtype: column.dtype(),
            })
            .collect();

        let sample_rows = dataset
            .head(sample_rows)
            .rows()
            .map(|row| row.into_iter().cloned().collect())
            .collect();

        Self {
            columns,
            row_count: dataset.row_count(),
            sample_rows,
            history: history.entries().iter().map(|e| e.describe()).collect(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
