//! Structured operation outcome
//!
//! Every public engine operation reports through [`OperationResult`]; errors
//! never cross the engine boundary as panics or `Err` values.

use serde::Serialize;
use tabforge_core::ErrorKind;

use crate::error::{EngineError, EngineResult};

/// Failure half of an [`OperationResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of one engine operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub ok: bool,
    /// Column that was created or removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl OperationResult {
    /// Successful operation on a column
    pub fn success<S: Into<String>>(column_name: S) -> Self {
        Self {
            ok: true,
            column_name: Some(column_name.into()),
            error: None,
        }
    }

    /// Successful operation that did not touch a single column (a crop)
    pub fn done() -> Self {
        Self {
            ok: true,
            column_name: None,
            error: None,
        }
    }

    /// Failed operation
    pub fn failure(error: &EngineError) -> Self {
        Self {
            ok: false,
            column_name: None,
            error: Some(OperationError {
                kind: error.kind(),
                message: error.to_string(),
            }),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Kind of the failure, `None` on success
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

impl From<EngineResult<String>> for OperationResult {
    fn from(result: EngineResult<String>) -> Self {
        match result {
            Ok(name) => Self::success(name),
            Err(e) => Self::failure(&e),
        }
    }
}

impl From<EngineResult<()>> for OperationResult {
    fn from(result: EngineResult<()>) -> Self {
        match result {
            Ok(()) => Self::done(),
            Err(e) => Self::failure(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabforge_expr::ExprError;

    #[test]
    fn test_failure_serializes_kind() {
        let result = OperationResult::failure(&EngineError::Expr(ExprError::UnknownColumn(
            "Nope".into(),
        )));
        assert!(!result.is_ok());
        assert_eq!(result.error_kind(), Some(ErrorKind::UnknownColumn));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["kind"], "UNKNOWN_COLUMN");
        assert!(json.get("column_name").is_none());
    }

    #[test]
    fn test_success_from_result() {
        let result = OperationResult::from(EngineResult::Ok("Revenue".to_string()));
        assert_eq!(result, OperationResult::success("Revenue"));
        assert_eq!(result.error_kind(), None);
    }
}
