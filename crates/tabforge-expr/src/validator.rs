//! Schema validation for expressions
//!
//! Static checks only: the proposed name, the syntax, the referenced columns
//! and the operand types. Nothing here looks at row values, so the cost does
//! not depend on the size of the dataset.

use std::collections::BTreeSet;

use tabforge_core::{DType, Dataset};

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{ExprError, ExprResult};
use crate::parser::parse_expression;

/// An expression that passed every static check
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    /// Parsed expression
    pub expr: Expr,
    /// Columns the expression reads
    pub dependencies: BTreeSet<String>,
    /// Static result dtype
    pub dtype: DType,
}

/// Validate an expression that will produce the column `proposed_name`
///
/// Checks run in a fixed order and the first failure wins: blank name,
/// duplicate name, syntax, unknown columns (first one in source order),
/// operand types.
pub fn validate(expression: &str, dataset: &Dataset, proposed_name: &str) -> ExprResult<Validated> {
    if proposed_name.trim().is_empty() {
        return Err(ExprError::Syntax("Column name must not be blank".into()));
    }
    if dataset.contains(proposed_name) {
        return Err(ExprError::DuplicateName(proposed_name.to_string()));
    }
    analyze(expression, dataset)
}

/// Parse an expression and check it against the dataset schema
///
/// Same as [`validate`] without the name checks.
pub fn analyze(expression: &str, dataset: &Dataset) -> ExprResult<Validated> {
    let expr = parse_expression(expression)?;

    let mut unknown = None;
    expr.for_each_column(&mut |name| {
        if unknown.is_none() && !dataset.contains(name) {
            unknown = Some(name);
        }
    });
    if let Some(name) = unknown {
        return Err(ExprError::UnknownColumn(name.to_string()));
    }

    let dtype = infer_type(&expr, dataset)?;
    let dependencies = dependencies(&expr);

    Ok(Validated {
        expr,
        dependencies,
        dtype,
    })
}

/// Every column name the expression reads
pub fn dependencies(expr: &Expr) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();
    expr.for_each_column(&mut |name| {
        deps.insert(name.to_string());
    });
    deps
}

/// Static result dtype of an expression
pub fn infer_type(expr: &Expr, dataset: &Dataset) -> ExprResult<DType> {
    match expr {
        Expr::Number(_) => Ok(DType::Number),
        Expr::Text(_) => Ok(DType::Text),
        Expr::Boolean(_) => Ok(DType::Boolean),

        Expr::Column(name) => dataset
            .dtype(name)
            .ok_or_else(|| ExprError::UnknownColumn(name.clone())),

        Expr::UnaryOp { op, operand } => {
            let operand = infer_type(operand, dataset)?;
            match (op, operand) {
                (UnaryOperator::Negate, DType::Number | DType::Text) => Ok(DType::Number),
                (UnaryOperator::Not, DType::Boolean) => Ok(DType::Boolean),
                (UnaryOperator::Negate, actual) => Err(ExprError::TypeMismatch(format!(
                    "cannot negate a {} operand",
                    actual
                ))),
                (UnaryOperator::Not, actual) => Err(ExprError::TypeMismatch(format!(
                    "'not' needs a boolean operand, got {}",
                    actual
                ))),
            }
        }

        Expr::BinaryOp { op, left, right } => {
            let left = infer_type(left, dataset)?;
            let right = infer_type(right, dataset)?;
            binary_type(*op, left, right)
        }
    }
}

fn binary_type(op: BinaryOperator, left: DType, right: DType) -> ExprResult<DType> {
    use DType::*;

    let result = if op.is_arithmetic() {
        // Text operands are coerced row by row during evaluation
        matches!(left, Number | Text) && matches!(right, Number | Text)
    } else if op.is_comparison() {
        match (left, right) {
            (Number, Number) | (Text, Text) => true,
            (Boolean, Boolean) => op.is_equality(),
            _ => false,
        }
    } else {
        left == Boolean && right == Boolean
    };

    if !result {
        return Err(ExprError::TypeMismatch(format!(
            "cannot apply '{}' to {} and {}",
            op, left, right
        )));
    }

    Ok(if op.is_arithmetic() { Number } else { Boolean })
}
