//! Vectorized expression evaluator
//!
//! Every node evaluates to an [`Operand`]: either a scalar (from a literal)
//! that is broadcast on demand, or a whole column. Column references borrow
//! the dataset's values, so a plain `Price` or `Price * 2` never copies more
//! than the result.

use std::borrow::Cow;
use std::cmp::Ordering;

use tabforge_core::{Column, Dataset, Value};
use tracing::trace;

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{ExprError, ExprResult};
use crate::parser::parse_expression;
use crate::validator::infer_type;

/// Parse and evaluate an expression against a dataset
///
/// # Example
/// ```rust
/// use tabforge_core::{Dataset, Value};
/// use tabforge_expr::evaluate;
///
/// let dataset = Dataset::builder()
///     .column("Price", [10.0, 20.0, 0.0])
///     .column("Quantity", [2.0, 3.0, 5.0])
///     .build()
///     .unwrap();
///
/// let revenue = evaluate("Price * Quantity", &dataset).unwrap();
/// assert_eq!(revenue.values(), &[Value::from(20), Value::from(60), Value::from(0)]);
/// ```
pub fn evaluate(expression: &str, dataset: &Dataset) -> ExprResult<Column> {
    let expr = parse_expression(expression)?;
    evaluate_expr(&expr, dataset)
}

/// Evaluate a parsed expression against a dataset
///
/// The result has exactly one value per row. Division by zero and other
/// undefined arithmetic yield [`Value::Undefined`] for that row; a result
/// with no defined value at all is an evaluation error.
pub fn evaluate_expr(expr: &Expr, dataset: &Dataset) -> ExprResult<Column> {
    let column = evaluate_rows(expr, dataset)?;

    if !column.is_empty() && column.defined_count() == 0 {
        return Err(ExprError::Evaluation(
            "expression is undefined for every row".into(),
        ));
    }

    Ok(column)
}

/// Evaluate a parsed expression without rejecting an all-undefined result
///
/// Replay uses this: an entry admitted on the full dataset may be undefined
/// on every row that survived a later crop.
pub fn evaluate_rows(expr: &Expr, dataset: &Dataset) -> ExprResult<Column> {
    let dtype = infer_type(expr, dataset)?;
    let rows = dataset.row_count();

    let values = match evaluate_node(expr, dataset)? {
        Operand::Scalar(value) => vec![value; rows],
        Operand::Column(values) => values.into_owned(),
    };

    trace!(rows, dtype = %dtype, "expression evaluated");
    Ok(Column::new(dtype, values)?)
}

/// Intermediate evaluation result
#[derive(Debug, Clone)]
enum Operand<'a> {
    /// Same value on every row
    Scalar(Value),
    /// One value per row
    Column(Cow<'a, [Value]>),
}

impl Operand<'_> {
    fn get(&self, row: usize) -> &Value {
        match self {
            Operand::Scalar(value) => value,
            Operand::Column(values) => &values[row],
        }
    }
}

fn evaluate_node<'a>(expr: &Expr, dataset: &'a Dataset) -> ExprResult<Operand<'a>> {
    match expr {
        // === Literals ===
        Expr::Number(n) => Ok(Operand::Scalar(Value::number(*n))),
        Expr::Text(s) => Ok(Operand::Scalar(Value::Text(s.clone()))),
        Expr::Boolean(b) => Ok(Operand::Scalar(Value::Boolean(*b))),

        // === References ===
        Expr::Column(name) => dataset
            .column(name)
            .map(|column| Operand::Column(Cow::Borrowed(column.values())))
            .ok_or_else(|| ExprError::UnknownColumn(name.clone())),

        // === Operators ===
        Expr::UnaryOp { op, operand } => {
            let operand = evaluate_node(operand, dataset)?;
            map_rows(operand, |value, row| evaluate_unary_op(*op, value, row))
        }

        Expr::BinaryOp { op, left, right } => {
            let left = evaluate_node(left, dataset)?;
            let right = evaluate_node(right, dataset)?;
            zip_rows(&left, &right, dataset.row_count(), |l, r, row| {
                evaluate_binary_op(*op, l, r, row)
            })
        }
    }
}

fn map_rows<'a, F>(operand: Operand<'_>, f: F) -> ExprResult<Operand<'a>>
where
    F: Fn(&Value, Option<usize>) -> ExprResult<Value>,
{
    match operand {
        Operand::Scalar(value) => Ok(Operand::Scalar(f(&value, None)?)),
        Operand::Column(values) => {
            let values = values
                .iter()
                .enumerate()
                .map(|(row, value)| f(value, Some(row)))
                .collect::<ExprResult<Vec<_>>>()?;
            Ok(Operand::Column(Cow::Owned(values)))
        }
    }
}

fn zip_rows<'a, F>(left: &Operand<'_>, right: &Operand<'_>, rows: usize, f: F) -> ExprResult<Operand<'a>>
where
    F: Fn(&Value, &Value, Option<usize>) -> ExprResult<Value>,
{
    if let (Operand::Scalar(l), Operand::Scalar(r)) = (left, right) {
        return Ok(Operand::Scalar(f(l, r, None)?));
    }

    let values = (0..rows)
        .map(|row| f(left.get(row), right.get(row), Some(row)))
        .collect::<ExprResult<Vec<_>>>()?;
    Ok(Operand::Column(Cow::Owned(values)))
}

/// Evaluate a unary operator on one row
fn evaluate_unary_op(op: UnaryOperator, value: &Value, row: Option<usize>) -> ExprResult<Value> {
    if value.is_undefined() {
        return Ok(Value::Undefined);
    }

    match op {
        UnaryOperator::Negate => Ok(Value::number(-to_number(value, row)?)),
        UnaryOperator::Not => match value {
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(mismatch("not", other, row)),
        },
    }
}

/// Evaluate a binary operator on one row
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    row: Option<usize>,
) -> ExprResult<Value> {
    // Undefined propagates through every operator
    if left.is_undefined() || right.is_undefined() {
        return Ok(Value::Undefined);
    }

    match op {
        // === Arithmetic ===
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide => {
            let l = to_number(left, row)?;
            let r = to_number(right, row)?;
            let result = match op {
                BinaryOperator::Add => l + r,
                BinaryOperator::Subtract => l - r,
                BinaryOperator::Multiply => l * r,
                _ if r == 0.0 => return Ok(Value::Undefined),
                _ => l / r,
            };
            // Overflow to infinity becomes Undefined
            Ok(Value::number(result))
        }

        // === Comparison ===
        BinaryOperator::Equal
        | BinaryOperator::NotEqual
        | BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => {
            let ordering = compare_values(left, right)
                .filter(|_| op.is_equality() || !matches!(left, Value::Boolean(_)))
                .ok_or_else(|| mismatch(op.symbol(), left, row))?;
            let result = match op {
                BinaryOperator::Equal => ordering == Ordering::Equal,
                BinaryOperator::NotEqual => ordering != Ordering::Equal,
                BinaryOperator::LessThan => ordering == Ordering::Less,
                BinaryOperator::LessEqual => ordering != Ordering::Greater,
                BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Boolean(result))
        }

        // === Boolean ===
        BinaryOperator::And | BinaryOperator::Or => match (left, right) {
            (Value::Boolean(l), Value::Boolean(r)) => Ok(Value::Boolean(if op == BinaryOperator::And {
                *l && *r
            } else {
                *l || *r
            })),
            (Value::Boolean(_), other) | (other, _) => Err(mismatch(op.symbol(), other, row)),
        },
    }
}

/// Order two defined values of the same dtype
///
/// Text compares case-sensitively by Unicode scalar values.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        (Value::Boolean(l), Value::Boolean(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Numeric view of a defined value, coercing text
fn to_number(value: &Value, row: Option<usize>) -> ExprResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| {
                ExprError::TypeMismatch(format!(
                    "cannot convert {:?}{} to a number",
                    s,
                    at_row(row)
                ))
            }),
        other => Err(mismatch("arithmetic", other, row)),
    }
}

fn mismatch(op: &str, value: &Value, row: Option<usize>) -> ExprError {
    let dtype = value.dtype().map_or("undefined", |dtype| dtype.name());
    ExprError::TypeMismatch(format!(
        "'{}' cannot take a {} operand{}",
        op,
        dtype,
        at_row(row)
    ))
}

fn at_row(row: Option<usize>) -> String {
    row.map(|row| format!(" at row {}", row)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tabforge_core::{DType, ErrorKind};

    fn dataset() -> Dataset {
        Dataset::builder()
            .column("Price", [10.0, 20.0, 0.0])
            .column("Quantity", [2.0, 3.0, 5.0])
            .typed_column("Amount", Column::texts([" 1.5", "2", "x"]))
            .typed_column("Code", Column::texts(["7", "8", "9"]))
            .typed_column("Region", Column::texts(["North", "south", "North"]))
            .typed_column("Refund", Column::booleans([false, true, false]))
            .build()
            .unwrap()
    }

    fn eval(expression: &str) -> ExprResult<Column> {
        evaluate(expression, &dataset())
    }

    #[test]
    fn test_evaluate_arithmetic() {
        let revenue = eval("Price * Quantity").unwrap();
        assert_eq!(revenue, Column::numbers([20.0, 60.0, 0.0]));

        let shifted = eval("(Price + 1) / 2 - -1").unwrap();
        assert_eq!(shifted, Column::numbers([6.5, 11.5, 1.5]));
    }

    #[test]
    fn test_evaluate_comparison() {
        let flag = eval("Price * Quantity > 50").unwrap();
        assert_eq!(flag, Column::booleans([false, true, false]));

        assert_eq!(
            eval("Price <= 10").unwrap(),
            Column::booleans([true, false, true])
        );
        assert_eq!(
            eval("Price != 20").unwrap(),
            Column::booleans([true, false, true])
        );
    }

    #[test]
    fn test_text_comparison_is_case_sensitive() {
        assert_eq!(
            eval("Region == 'North'").unwrap(),
            Column::booleans([true, false, true])
        );
        assert_eq!(
            eval("Region < 'a'").unwrap(),
            Column::booleans([true, false, true])
        );
    }

    #[test]
    fn test_evaluate_boolean_logic() {
        assert_eq!(
            eval("Price > 5 and not Refund").unwrap(),
            Column::booleans([true, false, false])
        );
        assert_eq!(
            eval("Refund | Price == 0").unwrap(),
            Column::booleans([false, true, true])
        );
        assert_eq!(
            eval("Refund == false").unwrap(),
            Column::booleans([true, false, true])
        );
    }

    #[test]
    fn test_division_by_zero_is_undefined() {
        let ratio = eval("Quantity / Price").unwrap();
        assert_eq!(
            ratio.values(),
            &[Value::from(0.2), Value::from(0.15), Value::Undefined]
        );
        assert_eq!(ratio.dtype(), DType::Number);
    }

    #[test]
    fn test_undefined_propagates() {
        let flag = eval("Quantity / Price > 0.1").unwrap();
        assert_eq!(
            flag.values(),
            &[Value::from(true), Value::from(true), Value::Undefined]
        );
    }

    #[test]
    fn test_all_undefined_is_evaluation_error() {
        let err = eval("Price / 0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EvaluationError);
    }

    #[test]
    fn test_evaluate_rows_keeps_all_undefined() {
        let expr = parse_expression("Price / 0").unwrap();
        let column = evaluate_rows(&expr, &dataset()).unwrap();
        assert_eq!(column.defined_count(), 0);
        assert_eq!(column.len(), 3);
    }

    #[test]
    fn test_empty_dataset_yields_empty_column() {
        let empty = dataset().head(0);
        let column = evaluate("Price / 0", &empty).unwrap();
        assert!(column.is_empty());
        assert_eq!(column.dtype(), DType::Number);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(eval("Code * 2").unwrap(), Column::numbers([14.0, 16.0, 18.0]));

        let err = eval("Amount + 1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("row 2"), "{}", err);
    }

    #[test]
    fn test_scalar_is_broadcast() {
        assert_eq!(eval("1 + 1").unwrap(), Column::numbers([2.0, 2.0, 2.0]));
        assert_eq!(
            eval("'x'").unwrap(),
            Column::texts(["x", "x", "x"])
        );
    }

    #[test]
    fn test_identity_copies_column() {
        assert_eq!(eval("Refund").unwrap(), Column::booleans([false, true, false]));
    }

    #[test]
    fn test_static_errors_surface() {
        assert_eq!(eval("Nope * 2").unwrap_err().kind(), ErrorKind::UnknownColumn);
        assert_eq!(eval("Refund * 2").unwrap_err().kind(), ErrorKind::TypeMismatch);
        assert_eq!(eval("Price *").unwrap_err().kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_overflow_is_undefined() {
        let dataset = Dataset::builder()
            .column("Big", [1e308, 1.0])
            .build()
            .unwrap();
        let column = evaluate("Big * 10", &dataset).unwrap();
        assert_eq!(column.values(), &[Value::Undefined, Value::from(10)]);
    }

    proptest! {
        #[test]
        fn prop_evaluation_is_deterministic(
            prices in proptest::collection::vec(-1e6f64..1e6, 1..20),
            factor in -100.0f64..100.0,
        ) {
            let quantities: Vec<f64> = prices.iter().map(|p| p * factor).collect();
            let dataset = Dataset::builder()
                .column("Price", prices.clone())
                .column("Quantity", quantities)
                .build()
                .unwrap();

            let expression = format!("Price * Quantity - {} > 0 or Price == 0", factor.abs());
            let first = evaluate(&expression, &dataset);
            let second = evaluate(&expression, &dataset);
            prop_assert_eq!(&first, &second);
            if let Ok(column) = first {
                prop_assert_eq!(column.len(), prices.len());
            }
        }
    }
}
