//! # tabforge-expr
//!
//! Expression language for tabforge.
//!
//! This crate provides:
//! - Expression parsing (text → AST)
//! - Static validation against a dataset schema (names, columns, types)
//! - Vectorized evaluation (AST → one value per row)
//!
//! ## Example
//!
//! ```rust
//! use tabforge_core::{Dataset, DType};
//! use tabforge_expr::{evaluate, validate};
//!
//! let dataset = Dataset::builder()
//!     .column("Price", [10.0, 20.0, 0.0])
//!     .column("Quantity", [2.0, 3.0, 5.0])
//!     .build()
//!     .unwrap();
//!
//! let checked = validate("Price * Quantity > 50", &dataset, "HighValue").unwrap();
//! assert_eq!(checked.dtype, DType::Boolean);
//!
//! let flags = evaluate("Price * Quantity > 50", &dataset).unwrap();
//! assert_eq!(flags.len(), 3);
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod validator;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use error::{ExprError, ExprResult};
pub use evaluator::{evaluate, evaluate_expr, evaluate_rows};
pub use parser::{parse_expression, MAX_DEPTH};
pub use validator::{analyze, dependencies, infer_type, validate, Validated};
