//! # tabforge-core
//!
//! Core data structures for the tabforge transformation engine.
//!
//! This crate provides the fundamental types used throughout tabforge:
//! - [`Value`] and [`DType`] - Scalar values and column types
//! - [`Column`] - A typed column of values
//! - [`Dataset`] - Ordered, named, equal-length columns
//! - [`DatasetStore`] - The original upload plus the live working copy
//! - [`ErrorKind`] - The error taxonomy shared by every tabforge crate
//!
//! ## Example
//!
//! ```rust
//! use tabforge_core::{Column, Dataset, DatasetStore};
//!
//! let dataset = Dataset::builder()
//!     .column("Price", [10.0, 20.0, 0.0])
//!     .column("Quantity", [2.0, 3.0, 5.0])
//!     .build()
//!     .unwrap();
//!
//! let mut store = DatasetStore::new(dataset);
//! store
//!     .add_column("Discount", Column::numbers([1.0, 2.0, 0.0]))
//!     .unwrap();
//! assert_eq!(store.live().column_count(), 3);
//! ```

pub mod column;
pub mod dataset;
pub mod error;
pub mod range;
pub mod store;
pub mod value;

// Re-exports for convenience
pub use column::Column;
pub use dataset::{Dataset, DatasetBuilder};
pub use error::{Error, ErrorKind, Result};
pub use range::RowRange;
pub use store::{DatasetStore, DependencyLookup, NoDependencies};
pub use value::{DType, Value};
