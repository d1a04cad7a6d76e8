//! Typed column storage

use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::value::{DType, Value};

/// An ordered sequence of values sharing one declared dtype
///
/// `Undefined` may appear in a column of any dtype; every other value must
/// match [`Column::dtype`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    dtype: DType,
    values: Vec<Value>,
}

impl Column {
    /// Create a column, checking every defined value against `dtype`
    pub fn new(dtype: DType, values: Vec<Value>) -> Result<Self> {
        for (row, value) in values.iter().enumerate() {
            if let Some(actual) = value.dtype() {
                if actual != dtype {
                    return Err(Error::DtypeMismatch {
                        row,
                        expected: dtype,
                        actual,
                    });
                }
            }
        }
        Ok(Self { dtype, values })
    }

    /// Create a column whose dtype is taken from the first defined value
    ///
    /// A column with no defined values is typed as text.
    pub fn from_values(values: Vec<Value>) -> Result<Self> {
        let dtype = values
            .iter()
            .find_map(Value::dtype)
            .unwrap_or(DType::Text);
        Self::new(dtype, values)
    }

    /// Numeric column from plain numbers
    pub fn numbers<I: IntoIterator<Item = f64>>(values: I) -> Self {
        Self {
            dtype: DType::Number,
            values: values.into_iter().map(Value::number).collect(),
        }
    }

    /// Boolean column from plain booleans
    pub fn booleans<I: IntoIterator<Item = bool>>(values: I) -> Self {
        Self {
            dtype: DType::Boolean,
            values: values.into_iter().map(Value::Boolean).collect(),
        }
    }

    /// Text column from strings
    pub fn texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dtype: DType::Text,
            values: values.into_iter().map(|s| Value::Text(s.into())).collect(),
        }
    }

    /// Declared dtype
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the column has no rows
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values in row order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at a row
    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    /// Number of rows holding a defined value
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_undefined()).count()
    }

    /// Copy of the rows in `rows`; the caller checks bounds
    pub(crate) fn slice(&self, rows: RangeInclusive<usize>) -> Self {
        Self {
            dtype: self.dtype,
            values: self.values[rows].to_vec(),
        }
    }

    /// Copy of the first `n` rows; the caller checks bounds
    pub(crate) fn take(&self, n: usize) -> Self {
        Self {
            dtype: self.dtype,
            values: self.values[..n].to_vec(),
        }
    }

    /// Consume the column, returning its values
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
