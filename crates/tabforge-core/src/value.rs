//! Scalar value and dtype types

use std::fmt;

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DType {
    /// 64-bit floating point numbers
    Number,
    /// TRUE/FALSE
    Boolean,
    /// Free-form text
    Text,
}

impl DType {
    /// Get the type name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            DType::Number => "number",
            DType::Boolean => "boolean",
            DType::Text => "text",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single value in a column
///
/// Numbers are always finite: [`Value::number`] and the `From` conversions turn
/// NaN and infinities into [`Value::Undefined`], so two datasets can be compared
/// with plain equality.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Numeric value
    Number(f64),
    /// Boolean value
    Boolean(bool),
    /// Text value
    Text(String),
    /// Row-level "no value" marker (division by zero, missing cell, ...)
    #[default]
    Undefined,
}

impl Value {
    /// Create a numeric value, mapping non-finite input to `Undefined`
    pub fn number(n: f64) -> Self {
        if n.is_finite() {
            Value::Number(n)
        } else {
            Value::Undefined
        }
    }

    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }

    /// The dtype of this value, `None` for `Undefined`
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Value::Number(_) => Some(DType::Number),
            Value::Boolean(_) => Some(DType::Boolean),
            Value::Text(_) => Some(DType::Text),
            Value::Undefined => None,
        }
    }

    /// Check if this is the undefined marker
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Text(s) => f.write_str(s),
            Value::Undefined => Ok(()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::number(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Undefined, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_numbers_are_undefined() {
        assert_eq!(Value::number(f64::NAN), Value::Undefined);
        assert_eq!(Value::from(f64::INFINITY), Value::Undefined);
        assert_eq!(Value::from(2.5), Value::Number(2.5));
    }

    #[test]
    fn test_dtype() {
        assert_eq!(Value::from(1).dtype(), Some(DType::Number));
        assert_eq!(Value::from("a").dtype(), Some(DType::Text));
        assert_eq!(Value::from(true).dtype(), Some(DType::Boolean));
        assert_eq!(Value::Undefined.dtype(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(60.0).to_string(), "60");
        assert_eq!(Value::from(0.5).to_string(), "0.5");
        assert_eq!(Value::from(false).to_string(), "false");
        assert_eq!(Value::Undefined.to_string(), "");
        assert_eq!(Value::from(None::<f64>), Value::Undefined);
    }
}
