//! Row range used for cropping

use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// An inclusive window of rows, `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowRange {
    /// First row kept (0-based)
    pub start: usize,
    /// Last row kept (0-based, inclusive)
    pub end: usize,
}

impl RowRange {
    /// Create a new row range
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Parse "START:END"
    pub fn parse(s: &str) -> Option<Self> {
        let (start, end) = s.split_once(':')?;
        Some(Self::new(start.trim().parse().ok()?, end.trim().parse().ok()?))
    }

    /// Number of rows in the window
    pub fn row_count(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// Check the window against a dataset with `rows` rows
    pub fn check(&self, rows: usize) -> Result<RangeInclusive<usize>> {
        if self.start > self.end || self.end >= rows {
            return Err(Error::InvalidRowRange {
                start: self.start,
                end: self.end,
                rows,
            });
        }
        Ok(self.start..=self.end)
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
