//! Dataset type

use ahash::AHashMap;

use crate::column::Column;
use crate::error::{Error, Result};
use crate::range::RowRange;
use crate::value::{DType, Value};

/// An ordered, named collection of equal-length typed columns
///
/// Column names are unique and case-sensitive. Column order is insertion
/// order. The row count is stored explicitly so a dataset with no columns
/// still knows how many rows it has.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    /// Column names in order
    order: Vec<String>,
    /// Column storage keyed by name
    columns: AHashMap<String, Column>,
    /// Number of rows shared by every column
    row_count: usize,
}

impl Dataset {
    /// Create an empty dataset with a fixed number of rows
    pub fn new(row_count: usize) -> Self {
        Self {
            order: Vec::new(),
            columns: AHashMap::new(),
            row_count,
        }
    }

    /// Start building a dataset column by column
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::default()
    }

    /// Build a dataset from named columns
    ///
    /// The row count is taken from the first column (zero if there is none).
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut iter = columns.into_iter().peekable();
        let row_count = iter.peek().map_or(0, |(_, column)| column.len());
        let mut dataset = Self::new(row_count);
        for (name, column) in iter {
            dataset.insert_column(name, column)?;
        }
        Ok(dataset)
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.order.len()
    }

    /// Check if a column exists
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Get a column's dtype by name
    pub fn dtype(&self, name: &str) -> Option<DType> {
        self.columns.get(name).map(Column::dtype)
    }

    /// Column names in order
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    /// Iterate over `(name, column)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.order
            .iter()
            .filter_map(|name| self.columns.get(name).map(|c| (name.as_str(), c)))
    }

    /// Values of one row, in column order
    pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
        if row >= self.row_count {
            return None;
        }
        Some(self.iter().filter_map(|(_, c)| c.get(row)).collect())
    }

    /// Iterate over the rows, each one in column order
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count).filter_map(move |row| self.row(row))
    }

    /// Append a column
    pub fn insert_column<S: Into<String>>(&mut self, name: S, column: Column) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidName(name));
        }
        if self.columns.contains_key(&name) {
            return Err(Error::DuplicateName(name));
        }
        if column.len() != self.row_count {
            return Err(Error::RowCountMismatch {
                name,
                expected: self.row_count,
                actual: column.len(),
            });
        }
        self.order.push(name.clone());
        self.columns.insert(name, column);
        Ok(())
    }

    /// Remove a column, returning it
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let column = self
            .columns
            .remove(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        self.order.retain(|n| n != name);
        Ok(column)
    }

    /// Copy of the dataset restricted to the rows in `range`
    pub fn crop(&self, range: RowRange) -> Result<Self> {
        let rows = range.check(self.row_count)?;
        let mut cropped = Self::new(range.row_count());
        for (name, column) in self.iter() {
            cropped.insert_column(name, column.slice(rows.clone()))?;
        }
        Ok(cropped)
    }

    /// Copy of the first `n` rows (fewer if the dataset is shorter)
    pub fn head(&self, n: usize) -> Self {
        let take = n.min(self.row_count);
        let mut head = Self::new(take);
        for (name, column) in self.iter() {
            head.order.push(name.to_string());
            head.columns.insert(name.to_string(), column.take(take));
        }
        head
    }
}

/// Incremental builder for [`Dataset`]
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    columns: Vec<(String, ColumnSource)>,
}

#[derive(Debug)]
enum ColumnSource {
    Values(Vec<Value>),
    Typed(Column),
}

impl DatasetBuilder {
    /// Add a column built from anything convertible to values
    ///
    /// The dtype is inferred when the dataset is built.
    pub fn column<S, I, V>(mut self, name: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.columns.push((name.into(), ColumnSource::Values(values)));
        self
    }

    /// Add a prebuilt column
    pub fn typed_column<S: Into<String>>(mut self, name: S, column: Column) -> Self {
        self.columns.push((name.into(), ColumnSource::Typed(column)));
        self
    }

    /// Finish, checking dtypes, names and row counts
    pub fn build(self) -> Result<Dataset> {
        let columns = self
            .columns
            .into_iter()
            .map(|(name, source)| {
                let column = match source {
                    ColumnSource::Values(values) => Column::from_values(values)?,
                    ColumnSource::Typed(column) => column,
                };
                Ok((name, column))
            })
            .collect::<Result<Vec<_>>>()?;
        Dataset::from_columns(columns)
    }
}
