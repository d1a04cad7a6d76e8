//! Live dataset store
//!
//! The store owns two datasets: the immutable original upload and the live
//! working copy that operations mutate in place. Removal of a column asks a
//! [`DependencyLookup`] (the operation history) whether a later operation
//! still reads it.

use tracing::{debug, info};

use crate::column::Column;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::range::RowRange;

/// Read access to the dependency index of applied operations
pub trait DependencyLookup {
    /// Sequence number of the operation that produced `column`, if any
    fn producer_of(&self, column: &str) -> Option<u64>;

    /// Sequence numbers of operations that read `column` and were applied
    /// strictly after `after` (all of them when `after` is `None`)
    fn entries_depending_on(&self, column: &str, after: Option<u64>) -> Vec<u64>;
}

/// Lookup for a store with no applied operations
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencies;

impl DependencyLookup for NoDependencies {
    fn producer_of(&self, _column: &str) -> Option<u64> {
        None
    }

    fn entries_depending_on(&self, _column: &str, _after: Option<u64>) -> Vec<u64> {
        Vec::new()
    }
}

/// Owner of the original and live datasets
#[derive(Debug, Clone)]
pub struct DatasetStore {
    /// The upload as received, never mutated
    original: Dataset,
    /// Working copy
    live: Dataset,
    /// Crop windows applied since the upload, in order
    crops: Vec<RowRange>,
}

impl DatasetStore {
    /// Create a store for a fresh upload
    pub fn new(original: Dataset) -> Self {
        Self {
            live: original.clone(),
            original,
            crops: Vec::new(),
        }
    }

    /// The live dataset
    pub fn live(&self) -> &Dataset {
        &self.live
    }

    /// Immutable copy of the live dataset
    pub fn snapshot(&self) -> Dataset {
        self.live.clone()
    }

    /// Immutable copy of the original upload
    pub fn original_snapshot(&self) -> Dataset {
        self.original.clone()
    }

    /// Crop windows applied so far
    pub fn crops(&self) -> &[RowRange] {
        &self.crops
    }

    /// Add a column to the live dataset
    pub fn add_column(&mut self, name: &str, column: Column) -> Result<()> {
        self.live.insert_column(name, column)?;
        debug!(column = name, rows = self.live.row_count(), "column added");
        Ok(())
    }

    /// Remove a column from the live dataset
    ///
    /// Fails with [`Error::DependencyConflict`] when an operation applied
    /// after the one that produced `name` still reads it. Columns from the
    /// original upload have no producer, so any reader blocks them.
    pub fn remove_column(&mut self, name: &str, deps: &dyn DependencyLookup) -> Result<Column> {
        if !self.live.contains(name) {
            return Err(Error::UnknownColumn(name.to_string()));
        }
        let dependents = deps.entries_depending_on(name, deps.producer_of(name));
        if !dependents.is_empty() {
            return Err(Error::DependencyConflict {
                column: name.to_string(),
                dependents,
            });
        }
        let column = self.live.remove_column(name)?;
        debug!(column = name, "column removed");
        Ok(column)
    }

    /// Keep only the rows in `range`
    ///
    /// Only rows are dropped, so existing column values stay valid and nothing
    /// is re-derived. The window is recorded for [`DatasetStore::replay_base`].
    pub fn crop(&mut self, range: RowRange) -> Result<()> {
        let cropped = self.live.crop(range)?;
        info!(
            range = %range,
            before = self.live.row_count(),
            after = cropped.row_count(),
            "dataset cropped"
        );
        self.live = cropped;
        self.crops.push(range);
        Ok(())
    }

    /// The original upload with every recorded crop re-applied
    ///
    /// This is the dataset the history replays on top of.
    pub fn replay_base(&self) -> Result<Dataset> {
        let mut base = self.original.clone();
        for range in &self.crops {
            base = base.crop(*range)?;
        }
        Ok(base)
    }

    /// Replace the live dataset wholesale (used to repair from a replay)
    pub fn replace_live(&mut self, dataset: Dataset) {
        self.live = dataset;
    }

    /// Discard everything and start from a new upload
    pub fn reset(&mut self, original: Dataset) {
        *self = Self::new(original);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    struct FixedDeps {
        producer: Option<u64>,
        readers: Vec<u64>,
    }

    impl DependencyLookup for FixedDeps {
        fn producer_of(&self, _column: &str) -> Option<u64> {
            self.producer
        }

        fn entries_depending_on(&self, _column: &str, after: Option<u64>) -> Vec<u64> {
            self.readers
                .iter()
                .copied()
                .filter(|seq| after.map_or(true, |after| *seq > after))
                .collect()
        }
    }

    fn store() -> DatasetStore {
        DatasetStore::new(
            Dataset::builder()
                .column("Price", [10.0, 20.0, 0.0])
                .column("Quantity", [2.0, 3.0, 5.0])
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_add_column_checks_row_count() {
        let mut store = store();
        let err = store
            .add_column("Bad", Column::numbers([1.0, 2.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RowCountMismatch);
        assert_eq!(store.snapshot(), store.original_snapshot());
    }

    #[test]
    fn test_add_column_rejects_duplicate() {
        let mut store = store();
        let err = store
            .add_column("Price", Column::numbers([1.0, 2.0, 3.0]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
    }

    #[test]
    fn test_remove_column_blocked_by_later_reader() {
        let mut store = store();
        store
            .add_column("Revenue", Column::numbers([20.0, 60.0, 0.0]))
            .unwrap();
        let deps = FixedDeps {
            producer: Some(1),
            readers: vec![2],
        };
        let err = store.remove_column("Revenue", &deps).unwrap_err();
        assert_eq!(
            err,
            Error::DependencyConflict {
                column: "Revenue".into(),
                dependents: vec![2],
            }
        );
        assert!(store.live().contains("Revenue"));
    }

    #[test]
    fn test_remove_column_without_readers() {
        let mut store = store();
        let removed = store.remove_column("Quantity", &NoDependencies).unwrap();
        assert_eq!(removed, Column::numbers([2.0, 3.0, 5.0]));
        assert!(!store.live().contains("Quantity"));
        // The original upload is untouched
        assert!(store.original_snapshot().contains("Quantity"));
    }

    #[test]
    fn test_remove_unknown_column() {
        let mut store = store();
        let err = store.remove_column("Nope", &NoDependencies).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownColumn);
    }

    #[test]
    fn test_crop_is_recorded_for_replay() {
        let mut store = store();
        store.crop(RowRange::new(1, 2)).unwrap();
        assert_eq!(store.live().row_count(), 2);
        assert_eq!(store.original_snapshot().row_count(), 3);
        assert_eq!(store.replay_base().unwrap(), store.snapshot());

        store.crop(RowRange::new(1, 1)).unwrap();
        assert_eq!(store.crops().len(), 2);
        assert_eq!(
            store.replay_base().unwrap().column("Price").unwrap(),
            &Column::numbers([0.0])
        );
    }

    #[test]
    fn test_invalid_crop_leaves_store_unchanged() {
        let mut store = store();
        let err = store.crop(RowRange::new(2, 5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRowRange);
        assert_eq!(store.live().row_count(), 3);
        assert!(store.crops().is_empty());
    }
}
