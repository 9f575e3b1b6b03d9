//! Column table capability interface
//!
//! A `ColumnTable` is anything that can hand back a subset of its columns in
//! one bulk read. The functor engine never looks at a concrete table type;
//! it asks for the table's column levels, optionally enumerates level values,
//! and loads resolved keys.
//!
//! Two in-memory variants are provided:
//! - `FlatTable`: single-level column namespace
//! - `LeveledTable`: hierarchical namespace over filter / dataset / column

mod flat;
mod key;
mod leveled;

pub use flat::FlatTable;
pub use key::{format_levels, ColumnKey, Level};
pub use leveled::LeveledTable;

use crate::error::Result;
use crate::frame::Frame;

/// Selection over a table's column levels
///
/// A level left as `None` selects every value the table has at that level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSelection {
    pub filter: Option<String>,
    pub dataset: Option<String>,
    pub columns: Vec<String>,
}

impl ColumnSelection {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            filter: None,
            dataset: None,
            columns,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }
}

/// Tabular data source addressable by column key
pub trait ColumnTable {
    /// Hierarchy levels present in the column index; empty for flat tables
    fn column_levels(&self) -> &[Level];

    /// Distinct values present at `level`, sorted
    ///
    /// Sorted order, not insertion order: the reference dataset resolves to
    /// the first filter in this list.
    fn level_values(&self, level: Level) -> Vec<String>;

    /// Bulk read of exactly the requested columns
    fn load(&self, keys: &[ColumnKey]) -> Result<Frame>;

    /// Whether the table exposes a hierarchical column index
    fn is_leveled(&self) -> bool {
        !self.column_levels().is_empty()
    }

    /// Expand a selection into concrete keys (cartesian product over the
    /// table's levels, in level order)
    fn columns_from_selection(&self, selection: &ColumnSelection) -> Vec<ColumnKey> {
        let levels = self.column_levels();
        if levels.is_empty() {
            return selection.columns.iter().map(ColumnKey::flat).collect();
        }

        let mut keys = vec![ColumnKey::flat(String::new())];
        for &level in levels {
            let values = match level {
                Level::Filter => selection
                    .filter
                    .clone()
                    .map_or_else(|| self.level_values(level), |f| vec![f]),
                Level::Dataset => selection
                    .dataset
                    .clone()
                    .map_or_else(|| self.level_values(level), |d| vec![d]),
                Level::Column => selection.columns.clone(),
            };

            let mut expanded = Vec::with_capacity(keys.len() * values.len());
            for key in &keys {
                for value in &values {
                    let mut next = key.clone();
                    next.set(level, value);
                    expanded.push(next);
                }
            }
            keys = expanded;
        }
        keys
    }
}

impl<T: ColumnTable + ?Sized> ColumnTable for &T {
    fn column_levels(&self) -> &[Level] {
        (**self).column_levels()
    }

    fn level_values(&self, level: Level) -> Vec<String> {
        (**self).level_values(level)
    }

    fn load(&self, keys: &[ColumnKey]) -> Result<Frame> {
        (**self).load(keys)
    }

    fn columns_from_selection(&self, selection: &ColumnSelection) -> Vec<ColumnKey> {
        (**self).columns_from_selection(selection)
    }
}
