//! Hierarchical in-memory table (filter / dataset / column)

use super::{format_levels, ColumnKey, ColumnTable, Level};
use crate::column::{ColumnValues, RowIndex};
use crate::error::{CoreError, Result};
use crate::frame::Frame;
use std::collections::BTreeSet;

/// Table whose column index has several levels
#[derive(Debug, Clone)]
pub struct LeveledTable {
    levels: Vec<Level>,
    index: RowIndex,
    keys: Vec<ColumnKey>,
    values: Vec<ColumnValues>,
}

impl LeveledTable {
    /// Create an empty table with the given column levels
    pub fn new(levels: Vec<Level>, index: impl IntoIterator<Item = i64>) -> Self {
        Self {
            levels,
            index: index.into_iter().collect(),
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Empty table over the canonical `(filter, dataset, column)` levels
    pub fn canonical(rows: usize) -> Self {
        Self::new(Level::CANONICAL.to_vec(), 0..rows as i64)
    }

    pub fn with_column(mut self, key: ColumnKey, values: impl Into<ColumnValues>) -> Result<Self> {
        self.insert(key, values)?;
        Ok(self)
    }

    pub fn insert(&mut self, key: ColumnKey, values: impl Into<ColumnValues>) -> Result<()> {
        let values = values.into();
        if key.levels() != self.canonical_levels() {
            return Err(CoreError::InvalidKey {
                key: key.to_string(),
                message: format!("table levels are {}", format_levels(&self.levels)),
            });
        }
        if self.keys.contains(&key) {
            return Err(CoreError::DuplicateColumn(key.to_string()));
        }
        if values.len() != self.index.len() {
            return Err(CoreError::LengthMismatch {
                column: key.to_string(),
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        self.keys.push(key);
        self.values.push(values);
        Ok(())
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn keys(&self) -> &[ColumnKey] {
        &self.keys
    }

    fn canonical_levels(&self) -> Vec<Level> {
        Level::CANONICAL
            .into_iter()
            .filter(|l| *l == Level::Column || self.levels.contains(l))
            .collect()
    }
}

impl ColumnTable for LeveledTable {
    fn column_levels(&self) -> &[Level] {
        &self.levels
    }

    // Sorted through a BTreeSet so the first filter is the alphabetically first one
    fn level_values(&self, level: Level) -> Vec<String> {
        self.keys
            .iter()
            .filter_map(|k| k.get(level))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn load(&self, keys: &[ColumnKey]) -> Result<Frame> {
        let mut frame = Frame::new(self.index.clone());
        for key in keys {
            let pos = self
                .keys
                .iter()
                .position(|k| k == key)
                .ok_or_else(|| CoreError::ColumnNotFound(key.to_string()))?;
            frame.push(key.clone(), self.values[pos].clone())?;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnSelection;

    fn two_band_table() -> LeveledTable {
        LeveledTable::canonical(2)
            .with_column(ColumnKey::leveled("r", "meas", "flux"), vec![1.0, 2.0])
            .unwrap()
            .with_column(ColumnKey::leveled("g", "meas", "flux"), vec![3.0, 4.0])
            .unwrap()
            .with_column(ColumnKey::leveled("g", "ref", "coord_ra"), vec![0.1, 0.2])
            .unwrap()
    }

    #[test]
    fn test_level_values_sorted() {
        let table = two_band_table();
        assert_eq!(table.level_values(Level::Filter), vec!["g", "r"]);
        assert_eq!(table.level_values(Level::Dataset), vec!["meas", "ref"]);
    }

    #[test]
    fn test_selection_product() {
        let table = two_band_table();
        let keys = table.columns_from_selection(
            &ColumnSelection::new(vec!["flux".to_string()]).with_dataset("meas"),
        );
        assert_eq!(
            keys,
            vec![
                ColumnKey::leveled("g", "meas", "flux"),
                ColumnKey::leveled("r", "meas", "flux"),
            ]
        );
    }

    #[test]
    fn test_insert_rejects_flat_key() {
        let err = LeveledTable::canonical(1)
            .with_column(ColumnKey::flat("flux"), vec![1.0])
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidKey { .. }));
    }
}
