//! Single-level in-memory table

use super::{ColumnKey, ColumnTable, Level};
use crate::column::{ColumnValues, RowIndex};
use crate::error::{CoreError, Result};
use crate::frame::Frame;

/// Table whose columns are addressed by name only
#[derive(Debug, Clone)]
pub struct FlatTable {
    index: RowIndex,
    names: Vec<String>,
    values: Vec<ColumnValues>,
}

impl FlatTable {
    /// Create an empty table over the given row index
    pub fn new(index: impl IntoIterator<Item = i64>) -> Self {
        Self {
            index: index.into_iter().collect(),
            names: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Create an empty table with row index `0..rows`
    pub fn with_rows(rows: usize) -> Self {
        Self::new(0..rows as i64)
    }

    /// Add a column
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: impl Into<ColumnValues>,
    ) -> Result<Self> {
        self.insert(name, values)?;
        Ok(self)
    }

    pub fn insert(&mut self, name: impl Into<String>, values: impl Into<ColumnValues>) -> Result<()> {
        let name = name.into();
        let values = values.into();
        if self.names.contains(&name) {
            return Err(CoreError::DuplicateColumn(name));
        }
        if values.len() != self.index.len() {
            return Err(CoreError::LengthMismatch {
                column: name,
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        self.names.push(name);
        self.values.push(values);
        Ok(())
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }
}

impl ColumnTable for FlatTable {
    fn column_levels(&self) -> &[Level] {
        &[]
    }

    fn level_values(&self, level: Level) -> Vec<String> {
        match level {
            Level::Column => self.names.clone(),
            _ => Vec::new(),
        }
    }

    fn load(&self, keys: &[ColumnKey]) -> Result<Frame> {
        let mut frame = Frame::new(self.index.clone());
        for key in keys {
            if !key.is_flat() {
                return Err(CoreError::InvalidKey {
                    key: key.to_string(),
                    message: "flat table has no filter or dataset level".to_string(),
                });
            }
            let pos = self
                .names
                .iter()
                .position(|n| *n == key.column)
                .ok_or_else(|| CoreError::ColumnNotFound(key.to_string()))?;
            frame.push(key.clone(), self.values[pos].clone())?;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_only_requested_columns() {
        let table = FlatTable::with_rows(2)
            .with_column("a", vec![1.0, 2.0])
            .unwrap()
            .with_column("b", vec![3.0, 4.0])
            .unwrap();

        let frame = table.load(&[ColumnKey::flat("b")]).unwrap();
        assert_eq!(frame.num_columns(), 1);
        assert_eq!(frame.floats("b").unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_load_missing_column() {
        let table = FlatTable::with_rows(1).with_column("a", vec![1.0]).unwrap();
        let err = table.load(&[ColumnKey::flat("nope")]).unwrap_err();
        assert_eq!(err, CoreError::ColumnNotFound("nope".to_string()));
    }

    #[test]
    fn test_rejects_duplicate_and_short_columns() {
        let table = FlatTable::with_rows(2).with_column("a", vec![1.0, 2.0]).unwrap();
        assert!(table.clone().with_column("a", vec![1.0, 2.0]).is_err());
        assert!(table.with_column("b", vec![1.0]).is_err());
    }
}
