//! Loaded sub-tables and composite result tables

use crate::column::{Column, ColumnValues, RowIndex};
use crate::error::{CoreError, Result};
use crate::table::{ColumnKey, Level};

/// Sub-table materialised by one bulk load
///
/// Every column shares the frame's row index. Keys keep whatever levels the
/// table produced until `retain_levels` narrows them for a computation.
#[derive(Debug, Clone)]
pub struct Frame {
    index: RowIndex,
    keys: Vec<ColumnKey>,
    values: Vec<ColumnValues>,
}

impl Frame {
    pub fn new(index: RowIndex) -> Self {
        Self {
            index,
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Append a column; the length must match the row index
    pub fn push(&mut self, key: ColumnKey, values: ColumnValues) -> Result<()> {
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

    pub fn with_column(mut self, key: ColumnKey, values: impl Into<ColumnValues>) -> Result<Self> {
        self.push(key, values.into())?;
        Ok(self)
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn num_columns(&self) -> usize {
        self.keys.len()
    }

    pub fn keys(&self) -> &[ColumnKey] {
        &self.keys
    }

    /// Lookup by full key
    pub fn get(&self, key: &ColumnKey) -> Option<&ColumnValues> {
        self.keys
            .iter()
            .position(|k| k == key)
            .map(|pos| &self.values[pos])
    }

    /// Lookup by column name (first match)
    pub fn column(&self, name: &str) -> Option<&ColumnValues> {
        self.keys
            .iter()
            .position(|k| k.column == name)
            .map(|pos| &self.values[pos])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.keys.iter().any(|k| k.column == name)
    }

    /// Numeric values of the named column
    pub fn floats(&self, name: &str) -> Result<Vec<f64>> {
        self.column(name)
            .ok_or_else(|| CoreError::ColumnNotFound(name.to_string()))?
            .to_f64(name)
    }

    /// Slice out the given keys, without another load
    pub fn select(&self, keys: &[ColumnKey]) -> Result<Frame> {
        let mut out = Frame::new(self.index.clone());
        for key in keys {
            let values = self
                .get(key)
                .ok_or_else(|| CoreError::ColumnNotFound(key.to_string()))?;
            out.push(key.clone(), values.clone())?;
        }
        Ok(out)
    }

    /// Narrow every key down to the given levels
    pub fn retain_levels(mut self, keep: &[Level]) -> Frame {
        self.keys = self.keys.iter().map(|k| k.retain_levels(keep)).collect();
        self
    }

    /// Columns whose `level` equals `value`, with that level dropped
    pub fn cross_section(&self, level: Level, value: &str) -> Frame {
        let mut out = Frame::new(self.index.clone());
        for (key, values) in self.keys.iter().zip(&self.values) {
            if key.get(level) == Some(value) {
                let keep: Vec<Level> = key.levels().into_iter().filter(|l| *l != level).collect();
                out.keys.push(key.retain_levels(&keep));
                out.values.push(values.clone());
            }
        }
        out
    }
}

/// Row-indexed result table, columns in registration order
#[derive(Debug, Clone)]
pub struct ResultFrame {
    index: RowIndex,
    columns: Vec<Column>,
}

impl ResultFrame {
    pub fn new(index: RowIndex) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Append a column; its row index must equal the frame's
    pub fn push(&mut self, column: Column) -> Result<()> {
        if column.index()[..] != self.index[..] {
            return Err(CoreError::IndexMismatch(format!(
                "column '{}' has {} rows, result frame has {}",
                column.name(),
                column.len(),
                self.index.len()
            )));
        }
        if self.column(column.name()).is_some() {
            return Err(CoreError::DuplicateColumn(column.name().to_string()));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Drop every row that is missing in any column
    pub fn drop_missing(&self) -> Result<ResultFrame> {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.columns.iter().all(|c| !c.values().is_missing(i)))
            .collect();
        let index: RowIndex = keep.iter().map(|&i| self.index[i]).collect();

        let mut out = ResultFrame::new(index.clone());
        for column in &self.columns {
            out.push(Column::new(
                column.name(),
                index.clone(),
                column.values().take(&keep),
            )?)?;
        }
        Ok(out)
    }

    /// One JSON object per row: `{"index": .., "<column>": ..}`
    pub fn to_json_records(&self) -> serde_json::Value {
        let rows = (0..self.len())
            .map(|i| {
                let mut row = serde_json::Map::new();
                row.insert("index".to_string(), serde_json::Value::from(self.index[i]));
                for column in &self.columns {
                    row.insert(column.name().to_string(), column.values().json_cell(i));
                }
                serde_json::Value::Object(row)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(vec![5, 6].into())
            .with_column(ColumnKey::leveled("g", "meas", "flux"), vec![1.0, 2.0])
            .unwrap()
            .with_column(ColumnKey::leveled("r", "meas", "flux"), vec![3.0, 4.0])
            .unwrap()
    }

    #[test]
    fn test_cross_section_drops_level() {
        let xs = frame()
            .retain_levels(&[Level::Filter, Level::Column])
            .cross_section(Level::Filter, "r");
        assert_eq!(xs.keys(), &[ColumnKey::flat("flux")]);
        assert_eq!(xs.floats("flux").unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_select_is_in_memory_slice() {
        let sub = frame()
            .select(&[ColumnKey::leveled("g", "meas", "flux")])
            .unwrap();
        assert_eq!(sub.num_columns(), 1);
        assert_eq!(&sub.index()[..], &[5, 6]);
        assert!(frame().select(&[ColumnKey::flat("flux")]).is_err());
    }

    #[test]
    fn test_result_drop_missing_any() {
        let index: RowIndex = vec![0, 1, 2].into();
        let mut result = ResultFrame::new(index.clone());
        result
            .push(Column::new("a", index.clone(), vec![1.0, f64::NAN, 3.0].into()).unwrap())
            .unwrap();
        result
            .push(Column::new("b", index.clone(), vec![1.0, 2.0, f64::NAN].into()).unwrap())
            .unwrap();

        let dropped = result.drop_missing().unwrap();
        assert_eq!(&dropped.index()[..], &[0]);
        assert_eq!(dropped.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_to_json_records() {
        let index: RowIndex = vec![7].into();
        let mut result = ResultFrame::new(index.clone());
        result
            .push(Column::new("mag", index, vec![f64::NAN].into()).unwrap())
            .unwrap();
        assert_eq!(
            result.to_json_records(),
            serde_json::json!([{"index": 7, "mag": null}])
        );
    }
}
