//! Column values and named, index-aligned result columns
//!
//! `ColumnValues` is the storage for one column of a loaded frame or of a
//! functor result. Floats use NaN as the missing sentinel; text and
//! categorical columns use `None`.

use crate::error::{CoreError, Result};
use serde::Serialize;
use std::sync::Arc;

/// Row index shared by every column loaded in one bulk read
pub type RowIndex = Arc<[i64]>;

/// Ordered categorical storage (category list + per-row code)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Categorical {
    categories: Vec<String>,
    codes: Vec<Option<usize>>,
}

impl Categorical {
    /// Create a categorical column, checking every code against the category list
    pub fn new(categories: Vec<String>, codes: Vec<Option<usize>>) -> Result<Self> {
        if let Some(bad) = codes.iter().flatten().find(|c| **c >= categories.len()) {
            return Err(CoreError::TypeMismatch {
                column: "<categorical>".to_string(),
                expected: format!("code < {}", categories.len()),
                actual: bad.to_string(),
            });
        }
        Ok(Self { categories, codes })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn codes(&self) -> &[Option<usize>] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Label of row `i`, `None` when the row has no category
    pub fn label(&self, i: usize) -> Option<&str> {
        self.codes
            .get(i)
            .copied()
            .flatten()
            .map(|c| self.categories[c].as_str())
    }

    pub fn labels(&self) -> Vec<Option<&str>> {
        (0..self.codes.len()).map(|i| self.label(i)).collect()
    }

    /// Coerce to plain text labels
    pub fn to_text(&self) -> Vec<Option<String>> {
        (0..self.codes.len())
            .map(|i| self.label(i).map(str::to_string))
            .collect()
    }

    fn take(&self, rows: &[usize]) -> Self {
        Self {
            categories: self.categories.clone(),
            codes: rows.iter().map(|&r| self.codes[r]).collect(),
        }
    }
}

/// Storage for a single column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ColumnValues {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    Text(Vec<Option<String>>),
    Categorical(Categorical),
}

impl ColumnValues {
    /// Full-length column of missing sentinels
    pub fn missing(len: usize) -> Self {
        ColumnValues::Float(vec![f64::NAN; len])
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Float(v) => v.len(),
            ColumnValues::Int(v) => v.len(),
            ColumnValues::Bool(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
            ColumnValues::Categorical(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnValues::Float(_) => "float",
            ColumnValues::Int(_) => "int",
            ColumnValues::Bool(_) => "bool",
            ColumnValues::Text(_) => "text",
            ColumnValues::Categorical(_) => "categorical",
        }
    }

    /// Whether row `i` holds a missing value
    pub fn is_missing(&self, i: usize) -> bool {
        match self {
            ColumnValues::Float(v) => v[i].is_nan(),
            ColumnValues::Int(_) | ColumnValues::Bool(_) => false,
            ColumnValues::Text(v) => v[i].is_none(),
            ColumnValues::Categorical(c) => c.codes[i].is_none(),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// Keep only the given rows, in the given order
    pub fn take(&self, rows: &[usize]) -> Self {
        match self {
            ColumnValues::Float(v) => ColumnValues::Float(rows.iter().map(|&r| v[r]).collect()),
            ColumnValues::Int(v) => ColumnValues::Int(rows.iter().map(|&r| v[r]).collect()),
            ColumnValues::Bool(v) => ColumnValues::Bool(rows.iter().map(|&r| v[r]).collect()),
            ColumnValues::Text(v) => {
                ColumnValues::Text(rows.iter().map(|&r| v[r].clone()).collect())
            }
            ColumnValues::Categorical(c) => ColumnValues::Categorical(c.take(rows)),
        }
    }

    /// Numeric view of the column; ints and bools are widened to f64
    pub fn to_f64(&self, column: &str) -> Result<Vec<f64>> {
        match self {
            ColumnValues::Float(v) => Ok(v.clone()),
            ColumnValues::Int(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            ColumnValues::Bool(v) => Ok(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()),
            other => Err(CoreError::TypeMismatch {
                column: column.to_string(),
                expected: "numeric".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Cell value as JSON (NaN becomes null)
    pub fn json_cell(&self, i: usize) -> serde_json::Value {
        match self {
            ColumnValues::Float(v) => serde_json::Value::from(v[i]),
            ColumnValues::Int(v) => serde_json::Value::from(v[i]),
            ColumnValues::Bool(v) => serde_json::Value::from(v[i]),
            ColumnValues::Text(v) => v[i]
                .as_ref()
                .map_or(serde_json::Value::Null, |s| serde_json::Value::from(s.as_str())),
            ColumnValues::Categorical(c) => c
                .label(i)
                .map_or(serde_json::Value::Null, serde_json::Value::from),
        }
    }
}

impl From<Vec<f64>> for ColumnValues {
    fn from(v: Vec<f64>) -> Self {
        ColumnValues::Float(v)
    }
}

impl From<Vec<i64>> for ColumnValues {
    fn from(v: Vec<i64>) -> Self {
        ColumnValues::Int(v)
    }
}

impl From<Vec<bool>> for ColumnValues {
    fn from(v: Vec<bool>) -> Self {
        ColumnValues::Bool(v)
    }
}

impl From<Categorical> for ColumnValues {
    fn from(c: Categorical) -> Self {
        ColumnValues::Categorical(c)
    }
}

/// A named column aligned to a row index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    #[serde(skip)]
    index: RowIndex,
    values: ColumnValues,
}

impl Column {
    pub fn new(name: impl Into<String>, index: RowIndex, values: ColumnValues) -> Result<Self> {
        let name = name.into();
        if values.len() != index.len() {
            return Err(CoreError::LengthMismatch {
                column: name,
                expected: index.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            name,
            index,
            values,
        })
    }

    /// Column of missing sentinels aligned to `index`
    pub fn missing(name: impl Into<String>, index: RowIndex) -> Self {
        let values = ColumnValues::missing(index.len());
        Self {
            name: name.into(),
            index,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    pub fn into_values(self) -> ColumnValues {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Float values; errors on non-numeric columns
    pub fn floats(&self) -> Result<Vec<f64>> {
        self.values.to_f64(&self.name)
    }

    /// Remove rows holding a missing value
    pub fn drop_missing(&self) -> Self {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| !self.values.is_missing(i))
            .collect();
        Self {
            name: self.name.clone(),
            index: keep.iter().map(|&i| self.index[i]).collect(),
            values: self.values.take(&keep),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(n: i64) -> RowIndex {
        (0..n).collect()
    }

    #[test]
    fn test_column_length_checked() {
        let err = Column::new("x", index(3), ColumnValues::Float(vec![1.0])).unwrap_err();
        assert!(matches!(err, CoreError::LengthMismatch { expected: 3, actual: 1, .. }));
    }

    #[test]
    fn test_drop_missing_keeps_index_alignment() {
        let col = Column::new(
            "x",
            vec![10, 11, 12].into(),
            ColumnValues::Float(vec![1.0, f64::NAN, 3.0]),
        )
        .unwrap();

        let dropped = col.drop_missing();
        assert_eq!(&dropped.index()[..], &[10, 12]);
        assert_eq!(dropped.floats().unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_categorical_labels() {
        let cat = Categorical::new(
            vec!["galaxy".to_string(), "star".to_string()],
            vec![Some(1), None, Some(0)],
        )
        .unwrap();
        assert_eq!(cat.labels(), vec![Some("star"), None, Some("galaxy")]);
        assert!(Categorical::new(vec!["a".to_string()], vec![Some(3)]).is_err());
    }

    #[test]
    fn test_to_f64_rejects_text() {
        let values = ColumnValues::Text(vec![Some("g".to_string())]);
        assert!(values.to_f64("band").is_err());
        assert_eq!(
            ColumnValues::Bool(vec![true, false]).to_f64("flag").unwrap(),
            vec![1.0, 0.0]
        );
    }

    #[test]
    fn test_json_cell_nan_is_null() {
        let values = ColumnValues::Float(vec![f64::NAN, 2.5]);
        assert_eq!(values.json_cell(0), serde_json::Value::Null);
        assert_eq!(values.json_cell(1), serde_json::json!(2.5));
    }
}
