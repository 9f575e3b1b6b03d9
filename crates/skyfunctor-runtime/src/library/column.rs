//! Column pass-through, row index and coordinate functors

use crate::error::{ComputeError, ComputeResult, Result};
use crate::functor::{floats, Functor, FunctorSettings, WithSettings};
use skyfunctor_core::{ColumnValues, Frame};

/// Pass a single column through unchanged
#[derive(Debug, Clone)]
pub struct ColumnFunctor {
    col: String,
    settings: FunctorSettings,
}

impl ColumnFunctor {
    pub fn new(col: impl Into<String>) -> Self {
        Self {
            col: col.into(),
            settings: FunctorSettings::default(),
        }
    }

    /// Footprint pixel count
    pub fn footprint_npix() -> Self {
        Self::new("base_Footprint_nPix")
    }

    pub fn col(&self) -> &str {
        &self.col
    }
}

impl Functor for ColumnFunctor {
    fn name(&self) -> String {
        self.col.clone()
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(vec![self.col.clone()])
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        frame
            .column(&self.col)
            .cloned()
            .ok_or_else(|| ComputeError::MissingColumn(self.col.clone()))
    }
}

impl WithSettings for ColumnFunctor {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexKind {
    /// Any row index, read through a placeholder column
    Index,
    /// Object id
    Id,
}

/// Return the row index as values
#[derive(Debug, Clone)]
pub struct IndexFunctor {
    kind: IndexKind,
    settings: FunctorSettings,
}

impl IndexFunctor {
    /// Row index; `coord_ra` is loaded only to obtain the rows
    pub fn index() -> Self {
        Self {
            kind: IndexKind::Index,
            settings: FunctorSettings::default(),
        }
    }

    /// Object id column, returned from the row index
    pub fn id() -> Self {
        Self {
            kind: IndexKind::Id,
            settings: FunctorSettings::default(),
        }
    }
}

impl Functor for IndexFunctor {
    fn name(&self) -> String {
        match self.kind {
            IndexKind::Index => "index".to_string(),
            IndexKind::Id => "id".to_string(),
        }
    }

    fn columns(&self) -> Result<Vec<String>> {
        match self.kind {
            IndexKind::Index => Ok(vec!["coord_ra".to_string()]),
            IndexKind::Id => Ok(vec!["id".to_string()]),
        }
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn default_no_dup(&self) -> bool {
        true
    }

    fn allow_difference(&self) -> bool {
        self.kind != IndexKind::Id
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        Ok(ColumnValues::Int(frame.index().to_vec()))
    }
}

impl WithSettings for IndexFunctor {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

/// Coordinate column converted from radians to degrees
#[derive(Debug, Clone)]
pub struct CoordColumn {
    col: String,
    label: Option<&'static str>,
    settings: FunctorSettings,
}

impl CoordColumn {
    pub fn new(col: impl Into<String>) -> Self {
        Self {
            col: col.into(),
            label: None,
            settings: FunctorSettings::default(),
        }
    }

    /// Right ascension in degrees
    pub fn ra() -> Self {
        Self {
            col: "coord_ra".to_string(),
            label: Some("RA"),
            settings: FunctorSettings::default(),
        }
    }

    /// Declination in degrees
    pub fn dec() -> Self {
        Self {
            col: "coord_dec".to_string(),
            label: Some("Dec"),
            settings: FunctorSettings::default(),
        }
    }
}

impl Functor for CoordColumn {
    fn name(&self) -> String {
        self.label
            .map(str::to_string)
            .unwrap_or_else(|| self.col.clone())
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(vec![self.col.clone()])
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn default_no_dup(&self) -> bool {
        self.label.is_some()
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let values = floats(frame, &self.col)?;
        Ok(values.into_iter().map(f64::to_degrees).collect::<Vec<_>>().into())
    }
}

impl WithSettings for CoordColumn {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfunctor_core::FlatTable;
    use std::f64::consts::PI;

    fn table() -> FlatTable {
        FlatTable::new(vec![100, 200])
            .with_column("coord_ra", vec![PI, PI / 2.0])
            .unwrap()
            .with_column("id", vec![100i64, 200])
            .unwrap()
    }

    #[test]
    fn test_column_pass_through() {
        let col = ColumnFunctor::new("id").evaluate(&table(), false).unwrap();
        assert_eq!(col.values(), &ColumnValues::Int(vec![100, 200]));
        assert_eq!(col.name(), "id");
    }

    #[test]
    fn test_ra_in_degrees() {
        let ra = CoordColumn::ra();
        assert_eq!(ra.name(), "RA");
        assert!(ra.no_dup());
        let col = ra.evaluate(&table(), false).unwrap();
        let values = col.floats().unwrap();
        assert!((values[0] - 180.0).abs() < 1e-12);
        assert!((values[1] - 90.0).abs() < 1e-12);
        assert!(!CoordColumn::new("coord_ra").no_dup());
    }

    #[test]
    fn test_index_functors() {
        let col = IndexFunctor::index().evaluate(&table(), false).unwrap();
        assert_eq!(col.values(), &ColumnValues::Int(vec![100, 200]));

        let id = IndexFunctor::id();
        assert!(id.no_dup());
        assert!(!id.allow_difference());
        assert!(IndexFunctor::index().allow_difference());
    }
}
