//! Reference band selection from merge-measurement flags

use crate::error::{ComputeResult, Result};
use crate::functor::{floats, Functor, FunctorSettings, WithSettings};
use skyfunctor_core::{ColumnValues, Frame};

const MERGE_PREFIX: &str = "merge_measurement_";

/// Bands in the order their flag columns are read; ties go to the earliest
pub const REFERENCE_BANDS: [&str; 5] = ["i", "r", "z", "y", "g"];

/// Name of the band whose merge-measurement flag is set for each row
#[derive(Debug, Clone, Default)]
pub struct ReferenceBand {
    settings: FunctorSettings,
}

impl ReferenceBand {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Functor for ReferenceBand {
    fn name(&self) -> String {
        "Reference Band".to_string()
    }

    fn shortname(&self) -> String {
        "refBand".to_string()
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(REFERENCE_BANDS
            .iter()
            .map(|band| format!("{}{}", MERGE_PREFIX, band))
            .collect())
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let flags = REFERENCE_BANDS
            .iter()
            .map(|band| floats(frame, &format!("{}{}", MERGE_PREFIX, band)))
            .collect::<ComputeResult<Vec<_>>>()?;

        let bands = (0..frame.len())
            .map(|row| {
                let mut best: Option<(usize, f64)> = None;
                for (i, column) in flags.iter().enumerate() {
                    let value = column[row];
                    if value.is_nan() {
                        continue;
                    }
                    if best.map_or(true, |(_, max)| value > max) {
                        best = Some((i, value));
                    }
                }
                best.map(|(i, _)| REFERENCE_BANDS[i].to_string())
            })
            .collect();

        Ok(ColumnValues::Text(bands))
    }
}

impl WithSettings for ReferenceBand {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}
