//! Categorical labellers

use crate::config::FunctorConfig;
use crate::error::{ComputeError, ComputeResult, Result};
use crate::functor::{floats, Functor, FunctorSettings, WithSettings};
use skyfunctor_core::{Categorical, ColumnValues, Frame};

const EXTENDEDNESS: &str = "base_ClassificationExtendedness_value";
const NUM_STAR_FLAGS: &str = "numStarFlags";

fn finish(categorical: Categorical, force_str: bool) -> ColumnValues {
    if force_str {
        ColumnValues::Text(categorical.to_text())
    } else {
        ColumnValues::Categorical(categorical)
    }
}

/// Star / galaxy label from the extendedness classifier
///
/// Rows below the threshold are stars, NaN rows get the configured null
/// label, and everything else is a galaxy.
#[derive(Debug, Clone)]
pub struct StarGalaxyLabeller {
    threshold: f64,
    null_label: String,
    force_str: bool,
    settings: FunctorSettings,
}

impl StarGalaxyLabeller {
    pub fn new(config: &FunctorConfig) -> Self {
        Self {
            threshold: config.star_galaxy_threshold,
            null_label: config.null_label.clone(),
            force_str: config.force_str_labels,
            settings: FunctorSettings::default(),
        }
    }
}

impl Functor for StarGalaxyLabeller {
    fn name(&self) -> String {
        "label".to_string()
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(vec![EXTENDEDNESS.to_string()])
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn allow_drop_missing(&self) -> bool {
        false
    }

    fn allow_difference(&self) -> bool {
        false
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let codes = floats(frame, EXTENDEDNESS)?
            .into_iter()
            .map(|x| {
                if x.is_nan() {
                    Some(2)
                } else if x < self.threshold {
                    Some(1)
                } else {
                    Some(0)
                }
            })
            .collect();

        let categories = vec![
            "galaxy".to_string(),
            "star".to_string(),
            self.null_label.clone(),
        ];
        let categorical = Categorical::new(categories, codes).map_err(ComputeError::from)?;
        Ok(finish(categorical, self.force_str))
    }
}

impl WithSettings for StarGalaxyLabeller {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

/// Star likelihood from the number of bands flagging a source as a star
///
/// With `n` the number of distinct flag counts minus one, rows are binned
/// right-closed into `(-1, 0]` noStar, `(0, n-1]` maybe and `(n-1, n]` star.
#[derive(Debug, Clone)]
pub struct NumStarLabeller {
    force_str: bool,
    settings: FunctorSettings,
}

impl NumStarLabeller {
    pub fn new(config: &FunctorConfig) -> Self {
        Self {
            force_str: config.force_str_labels,
            settings: FunctorSettings::default(),
        }
    }
}

impl Functor for NumStarLabeller {
    fn name(&self) -> String {
        "label".to_string()
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(vec![NUM_STAR_FLAGS.to_string()])
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn allow_drop_missing(&self) -> bool {
        false
    }

    fn allow_difference(&self) -> bool {
        false
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let flags = floats(frame, NUM_STAR_FLAGS)?;

        let mut distinct: Vec<f64> = flags.iter().copied().filter(|x| !x.is_nan()).collect();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();
        let n = distinct.len() as f64 - 1.0;

        if n - 1.0 <= 0.0 {
            return Err(ComputeError::Domain(format!(
                "{} needs at least three distinct values to bin, found {}",
                NUM_STAR_FLAGS,
                distinct.len()
            )));
        }

        let codes = flags
            .iter()
            .map(|&x| {
                if x > -1.0 && x <= 0.0 {
                    Some(0)
                } else if x > 0.0 && x <= n - 1.0 {
                    Some(1)
                } else if x > n - 1.0 && x <= n {
                    Some(2)
                } else {
                    None
                }
            })
            .collect();

        let categories = vec!["noStar".to_string(), "maybe".to_string(), "star".to_string()];
        let categorical = Categorical::new(categories, codes).map_err(ComputeError::from)?;
        Ok(finish(categorical, self.force_str))
    }
}

impl WithSettings for NumStarLabeller {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfunctor_core::{ColumnKey, ColumnTable, FlatTable};

    #[test]
    fn test_star_galaxy_labels() {
        let table = FlatTable::with_rows(4)
            .with_column(EXTENDEDNESS, vec![0.0, 0.9, f64::NAN, 0.5])
            .unwrap();

        let col = StarGalaxyLabeller::new(&FunctorConfig::default())
            .evaluate(&table, true)
            .unwrap();
        let ColumnValues::Categorical(labels) = col.values() else {
            panic!("expected categorical labels");
        };
        assert_eq!(
            labels.labels(),
            vec![Some("star"), Some("galaxy"), Some("null"), Some("galaxy")]
        );
        // drop_missing is ignored for labellers
        assert_eq!(col.len(), 4);
    }

    #[test]
    fn test_force_str_labels() {
        let table = FlatTable::with_rows(1)
            .with_column(EXTENDEDNESS, vec![0.1])
            .unwrap();
        let config = FunctorConfig::default().with_force_str_labels(true);

        let col = StarGalaxyLabeller::new(&config).evaluate(&table, false).unwrap();
        assert_eq!(col.values(), &ColumnValues::Text(vec![Some("star".to_string())]));
    }

    #[test]
    fn test_num_star_bins() {
        let table = FlatTable::with_rows(6)
            .with_column(NUM_STAR_FLAGS, vec![0.0, 1.0, 2.0, 3.0, f64::NAN, 5.0])
            .unwrap();

        // distinct {0, 1, 2, 3, 5}: n = 4
        let col = NumStarLabeller::new(&FunctorConfig::default())
            .evaluate(&table, false)
            .unwrap();
        let ColumnValues::Categorical(labels) = col.values() else {
            panic!("expected categorical labels");
        };
        assert_eq!(
            labels.labels(),
            vec![
                Some("noStar"),
                Some("maybe"),
                Some("maybe"),
                Some("maybe"),
                None,
                None
            ]
        );
    }

    #[test]
    fn test_num_star_ignores_nan_when_counting() {
        // distinct {0, 1, 2}: n = 2, so 2 is a star rather than a maybe
        let table = FlatTable::with_rows(4)
            .with_column(NUM_STAR_FLAGS, vec![0.0, 1.0, 2.0, f64::NAN])
            .unwrap();
        let col = NumStarLabeller::new(&FunctorConfig::default())
            .evaluate(&table, false)
            .unwrap();
        let ColumnValues::Categorical(labels) = col.values() else {
            panic!("expected categorical labels");
        };
        assert_eq!(
            labels.labels(),
            vec![Some("noStar"), Some("maybe"), Some("star"), None]
        );

        // distinct {0, 1}: n = 1 is too few to bin even with a NaN present
        let table = FlatTable::with_rows(3)
            .with_column(NUM_STAR_FLAGS, vec![0.0, 1.0, f64::NAN])
            .unwrap();
        let functor = NumStarLabeller::new(&FunctorConfig::default());
        let frame = table.load(&[ColumnKey::flat(NUM_STAR_FLAGS)]).unwrap();
        assert!(matches!(functor.compute(&frame), Err(ComputeError::Domain(_))));
    }

    #[test]
    fn test_num_star_too_few_values_is_contained() {
        let table = FlatTable::with_rows(2)
            .with_column(NUM_STAR_FLAGS, vec![0.0, 1.0])
            .unwrap();

        let functor = NumStarLabeller::new(&FunctorConfig::default());
        let col = functor.evaluate(&table, false).unwrap();
        assert_eq!(col.values().missing_count(), 2);
        assert!(!functor.allow_difference());
    }
}
