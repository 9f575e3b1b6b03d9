//! Functor abstraction
//!
//! A functor is a named single-column computation. It declares the column
//! names it needs, resolves them against a table's column index using its
//! filter/dataset context, and transforms the loaded sub-table into one
//! result column.
//!
//! Evaluation is split in three steps so a composite can share one bulk load:
//! - `resolve_columns`: configuration checks, fatal on failure
//! - `ColumnTable::load`: one bulk read, failures propagate
//! - `outcome`: the transform, failures contained as missing values

pub mod resolve;

pub use resolve::{check_levels, dedup_keys, resolve_keys, select_filter, REFERENCE_DATASET};

use crate::error::{ComputeError, ComputeResult, Result, RuntimeError};
use skyfunctor_core::{Column, ColumnKey, ColumnTable, ColumnValues, Frame, Level};
use std::fmt;
use tracing::{debug, warn};

/// Per-functor context, fixed at construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctorSettings {
    pub filter: Option<String>,
    pub dataset: Option<String>,
    pub no_dup: Option<bool>,
}

impl FunctorSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    pub fn with_no_dup(mut self, no_dup: bool) -> Self {
        self.no_dup = Some(no_dup);
        self
    }
}

/// Context supplied by the caller at evaluation time
///
/// Fills in whatever the functor's own settings leave unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
    pub filter: Option<String>,
    pub dataset: Option<String>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
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

/// Result of running one transform
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome {
    /// Transform succeeded
    Computed(Column),

    /// Transform failed; `column` holds missing values over the same rows
    Substituted { column: Column, reason: ComputeError },
}

impl ColumnOutcome {
    pub fn column(&self) -> &Column {
        match self {
            ColumnOutcome::Computed(column) => column,
            ColumnOutcome::Substituted { column, .. } => column,
        }
    }

    pub fn into_column(self) -> Column {
        match self {
            ColumnOutcome::Computed(column) => column,
            ColumnOutcome::Substituted { column, .. } => column,
        }
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self, ColumnOutcome::Substituted { .. })
    }

    pub fn reason(&self) -> Option<&ComputeError> {
        match self {
            ColumnOutcome::Computed(_) => None,
            ColumnOutcome::Substituted { reason, .. } => Some(reason),
        }
    }
}

/// Single-column computation over a column table
pub trait Functor: fmt::Debug + Send + Sync {
    /// Full name, suitable for labels
    fn name(&self) -> String;

    /// Key-safe identifier
    fn shortname(&self) -> String {
        self.name()
    }

    /// Required input column names
    fn columns(&self) -> Result<Vec<String>> {
        Err(RuntimeError::NotImplemented {
            functor: self.name(),
            what: "columns".to_string(),
        })
    }

    fn settings(&self) -> &FunctorSettings;

    /// Transform a loaded, level-normalized frame into result values
    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues>;

    fn default_dataset(&self) -> &str {
        REFERENCE_DATASET
    }

    fn default_no_dup(&self) -> bool {
        false
    }

    /// Levels the table's column index must have
    fn column_levels(&self) -> &[Level] {
        &Level::CANONICAL
    }

    /// Levels kept on the frame handed to `compute`
    fn frame_levels(&self) -> &[Level] {
        &[Level::Column]
    }

    fn allow_drop_missing(&self) -> bool {
        true
    }

    fn allow_difference(&self) -> bool {
        true
    }

    /// Whether a filter from the evaluation context applies to this functor
    fn uses_filter_context(&self) -> bool {
        true
    }

    /// Effective filter: own setting, then context
    fn filter(&self, ctx: &EvalContext) -> Option<String> {
        if !self.uses_filter_context() {
            return None;
        }
        self.settings()
            .filter
            .clone()
            .or_else(|| ctx.filter.clone())
    }

    /// Effective dataset: own setting, then context, then subtype default
    fn dataset(&self, ctx: &EvalContext) -> String {
        self.settings()
            .dataset
            .clone()
            .or_else(|| ctx.dataset.clone())
            .unwrap_or_else(|| self.default_dataset().to_string())
    }

    /// Whether this column is excluded from deduplication when composed
    fn no_dup(&self) -> bool {
        self.settings().no_dup.unwrap_or_else(|| self.default_no_dup())
    }

    /// Concrete table keys for this functor's columns
    fn resolve_columns(&self, table: &dyn ColumnTable, ctx: &EvalContext) -> Result<Vec<ColumnKey>> {
        resolve_keys(
            &self.name(),
            self.column_levels(),
            table,
            self.filter(ctx),
            &self.dataset(ctx),
            self.columns()?,
        )
    }

    /// Run the transform on a normalized frame, containing any failure
    fn outcome(&self, frame: &Frame) -> ColumnOutcome {
        let name = self.name();
        let computed = self.compute(frame).and_then(|values| {
            Column::new(name.clone(), frame.index().clone(), values).map_err(ComputeError::from)
        });

        match computed {
            Ok(column) => ColumnOutcome::Computed(column),
            Err(reason) => {
                warn!(functor = %name, error = %reason, "Computation failed, substituting missing values");
                ColumnOutcome::Substituted {
                    column: Column::missing(name, frame.index().clone()),
                    reason,
                }
            }
        }
    }

    /// Evaluate with an empty context
    fn evaluate(&self, table: &dyn ColumnTable, drop_missing: bool) -> Result<Column> {
        self.evaluate_with(table, &EvalContext::default(), drop_missing)
    }

    /// Resolve, load exactly the resolved columns, and compute
    fn evaluate_with(
        &self,
        table: &dyn ColumnTable,
        ctx: &EvalContext,
        drop_missing: bool,
    ) -> Result<Column> {
        let keys = self.resolve_columns(table, ctx)?;
        debug!(functor = %self.name(), columns = keys.len(), "Loading resolved columns");

        let frame = table.load(&keys)?.retain_levels(self.frame_levels());
        let column = self.outcome(&frame).into_column();

        if drop_missing && self.allow_drop_missing() {
            Ok(column.drop_missing())
        } else {
            Ok(column)
        }
    }

    /// Elementwise difference of this functor evaluated on two tables
    fn difference(
        &self,
        first: &dyn ColumnTable,
        second: &dyn ColumnTable,
        drop_missing: bool,
    ) -> Result<Column> {
        if !self.allow_difference() {
            return Err(RuntimeError::DifferenceNotAllowed(self.name()));
        }

        let a = self.evaluate(first, drop_missing)?;
        let b = self.evaluate(second, drop_missing)?;
        if a.index()[..] != b.index()[..] {
            return Err(RuntimeError::IndexMismatch(format!(
                "'{}' evaluated to {} and {} rows with different indexes",
                self.name(),
                a.len(),
                b.len()
            )));
        }

        let diff: Vec<f64> = a
            .floats()?
            .into_iter()
            .zip(b.floats()?)
            .map(|(x, y)| x - y)
            .collect();
        Ok(Column::new(self.name(), a.index().clone(), diff.into())?)
    }
}

/// Numeric column from a loaded frame
pub(crate) fn floats(frame: &Frame, name: &str) -> ComputeResult<Vec<f64>> {
    frame.floats(name).map_err(ComputeError::from_core)
}

/// Builder-style context setters for concrete functors
pub trait WithSettings: Sized {
    fn settings_mut(&mut self) -> &mut FunctorSettings;

    fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.settings_mut().filter = Some(filter.into());
        self
    }

    fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.settings_mut().dataset = Some(dataset.into());
        self
    }

    fn with_no_dup(mut self, no_dup: bool) -> Self {
        self.settings_mut().no_dup = Some(no_dup);
        self
    }

    fn with_settings(mut self, settings: FunctorSettings) -> Self {
        *self.settings_mut() = settings;
        self
    }
}
