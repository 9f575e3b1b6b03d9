//! Column levels and hierarchical column keys
//!
//! A leveled table addresses each column by `(filter, dataset, column)`;
//! a flat table only by column name. `ColumnKey` carries both shapes: the
//! filter and dataset parts are simply absent for flat keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One axis of a hierarchical column index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Filter,
    Dataset,
    Column,
}

impl Level {
    /// Canonical level order of a multi-band object table
    pub const CANONICAL: [Level; 3] = [Level::Filter, Level::Dataset, Level::Column];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Filter => "filter",
            Level::Dataset => "dataset",
            Level::Column => "column",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a level list as `(filter, dataset, column)`
pub fn format_levels(levels: &[Level]) -> String {
    let names: Vec<&str> = levels.iter().map(Level::as_str).collect();
    format!("({})", names.join(", "))
}

/// Key of a single column in a flat or leveled table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    pub column: String,
}

impl ColumnKey {
    /// Key for a single-level table
    pub fn flat(column: impl Into<String>) -> Self {
        Self {
            filter: None,
            dataset: None,
            column: column.into(),
        }
    }

    /// Key over the canonical `(filter, dataset, column)` levels
    pub fn leveled(
        filter: impl Into<String>,
        dataset: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            filter: Some(filter.into()),
            dataset: Some(dataset.into()),
            column: column.into(),
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

    /// Value of this key at `level`
    pub fn get(&self, level: Level) -> Option<&str> {
        match level {
            Level::Filter => self.filter.as_deref(),
            Level::Dataset => self.dataset.as_deref(),
            Level::Column => Some(self.column.as_str()),
        }
    }

    pub(crate) fn set(&mut self, level: Level, value: &str) {
        match level {
            Level::Filter => self.filter = Some(value.to_string()),
            Level::Dataset => self.dataset = Some(value.to_string()),
            Level::Column => self.column = value.to_string(),
        }
    }

    /// Levels this key carries a value for, in canonical order
    pub fn levels(&self) -> Vec<Level> {
        Level::CANONICAL
            .into_iter()
            .filter(|l| self.get(*l).is_some())
            .collect()
    }

    pub fn is_flat(&self) -> bool {
        self.filter.is_none() && self.dataset.is_none()
    }

    /// Drop every level not listed in `keep`; the column level is never dropped
    pub fn retain_levels(&self, keep: &[Level]) -> Self {
        Self {
            filter: self.filter.clone().filter(|_| keep.contains(&Level::Filter)),
            dataset: self.dataset.clone().filter(|_| keep.contains(&Level::Dataset)),
            column: self.column.clone(),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_flat() {
            return f.write_str(&self.column);
        }
        let parts: Vec<&str> = Level::CANONICAL
            .into_iter()
            .filter_map(|l| self.get(l))
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

impl From<&str> for ColumnKey {
    fn from(column: &str) -> Self {
        ColumnKey::flat(column)
    }
}
