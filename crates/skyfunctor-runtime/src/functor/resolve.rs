//! Column resolution against a table's column index

use crate::error::{Result, RuntimeError};
use skyfunctor_core::table::format_levels;
use skyfunctor_core::{ColumnKey, ColumnSelection, ColumnTable, Level};
use std::collections::BTreeSet;

/// Dataset whose quantities are filter-independent
pub const REFERENCE_DATASET: &str = "ref";

/// Fail unless the table's level set equals the expected level set
///
/// Flat tables always pass; there is nothing to mismatch.
pub fn check_levels(functor: &str, expected: &[Level], table: &dyn ColumnTable) -> Result<()> {
    let actual = table.column_levels();
    if actual.is_empty() {
        return Ok(());
    }

    let actual_set: BTreeSet<Level> = actual.iter().copied().collect();
    let expected_set: BTreeSet<Level> = expected.iter().copied().collect();
    if actual_set != expected_set {
        return Err(RuntimeError::ColumnLevelMismatch {
            functor: functor.to_string(),
            expected: format_levels(expected),
            actual: format_levels(actual),
        });
    }
    Ok(())
}

/// Pick the filter a functor reads from
///
/// An explicit filter always wins. Without one, the reference dataset takes
/// the first filter the table has, and any other dataset may only proceed
/// when the table holds at most one filter.
pub fn select_filter(
    functor: &str,
    filter: Option<String>,
    dataset: &str,
    table: &dyn ColumnTable,
) -> Result<Option<String>> {
    if filter.is_some() || !table.column_levels().contains(&Level::Filter) {
        return Ok(filter);
    }

    let filters = table.level_values(Level::Filter);
    if dataset == REFERENCE_DATASET || filters.len() <= 1 {
        return Ok(filters.into_iter().next());
    }

    Err(RuntimeError::AmbiguousFilterContext {
        functor: functor.to_string(),
        dataset: dataset.to_string(),
        filters: filters.join(", "),
    })
}

/// Map required column names plus filter/dataset context onto table keys
pub fn resolve_keys(
    functor: &str,
    expected: &[Level],
    table: &dyn ColumnTable,
    filter: Option<String>,
    dataset: &str,
    columns: Vec<String>,
) -> Result<Vec<ColumnKey>> {
    if !table.is_leveled() {
        return Ok(columns.into_iter().map(ColumnKey::flat).collect());
    }

    check_levels(functor, expected, table)?;
    let filter = select_filter(functor, filter, dataset, table)?;

    let mut selection = ColumnSelection::new(columns).with_dataset(dataset);
    selection.filter = filter;
    Ok(table.columns_from_selection(&selection))
}

/// Deduplicate while keeping first-seen order
pub fn dedup_keys(keys: impl IntoIterator<Item = ColumnKey>) -> Vec<ColumnKey> {
    let mut seen = BTreeSet::new();
    keys.into_iter()
        .filter(|key| seen.insert(key.clone()))
        .collect()
}
