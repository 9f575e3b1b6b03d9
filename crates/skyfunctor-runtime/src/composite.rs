//! Composite functor
//!
//! A `CompositeFunctor` evaluates many functors with a single bulk load. Each
//! child resolves its own keys, the deduplicated union is loaded once, and
//! every child then computes on its slice of that frame. A child whose
//! transform fails yields a missing column without affecting its siblings.
//!
//! The composite's filter lives in its `EvalContext`. Children with no filter
//! of their own read it from there, so functors added later pick it up too.

use crate::config::FunctorConfig;
use crate::error::{ComputeError, Result};
use crate::functor::{dedup_keys, ColumnOutcome, EvalContext, Functor};
use crate::loader::FunctorLoader;
use crate::registry::FunctorRegistry;
use skyfunctor_core::ast::CompositeSpec;
use skyfunctor_core::{ColumnKey, ColumnTable, ResultFrame};
use skyfunctor_parser::SpecParser;
use std::path::Path;
use tracing::debug;

/// A contained per-column failure
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFailure {
    /// Result column key
    pub name: String,
    pub reason: ComputeError,
}

/// Composite evaluation result with its contained failures
#[derive(Debug, Clone)]
pub struct CompositeResult {
    pub frame: ResultFrame,
    pub failures: Vec<ColumnFailure>,
}

impl CompositeResult {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Named functors evaluated together
#[derive(Debug, Default)]
pub struct CompositeFunctor {
    funcs: Vec<(String, Box<dyn Functor>)>,
    context: EvalContext,
}

impl CompositeFunctor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, functor)` pairs; a repeated key replaces the earlier entry
    pub fn from_map<I, K>(funcs: I) -> Self
    where
        I: IntoIterator<Item = (K, Box<dyn Functor>)>,
        K: Into<String>,
    {
        let mut composite = Self::new();
        for (key, functor) in funcs {
            composite.insert(key, functor);
        }
        composite
    }

    /// Build from functors keyed by their shortnames
    pub fn from_functors(funcs: impl IntoIterator<Item = Box<dyn Functor>>) -> Self {
        Self::from_map(funcs.into_iter().map(|f| (f.shortname(), f)))
    }

    /// Build from a specification with the built-in registry and default config
    pub fn from_spec(spec: &CompositeSpec) -> Result<Self> {
        FunctorLoader::default().load(spec)
    }

    pub fn from_spec_with(
        spec: &CompositeSpec,
        registry: &FunctorRegistry,
        config: &FunctorConfig,
    ) -> Result<Self> {
        FunctorLoader::new(registry.clone(), config.clone()).load(spec)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_spec(&SpecParser::parse(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_spec(&SpecParser::parse_file(path)?)
    }

    /// Add or replace a child; a replaced child keeps its position
    pub fn insert(&mut self, key: impl Into<String>, functor: Box<dyn Functor>) {
        let key = key.into();
        match self.funcs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = functor,
            None => self.funcs.push((key, functor)),
        }
    }

    /// Merge another composite's children, overwriting on key collision
    pub fn update(&mut self, other: CompositeFunctor) {
        for (key, functor) in other.funcs {
            self.insert(key, functor);
        }
    }

    pub fn get(&self, key: &str) -> Option<&dyn Functor> {
        self.funcs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, f)| f.as_ref())
    }

    /// Child keys in registration order
    pub fn keys(&self) -> Vec<&str> {
        self.funcs.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Set the filter applied to every child without one of its own
    pub fn set_filter(&mut self, filter: Option<String>) {
        self.context.filter = filter;
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.set_filter(Some(filter.into()));
        self
    }

    pub fn filter(&self) -> Option<&str> {
        self.context.filter.as_deref()
    }

    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    /// Filter the child under `key` will read with
    pub fn child_filter(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|f| f.filter(&self.context))
    }

    /// Deduplicated union of every child's column names
    pub fn columns(&self) -> Result<Vec<String>> {
        let mut columns = Vec::new();
        for (_, functor) in &self.funcs {
            for col in functor.columns()? {
                if !columns.contains(&col) {
                    columns.push(col);
                }
            }
        }
        Ok(columns)
    }

    /// Deduplicated union of every child's resolved keys
    pub fn resolve_columns(&self, table: &dyn ColumnTable) -> Result<Vec<ColumnKey>> {
        let mut keys = Vec::new();
        for (_, functor) in &self.funcs {
            keys.extend(functor.resolve_columns(table, &self.context)?);
        }
        Ok(dedup_keys(keys))
    }

    /// Evaluate every child into one result frame
    pub fn evaluate(&self, table: &dyn ColumnTable, drop_missing: bool) -> Result<ResultFrame> {
        Ok(self.evaluate_detailed(table, drop_missing)?.frame)
    }

    /// Evaluate every child, also reporting which columns were substituted
    pub fn evaluate_detailed(
        &self,
        table: &dyn ColumnTable,
        drop_missing: bool,
    ) -> Result<CompositeResult> {
        let child_keys = self
            .funcs
            .iter()
            .map(|(_, functor)| functor.resolve_columns(table, &self.context))
            .collect::<Result<Vec<_>>>()?;

        let union = dedup_keys(child_keys.iter().flatten().cloned());
        debug!(
            functors = self.funcs.len(),
            columns = union.len(),
            "Loading composite columns"
        );
        let loaded = table.load(&union)?;

        let mut frame = ResultFrame::new(loaded.index().clone());
        let mut failures = Vec::new();
        for ((key, functor), keys) in self.funcs.iter().zip(&child_keys) {
            let sub = loaded.select(keys)?.retain_levels(functor.frame_levels());
            let outcome = functor.outcome(&sub);
            if let ColumnOutcome::Substituted { reason, .. } = &outcome {
                failures.push(ColumnFailure {
                    name: key.clone(),
                    reason: reason.clone(),
                });
            }
            frame.push(outcome.into_column().with_name(key.clone()))?;
        }

        if drop_missing {
            frame = frame.drop_missing()?;
        }
        Ok(CompositeResult { frame, failures })
    }
}
