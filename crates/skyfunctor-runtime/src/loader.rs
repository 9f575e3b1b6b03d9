//! Specification loader
//!
//! Turns a parsed `CompositeSpec` into a `CompositeFunctor`: every entry is
//! built through the registry, then the reference and measurement flag lists
//! are appended as plain column functors keyed by their renamed flag names.

use crate::composite::CompositeFunctor;
use crate::config::FunctorConfig;
use crate::error::Result;
use crate::functor::{WithSettings, REFERENCE_DATASET};
use crate::library::ColumnFunctor;
use crate::registry::FunctorRegistry;
use skyfunctor_core::ast::{rename_column, CompositeSpec};
use tracing::{debug, info};

/// Dataset the plain `flags` list is read from
pub const MEASUREMENT_DATASET: &str = "meas";

/// Builds composites from specifications
#[derive(Debug, Clone)]
pub struct FunctorLoader {
    registry: FunctorRegistry,
    config: FunctorConfig,
}

impl Default for FunctorLoader {
    fn default() -> Self {
        Self::new(FunctorRegistry::with_builtins(), FunctorConfig::default())
    }
}

impl FunctorLoader {
    pub fn new(registry: FunctorRegistry, config: FunctorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &FunctorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FunctorRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &FunctorConfig {
        &self.config
    }

    /// Build every functor the specification names
    pub fn load(&self, spec: &CompositeSpec) -> Result<CompositeFunctor> {
        let config = match &spec.config {
            Some(overrides) => self.config.merged(overrides)?,
            None => self.config.clone(),
        };

        let mut composite = CompositeFunctor::new();
        for entry in &spec.funcs {
            debug!(name = %entry.name, functor_type = %entry.functor, "Building functor");
            composite.insert(entry.name.clone(), self.registry.build(entry, &config)?);
        }

        let flag_sets = [
            (&spec.ref_flags, REFERENCE_DATASET),
            (&spec.flags, MEASUREMENT_DATASET),
        ];
        for (flags, dataset) in flag_sets {
            for flag in flags {
                let key = rename_column(flag, &spec.flag_rename_rules);
                composite.insert(key, Box::new(ColumnFunctor::new(flag.as_str()).with_dataset(dataset)));
            }
        }

        info!(
            functors = spec.funcs.len(),
            ref_flags = spec.ref_flags.len(),
            flags = spec.flags.len(),
            columns = composite.len(),
            "Loaded functor specification"
        );
        Ok(composite)
    }
}
