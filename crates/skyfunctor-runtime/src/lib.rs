//! skyfunctor Runtime - Functor evaluation over catalog tables
//!
//! This crate evaluates functors (named single-column computations) against
//! `ColumnTable` implementations:
//! - The `Functor` trait with column resolution and contained failures
//! - `CompositeFunctor` for many functors over one bulk load
//! - `CustomFunctor` for free-form arithmetic expressions
//! - The built-in functor library and the `FunctorRegistry` naming it
//! - `FunctorLoader` for declarative YAML specifications

pub mod composite;
pub mod config;
pub mod error;
pub mod expression;
pub mod functor;
pub mod library;
pub mod loader;
pub mod registry;

// Re-export main types
pub use composite::{ColumnFailure, CompositeFunctor, CompositeResult};
pub use config::FunctorConfig;
pub use error::{ComputeError, ComputeResult, Result, RuntimeError};
pub use expression::{CustomFunctor, ExpressionEvaluator};
pub use functor::{ColumnOutcome, EvalContext, Functor, FunctorSettings, WithSettings};
pub use loader::FunctorLoader;
pub use registry::{FunctorArgs, FunctorFactory, FunctorRegistry};

// Re-export the table layer so hosts need only this crate
pub use skyfunctor_core::{
    Column, ColumnKey, ColumnTable, ColumnValues, FlatTable, Level, LeveledTable, ResultFrame,
};
