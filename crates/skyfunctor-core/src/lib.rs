//! skyfunctor Core - Core types for the skyfunctor column-computation layer
//!
//! This crate provides the fundamental types used across the skyfunctor crates:
//! - Column keys and column levels (filter / dataset / column)
//! - Column values, loaded frames and result frames
//! - The `ColumnTable` capability trait with flat and leveled in-memory tables
//! - AST definitions for arithmetic expressions and declarative functor specifications
//! - Error types

pub mod ast;
pub mod column;
pub mod error;
pub mod frame;
pub mod table;
pub mod types;

// Re-export commonly used types
pub use column::{Categorical, Column, ColumnValues, RowIndex};
pub use error::{CoreError, Result};
pub use frame::{Frame, ResultFrame};
pub use table::{ColumnKey, ColumnSelection, ColumnTable, FlatTable, Level, LeveledTable};
pub use types::Value;
