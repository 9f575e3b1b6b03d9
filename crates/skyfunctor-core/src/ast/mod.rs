//! Abstract Syntax Tree (AST) definitions for skyfunctor
//!
//! This module contains the AST node definitions for:
//! - Arithmetic expressions (custom functors)
//! - Declarative functor specifications

pub mod expression;
pub mod operator;
pub mod spec;

pub use expression::{Expression, UnaryOperator};
pub use operator::Operator;
pub use spec::{rename_column, CompositeSpec, FunctorSpec, RenameRule};
