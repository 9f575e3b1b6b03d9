//! skyfunctor Parser - YAML and expression parsers for skyfunctor
//!
//! This crate converts declarative YAML functor specifications into
//! `CompositeSpec` AST structures, and free-form arithmetic expressions into
//! `Expression` trees.

pub mod error;
pub mod expression_parser;
pub mod expression_scanner;
pub mod spec_parser;
pub mod yaml_parser;

// Re-export main parser types
pub use error::{ParseError, Result};
pub use expression_parser::ExpressionParser;
pub use expression_scanner::{flux_err_name, flux_name, ExpressionScanner, FLUX_ERR_SUFFIX, FLUX_SUFFIX};
pub use spec_parser::SpecParser;
pub use yaml_parser::YamlParser;
