//! Runtime error types
//!
//! `RuntimeError` covers configuration mistakes and bulk-load failures; both
//! abort evaluation. `ComputeError` covers failures of a single functor's
//! transform over already-loaded data; those are contained per column.

use skyfunctor_core::CoreError;
use skyfunctor_parser::ParseError;
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A functor subtype did not provide a required override
    #[error("Functor '{functor}' must define {what}")]
    NotImplemented { functor: String, what: String },

    /// Table column levels differ from what the functor expects
    #[error(
        "Table for functor '{functor}' does not have the expected column levels. Got {actual}; expected {expected}."
    )]
    ColumnLevelMismatch {
        functor: String,
        expected: String,
        actual: String,
    },

    /// Filter unset on a non-reference dataset while the table holds several filters
    #[error(
        "'filt' not set for functor {functor} (dataset {dataset}) and the table contains multiple filters in its column index ({filters}). Set 'filt' or set 'dataset' to 'ref'."
    )]
    AmbiguousFilterContext {
        functor: String,
        dataset: String,
        filters: String,
    },

    /// Type identifier missing from the registry
    #[error("Unknown functor type '{functor_type}' for functor \"{name}\"")]
    UnknownFunctorType { name: String, functor_type: String },

    /// Factory rejected its arguments
    #[error("Error in constructing functor \"{name}\" of type {functor_type} with args: {args}: {source}")]
    Construction {
        name: String,
        functor_type: String,
        args: String,
        #[source]
        source: Box<RuntimeError>,
    },

    /// Bad constructor argument
    #[error("Invalid argument for {functor}: {message}")]
    InvalidArgument { functor: String, message: String },

    /// Functor does not support differencing
    #[error("Functor '{0}' does not allow differences")]
    DifferenceNotAllowed(String),

    /// Row indexes of two evaluations differ
    #[error("Row index mismatch: {0}")]
    IndexMismatch(String),

    /// Table access or bulk load failure
    #[error("Table error: {0}")]
    Table(#[from] CoreError),

    /// Specification parsing failure
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure of one functor's transform
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Expression error: {0}")]
    Expression(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ComputeError {
    /// Lift a core error, keeping missing columns distinguishable
    pub fn from_core(err: CoreError) -> Self {
        match err {
            CoreError::ColumnNotFound(name) => ComputeError::MissingColumn(name),
            other => ComputeError::Core(other),
        }
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Result type for a single transform
pub type ComputeResult<T> = std::result::Result<T, ComputeError>;
