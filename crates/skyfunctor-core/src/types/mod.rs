//! Value types used by declarative functor specifications

pub mod value;

pub use value::Value;
