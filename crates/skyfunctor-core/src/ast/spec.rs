//! Declarative functor specification AST
//!
//! A specification names a set of functors (type identifier plus constructor
//! arguments), optional flag rename rules, and flat flag lists pulled from the
//! reference and measurement datasets.

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One named functor entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctorSpec {
    /// Result column key
    pub name: String,

    /// Functor type identifier (e.g., "Mag", "Column")
    pub functor: String,

    /// Positional constructor arguments
    #[serde(default)]
    pub args: Vec<Value>,

    /// Keyword constructor arguments
    #[serde(default)]
    pub kwargs: BTreeMap<String, Value>,
}

impl FunctorSpec {
    pub fn new(name: impl Into<String>, functor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functor: functor.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

/// Ordered prefix substitution applied to flag names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRule {
    pub old: String,
    pub new: String,
}

impl RenameRule {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Apply rename rules in order: a rule fires when the current name starts
/// with its prefix, and then replaces every occurrence of that prefix
pub fn rename_column(col: &str, rules: &[RenameRule]) -> String {
    let mut col = col.to_string();
    for rule in rules {
        if col.starts_with(&rule.old) {
            col = col.replace(&rule.old, &rule.new);
        }
    }
    col
}

/// Complete composite specification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeSpec {
    /// Functor entries in declaration order
    #[serde(default)]
    pub funcs: Vec<FunctorSpec>,

    #[serde(default)]
    pub flag_rename_rules: Vec<RenameRule>,

    /// Flags read from the reference dataset
    #[serde(default)]
    pub ref_flags: Vec<String>,

    /// Flags read from the measurement dataset
    #[serde(default)]
    pub flags: Vec<String>,

    /// Optional configuration overrides
    #[serde(default)]
    pub config: Option<Value>,
}

impl CompositeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_func(mut self, func: FunctorSpec) -> Self {
        self.funcs.push(func);
        self
    }

    /// Look up a functor entry by name
    pub fn func(&self, name: &str) -> Option<&FunctorSpec> {
        self.funcs.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_rules_apply_in_order() {
        let rules = vec![
            RenameRule::new("base_PixelFlags", "pixelFlags"),
            RenameRule::new("pixelFlags_flag", "pixelFlags"),
        ];
        assert_eq!(
            rename_column("base_PixelFlags_flag_saturated", &rules),
            "pixelFlags_saturated"
        );
        assert_eq!(rename_column("detect_isPrimary", &rules), "detect_isPrimary");
    }

    #[test]
    fn test_rename_requires_prefix() {
        let rules = vec![RenameRule::new("flag", "f")];
        assert_eq!(rename_column("base_flag", &rules), "base_flag");
        assert_eq!(rename_column("flag_flag", &rules), "f_f");
    }
}
