//! Functor specification parser
//!
//! Parses YAML functor specifications into `CompositeSpec` AST nodes.
//!
//! Expected shape:
//! ```yaml
//! funcs:
//!   psfMag:
//!     functor: Mag
//!     args: [base_PsfFlux]
//!     filt: HSC-G
//! flag_rename_rules:
//!   - [base_Pixel, pixel]
//! refFlags: [detect_isPrimary]
//! flags: [base_PixelFlags_flag_saturated]
//! ```

use crate::error::{ParseError, Result};
use crate::yaml_parser::YamlParser;
use serde_yaml::Value as YamlValue;
use skyfunctor_core::ast::{CompositeSpec, FunctorSpec, RenameRule};
use skyfunctor_core::Value;
use std::collections::BTreeMap;
use std::path::Path;

const TYPE_KEY: &str = "functor";
const ARGS_KEY: &str = "args";

/// Specification parser
pub struct SpecParser;

impl SpecParser {
    /// Parse a specification from a YAML string
    pub fn parse(yaml_str: &str) -> Result<CompositeSpec> {
        let yaml = YamlParser::parse(yaml_str)?;
        Self::parse_from_yaml(&yaml)
    }

    /// Parse a specification file
    pub fn parse_file(path: impl AsRef<Path>) -> Result<CompositeSpec> {
        let yaml = YamlParser::parse_file(path)?;
        Self::parse_from_yaml(&yaml)
    }

    /// Parse a specification from a YAML value
    pub fn parse_from_yaml(yaml: &YamlValue) -> Result<CompositeSpec> {
        if !yaml.is_mapping() {
            return Err(ParseError::InvalidValue {
                field: "<root>".to_string(),
                message: "specification must be a mapping".to_string(),
            });
        }

        let funcs_yaml = yaml
            .get("funcs")
            .ok_or_else(|| ParseError::MissingField {
                field: "funcs".to_string(),
            })?;

        let funcs = match funcs_yaml {
            YamlValue::Null => Vec::new(),
            YamlValue::Mapping(mapping) => mapping
                .iter()
                .map(|(key, value)| {
                    let name = YamlParser::key_string(key)?;
                    Self::parse_functor(&name, value)
                })
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(ParseError::InvalidValue {
                    field: "funcs".to_string(),
                    message: "expected a mapping of functor name to definition".to_string(),
                })
            }
        };

        let flag_rename_rules = Self::parse_rename_rules(yaml)?;
        let ref_flags = YamlParser::get_optional_string_list(yaml, "refFlags")?;
        let flags = YamlParser::get_optional_string_list(yaml, "flags")?;
        let config = yaml.get("config").map(YamlParser::to_value).transpose()?;

        log::debug!(
            "Parsed specification: {} funcs, {} rename rules, {} ref flags, {} flags",
            funcs.len(),
            flag_rename_rules.len(),
            ref_flags.len(),
            flags.len()
        );

        Ok(CompositeSpec {
            funcs,
            flag_rename_rules,
            ref_flags,
            flags,
            config,
        })
    }

    /// Parse a single functor entry
    fn parse_functor(name: &str, yaml: &YamlValue) -> Result<FunctorSpec> {
        let mapping = yaml.as_mapping().ok_or_else(|| ParseError::InvalidValue {
            field: format!("funcs.{}", name),
            message: "functor definition must be a mapping".to_string(),
        })?;

        let functor = YamlParser::get_string(yaml, TYPE_KEY).map_err(|_| ParseError::MissingField {
            field: format!("funcs.{}.{}", name, TYPE_KEY),
        })?;

        // A bare string is a single positional argument
        let args = match yaml.get(ARGS_KEY) {
            None | Some(YamlValue::Null) => Vec::new(),
            Some(YamlValue::Sequence(items)) => items
                .iter()
                .map(YamlParser::to_value)
                .collect::<Result<Vec<_>>>()?,
            Some(other) => vec![YamlParser::to_value(other)?],
        };

        let mut kwargs = BTreeMap::new();
        for (key, value) in mapping {
            let key = YamlParser::key_string(key)?;
            if key == TYPE_KEY || key == ARGS_KEY {
                continue;
            }
            kwargs.insert(key, YamlParser::to_value(value)?);
        }

        Ok(FunctorSpec {
            name: name.to_string(),
            functor,
            args,
            kwargs,
        })
    }

    /// Parse `flag_rename_rules` as an ordered list of `[old, new]` pairs
    fn parse_rename_rules(yaml: &YamlValue) -> Result<Vec<RenameRule>> {
        let Some(rules) = yaml.get("flag_rename_rules") else {
            return Ok(Vec::new());
        };
        if rules.is_null() {
            return Ok(Vec::new());
        }

        let seq = rules.as_sequence().ok_or_else(|| ParseError::InvalidValue {
            field: "flag_rename_rules".to_string(),
            message: "expected a list of [old, new] pairs".to_string(),
        })?;

        seq.iter()
            .enumerate()
            .map(|(i, rule)| {
                let pair = YamlParser::to_value(rule)?;
                match pair.as_array() {
                    Some([Value::String(old), Value::String(new)]) => {
                        Ok(RenameRule::new(old.clone(), new.clone()))
                    }
                    _ => Err(ParseError::InvalidValue {
                        field: format!("flag_rename_rules[{}]", i),
                        message: format!("expected [old, new], got {}", pair),
                    }),
                }
            })
            .collect()
    }
}
