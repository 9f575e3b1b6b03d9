//! YAML Parser
//!
//! Provides utilities for parsing YAML content into structured data.

use crate::error::{ParseError, Result};
use serde_yaml::Value as YamlValue;
use skyfunctor_core::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// YAML parser utilities
pub struct YamlParser;

impl YamlParser {
    /// Parse YAML string into a YAML value
    pub fn parse(yaml_str: &str) -> Result<YamlValue> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    /// Read and parse a YAML file
    pub fn parse_file(path: impl AsRef<Path>) -> Result<YamlValue> {
        let path = path.as_ref();
        log::debug!("Reading YAML from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Get a required string field from YAML object
    pub fn get_string(obj: &YamlValue, field: &str) -> Result<String> {
        obj.get(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ParseError::MissingField {
                field: field.to_string(),
            })
    }

    /// Get an optional string field from YAML object
    pub fn get_optional_string(obj: &YamlValue, field: &str) -> Option<String> {
        obj.get(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Get an optional list of strings; any non-string element is an error
    pub fn get_optional_string_list(obj: &YamlValue, field: &str) -> Result<Vec<String>> {
        let Some(value) = obj.get(field) else {
            return Ok(Vec::new());
        };
        if value.is_null() {
            return Ok(Vec::new());
        }

        let seq = value.as_sequence().ok_or_else(|| ParseError::InvalidValue {
            field: field.to_string(),
            message: "expected a list of strings".to_string(),
        })?;

        seq.iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ParseError::InvalidValue {
                        field: format!("{}[{}]", field, i),
                        message: "expected a string".to_string(),
                    })
            })
            .collect()
    }

    /// Convert a YAML value into a specification argument value
    pub fn to_value(yaml: &YamlValue) -> Result<Value> {
        match yaml {
            YamlValue::Null => Ok(Value::Null),
            YamlValue::Bool(b) => Ok(Value::Bool(*b)),
            YamlValue::Number(n) => n.as_f64().map(Value::Number).ok_or_else(|| {
                ParseError::InvalidValue {
                    field: "number".to_string(),
                    message: format!("{} is not representable as f64", n),
                }
            }),
            YamlValue::String(s) => Ok(Value::String(s.clone())),
            YamlValue::Sequence(items) => Ok(Value::Array(
                items.iter().map(Self::to_value).collect::<Result<Vec<_>>>()?,
            )),
            YamlValue::Mapping(mapping) => {
                let mut map = BTreeMap::new();
                for (key, value) in mapping {
                    let key = Self::key_string(key)?;
                    map.insert(key, Self::to_value(value)?);
                }
                Ok(Value::Object(map))
            }
            YamlValue::Tagged(tagged) => Self::to_value(&tagged.value),
        }
    }

    /// Mapping keys must be strings (numbers are accepted and stringified)
    pub fn key_string(key: &YamlValue) -> Result<String> {
        match key {
            YamlValue::String(s) => Ok(s.clone()),
            YamlValue::Number(n) => Ok(n.to_string()),
            other => Err(ParseError::InvalidValue {
                field: "key".to_string(),
                message: format!("mapping keys must be strings, got {:?}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_value_nested() {
        let yaml = YamlParser::parse("calib: {fluxMag0: 1.0e10, fluxMag0Err: 0}\nargs: [a, 2]").unwrap();

        let calib = YamlParser::to_value(yaml.get("calib").unwrap()).unwrap();
        let calib = calib.as_object().unwrap();
        assert_eq!(calib.get("fluxMag0").and_then(Value::as_f64), Some(1.0e10));
        assert_eq!(calib.get("fluxMag0Err").and_then(Value::as_f64), Some(0.0));

        let args = YamlParser::to_value(yaml.get("args").unwrap()).unwrap();
        assert_eq!(args, Value::Array(vec![Value::from("a"), Value::Number(2.0)]));
    }

    #[test]
    fn test_string_list() {
        let yaml = YamlParser::parse("flags: [a, b]\nbad: [a, 1]\nempty:").unwrap();
        assert_eq!(
            YamlParser::get_optional_string_list(&yaml, "flags").unwrap(),
            vec!["a", "b"]
        );
        assert!(YamlParser::get_optional_string_list(&yaml, "bad").is_err());
        assert!(YamlParser::get_optional_string_list(&yaml, "empty").unwrap().is_empty());
        assert!(YamlParser::get_optional_string_list(&yaml, "absent").unwrap().is_empty());
    }

    #[test]
    fn test_get_string() {
        let yaml = YamlParser::parse("functor: Mag").unwrap();
        assert_eq!(YamlParser::get_string(&yaml, "functor").unwrap(), "Mag");
        assert!(matches!(
            YamlParser::get_string(&yaml, "args"),
            Err(ParseError::MissingField { .. })
        ));
    }
}
