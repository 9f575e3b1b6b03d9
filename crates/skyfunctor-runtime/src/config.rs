//! Functor library configuration
//!
//! Constants the library falls back on when a specification does not supply
//! them (zero points, pixel scale, label handling). Loadable from YAML and
//! mergeable with the optional `config:` block of a specification.

use crate::error::{Result, RuntimeError};
use serde::{Deserialize, Serialize};
use skyfunctor_core::Value;
use skyfunctor_parser::ParseError;
use std::path::Path;

/// Default flux at magnitude zero for `Mag`-family functors
pub const DEFAULT_FLUX_MAG0: f64 = 63095734448.0194;

/// Default coadd zero point for the `Photometry` family
pub const DEFAULT_COADD_ZERO_POINT: f64 = 27.0;

/// Default HSM pixel scale, arcsec per pixel
pub const DEFAULT_HSM_PIXEL_SCALE: f64 = 0.168;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctorConfig {
    /// Emit labeller output as plain text instead of categorical
    pub force_str_labels: bool,

    /// Label assigned to rows with missing input
    pub null_label: String,

    pub default_flux_mag0: f64,

    pub coadd_zero_point: f64,

    pub hsm_pixel_scale: f64,

    /// Extendedness below this value labels a star
    pub star_galaxy_threshold: f64,
}

impl Default for FunctorConfig {
    fn default() -> Self {
        Self {
            force_str_labels: false,
            null_label: "null".to_string(),
            default_flux_mag0: DEFAULT_FLUX_MAG0,
            coadd_zero_point: DEFAULT_COADD_ZERO_POINT,
            hsm_pixel_scale: DEFAULT_HSM_PIXEL_SCALE,
            star_galaxy_threshold: 0.5,
        }
    }
}

impl FunctorConfig {
    /// Parse configuration from YAML; absent fields keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ParseError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Overlay a `config:` block onto this configuration
    pub fn merged(&self, overrides: &Value) -> Result<Self> {
        let fields = overrides
            .as_object()
            .ok_or_else(|| RuntimeError::Config(format!(
                "config block must be a mapping, got {}",
                overrides.type_name()
            )))?;

        let mut base = serde_json::to_value(self).map_err(|e| RuntimeError::Config(e.to_string()))?;
        if let Some(base_fields) = base.as_object_mut() {
            for (key, value) in fields {
                let value =
                    serde_json::to_value(value).map_err(|e| RuntimeError::Config(e.to_string()))?;
                base_fields.insert(key.clone(), value);
            }
        }

        let config: Self =
            serde_json::from_value(base).map_err(|e| RuntimeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_force_str_labels(mut self, force: bool) -> Self {
        self.force_str_labels = force;
        self
    }

    pub fn with_null_label(mut self, label: impl Into<String>) -> Self {
        self.null_label = label.into();
        self
    }

    pub fn with_default_flux_mag0(mut self, flux_mag0: f64) -> Self {
        self.default_flux_mag0 = flux_mag0;
        self
    }

    pub fn with_coadd_zero_point(mut self, zero_point: f64) -> Self {
        self.coadd_zero_point = zero_point;
        self
    }

    pub fn with_hsm_pixel_scale(mut self, pixel_scale: f64) -> Self {
        self.hsm_pixel_scale = pixel_scale;
        self
    }

    pub fn with_star_galaxy_threshold(mut self, threshold: f64) -> Self {
        self.star_galaxy_threshold = threshold;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.default_flux_mag0.is_finite() || self.default_flux_mag0 <= 0.0 {
            return Err(RuntimeError::Config(format!(
                "default_flux_mag0 must be positive, got {}",
                self.default_flux_mag0
            )));
        }
        if !self.hsm_pixel_scale.is_finite() || self.hsm_pixel_scale <= 0.0 {
            return Err(RuntimeError::Config(format!(
                "hsm_pixel_scale must be positive, got {}",
                self.hsm_pixel_scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_defaults() {
        let config = FunctorConfig::default();
        assert_eq!(config.null_label, "null");
        assert_eq!(config.default_flux_mag0, DEFAULT_FLUX_MAG0);
        assert_eq!(config.coadd_zero_point, 27.0);
        assert!(!config.force_str_labels);
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = FunctorConfig::from_yaml_str("force_str_labels: true\nhsm_pixel_scale: 0.2").unwrap();
        assert!(config.force_str_labels);
        assert_eq!(config.hsm_pixel_scale, 0.2);
        assert_eq!(config.star_galaxy_threshold, 0.5);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(FunctorConfig::from_yaml_str("pixel_scale: 0.2").is_err());
    }

    #[test]
    fn test_merged() {
        let mut overrides = BTreeMap::new();
        overrides.insert("null_label".to_string(), Value::from("unknown"));
        overrides.insert("coadd_zero_point".to_string(), Value::Number(31.4));

        let merged = FunctorConfig::default().merged(&Value::Object(overrides)).unwrap();
        assert_eq!(merged.null_label, "unknown");
        assert_eq!(merged.coadd_zero_point, 31.4);
        assert_eq!(merged.default_flux_mag0, DEFAULT_FLUX_MAG0);

        assert!(FunctorConfig::default().merged(&Value::from("x")).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(FunctorConfig::from_yaml_str("default_flux_mag0: -1").is_err());
        assert!(FunctorConfig::from_yaml_str("hsm_pixel_scale: 0").is_err());
    }
}
