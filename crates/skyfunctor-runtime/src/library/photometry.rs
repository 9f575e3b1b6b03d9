//! Flux to magnitude conversions with a global calibration
//!
//! `Mag`, `MagErr` and `NanoMaggie` use a single flux-at-magnitude-zero
//! (`fluxMag0`) for every row. `Photometry` is the nanojansky-based family
//! calibrated against the coadd zero point. Magnitudes of non-positive fluxes
//! are NaN.

use crate::error::{ComputeError, ComputeResult, Result, RuntimeError};
use crate::functor::{floats, resolve_keys, EvalContext, Functor, FunctorSettings, WithSettings};
use skyfunctor_core::table::format_levels;
use skyfunctor_core::{ColumnKey, ColumnTable, ColumnValues, Frame, Level, Value};
use skyfunctor_parser::flux_name;
use std::f64::consts::LN_10;

/// AB zero point in nanojansky (3631 Jy)
pub const AB_FLUX_SCALE: f64 = 3.630780547701003e12;

/// 2.5 / ln(10)
pub const FIVE_OVER_2LOG10: f64 = 1.085736204758129569;

/// Photometric zero point: flux at magnitude zero and its uncertainty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub flux_mag0: f64,
    pub flux_mag0_err: f64,
}

impl Calibration {
    pub fn new(flux_mag0: f64, flux_mag0_err: f64) -> Self {
        Self {
            flux_mag0,
            flux_mag0_err,
        }
    }

    /// Calibration of a magnitude zero point, with no uncertainty
    pub fn from_zero_point(zero_point: f64) -> Self {
        Self::new(10f64.powf(0.4 * zero_point), 0.0)
    }

    /// Read `{fluxMag0, fluxMag0Err}` from a specification value
    pub fn from_value(value: &Value) -> Result<Self> {
        let invalid = |message: String| RuntimeError::InvalidArgument {
            functor: "calib".to_string(),
            message,
        };

        let fields = value
            .as_object()
            .ok_or_else(|| invalid(format!("expected a mapping, got {}", value)))?;
        let flux_mag0 = fields
            .get("fluxMag0")
            .and_then(Value::as_f64)
            .ok_or_else(|| invalid("fluxMag0 must be a number".to_string()))?;
        let flux_mag0_err = match fields.get("fluxMag0Err") {
            None | Some(Value::Null) => 0.0,
            Some(v) => v
                .as_f64()
                .ok_or_else(|| invalid("fluxMag0Err must be a number".to_string()))?,
        };

        if flux_mag0 <= 0.0 {
            return Err(invalid(format!("fluxMag0 must be positive, got {}", flux_mag0)));
        }
        Ok(Self::new(flux_mag0, flux_mag0_err))
    }
}

/// `-2.5 log10(flux / flux_mag0)`, NaN for non-positive flux
fn flux_to_mag(flux: f64, flux_mag0: f64) -> f64 {
    if flux > 0.0 {
        -2.5 * (flux / flux_mag0).log10()
    } else {
        f64::NAN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MagKind {
    Mag,
    MagErr,
    NanoMaggie,
}

/// Calibrated magnitude of one flux column
///
/// `col` may be given without the `_instFlux` suffix.
#[derive(Debug, Clone)]
pub struct Mag {
    kind: MagKind,
    col: String,
    calib: Calibration,
    settings: FunctorSettings,
}

impl Mag {
    pub fn new(col: &str, calib: Calibration) -> Self {
        Self::with_kind(MagKind::Mag, col, calib)
    }

    /// Magnitude uncertainty; also reads `<col>Err`
    pub fn err(col: &str, calib: Calibration) -> Self {
        Self::with_kind(MagKind::MagErr, col, calib)
    }

    /// Flux in nanomaggies
    pub fn nano_maggie(col: &str, calib: Calibration) -> Self {
        Self::with_kind(MagKind::NanoMaggie, col, calib)
    }

    fn with_kind(kind: MagKind, col: &str, calib: Calibration) -> Self {
        Self {
            kind,
            col: flux_name(col),
            calib,
            settings: FunctorSettings::default(),
        }
    }

    pub fn col(&self) -> &str {
        &self.col
    }

    fn err_col(&self) -> String {
        format!("{}Err", self.col)
    }
}

impl Functor for Mag {
    fn name(&self) -> String {
        match self.kind {
            MagKind::MagErr => format!("mag_{}_err", self.col),
            MagKind::Mag | MagKind::NanoMaggie => format!("mag_{}", self.col),
        }
    }

    fn columns(&self) -> Result<Vec<String>> {
        match self.kind {
            MagKind::MagErr => Ok(vec![self.col.clone(), self.err_col()]),
            MagKind::Mag | MagKind::NanoMaggie => Ok(vec![self.col.clone()]),
        }
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn default_dataset(&self) -> &str {
        "meas"
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let flux = floats(frame, &self.col)?;
        let Calibration {
            flux_mag0,
            flux_mag0_err,
        } = self.calib;

        let values: Vec<f64> = match self.kind {
            MagKind::Mag => flux.iter().map(|&f| flux_to_mag(f, flux_mag0)).collect(),
            MagKind::NanoMaggie => flux.iter().map(|&f| f / flux_mag0 * 1e9).collect(),
            MagKind::MagErr => {
                let err = floats(frame, &self.err_col())?;
                let y = flux_mag0_err / flux_mag0;
                flux.iter()
                    .zip(&err)
                    .map(|(&f, &e)| {
                        let x = e / f;
                        (2.5 / LN_10) * (x * x + y * y).sqrt()
                    })
                    .collect()
            }
        };
        Ok(values.into())
    }
}

impl WithSettings for Mag {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

/// Magnitude difference between two flux columns
#[derive(Debug, Clone)]
pub struct MagDiff {
    col1: String,
    col2: String,
    settings: FunctorSettings,
}

impl MagDiff {
    pub fn new(col1: &str, col2: &str) -> Self {
        Self {
            col1: flux_name(col1),
            col2: flux_name(col2),
            settings: FunctorSettings::default(),
        }
    }
}

impl Functor for MagDiff {
    fn name(&self) -> String {
        format!("(mag_{} - mag_{})", self.col1, self.col2)
    }

    fn shortname(&self) -> String {
        format!("magDiff_{}_{}", self.col1, self.col2)
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(vec![self.col1.clone(), self.col2.clone()])
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn default_dataset(&self) -> &str {
        "meas"
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let f1 = floats(frame, &self.col1)?;
        let f2 = floats(frame, &self.col2)?;
        let values: Vec<f64> = f1
            .iter()
            .zip(&f2)
            .map(|(&a, &b)| {
                if a > 0.0 && b > 0.0 {
                    -2.5 * (a / b).log10()
                } else {
                    f64::NAN
                }
            })
            .collect();
        Ok(values.into())
    }
}

impl WithSettings for MagDiff {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

/// Color between two filters: `Mag(filt2) - Mag(filt1)`
///
/// Reads the same flux column from two filters, so it needs a table with a
/// filter level and keeps that level on the frame it computes on. The
/// evaluation filter context never applies.
#[derive(Debug, Clone)]
pub struct Color {
    col: String,
    filt2: String,
    filt1: String,
    mag2: Mag,
    mag1: Mag,
    settings: FunctorSettings,
}

impl Color {
    pub fn new(col: &str, filt2: &str, filt1: &str, calib: Calibration) -> Result<Self> {
        if filt2 == filt1 {
            return Err(RuntimeError::InvalidArgument {
                functor: "Color".to_string(),
                message: format!("Cannot compute Color for {}: {} - {}", col, filt2, filt1),
            });
        }

        Ok(Self {
            col: flux_name(col),
            filt2: filt2.to_string(),
            filt1: filt1.to_string(),
            mag2: Mag::new(col, calib).with_filter(filt2),
            mag1: Mag::new(col, calib).with_filter(filt1),
            settings: FunctorSettings::default(),
        })
    }

    fn filter_keys(&self, table: &dyn ColumnTable, ctx: &EvalContext, filter: &str) -> Result<Vec<ColumnKey>> {
        resolve_keys(
            &self.name(),
            self.column_levels(),
            table,
            Some(filter.to_string()),
            &self.dataset(ctx),
            vec![self.col.clone()],
        )
    }
}

impl Functor for Color {
    fn name(&self) -> String {
        format!("{} - {} ({})", self.filt2, self.filt1, self.col)
    }

    fn shortname(&self) -> String {
        format!(
            "{}_{}m{}",
            self.col,
            self.filt2.replace('-', ""),
            self.filt1.replace('-', "")
        )
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(vec![self.mag1.col().to_string(), self.mag2.col().to_string()])
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn default_dataset(&self) -> &str {
        "forced_src"
    }

    fn default_no_dup(&self) -> bool {
        true
    }

    fn frame_levels(&self) -> &[Level] {
        &[Level::Filter, Level::Column]
    }

    fn uses_filter_context(&self) -> bool {
        false
    }

    fn resolve_columns(&self, table: &dyn ColumnTable, ctx: &EvalContext) -> Result<Vec<ColumnKey>> {
        if !table.column_levels().contains(&Level::Filter) {
            return Err(RuntimeError::ColumnLevelMismatch {
                functor: self.name(),
                expected: format_levels(self.column_levels()),
                actual: format_levels(table.column_levels()),
            });
        }

        let mut keys = self.filter_keys(table, ctx, &self.filt1)?;
        keys.extend(self.filter_keys(table, ctx, &self.filt2)?);
        Ok(keys)
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let mag2 = self.mag2.compute(&frame.cross_section(Level::Filter, &self.filt2))?;
        let mag1 = self.mag1.compute(&frame.cross_section(Level::Filter, &self.filt1))?;

        let (ColumnValues::Float(mag2), ColumnValues::Float(mag1)) = (mag2, mag1) else {
            return Err(ComputeError::Domain("magnitudes must be floats".to_string()));
        };
        let values: Vec<f64> = mag2.iter().zip(&mag1).map(|(a, b)| a - b).collect();
        Ok(values.into())
    }
}

impl WithSettings for Color {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

/// Which quantity a `Photometry` functor produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotometryKind {
    NanoJansky,
    NanoJanskyErr,
    Magnitude,
    MagnitudeErr,
}

impl PhotometryKind {
    fn needs_error(&self) -> bool {
        matches!(self, PhotometryKind::NanoJanskyErr | PhotometryKind::MagnitudeErr)
    }
}

/// Nanojansky fluxes and AB magnitudes from instrumental counts
#[derive(Debug, Clone)]
pub struct Photometry {
    kind: PhotometryKind,
    col: String,
    col_err: Option<String>,
    calib: Calibration,
    settings: FunctorSettings,
}

impl Photometry {
    /// Error-producing kinds require `col_err`
    pub fn new(
        kind: PhotometryKind,
        col: impl Into<String>,
        col_err: Option<String>,
        calib: Calibration,
    ) -> Result<Self> {
        if kind.needs_error() && col_err.is_none() {
            return Err(RuntimeError::InvalidArgument {
                functor: format!("{:?}", kind),
                message: "colFluxErr is required".to_string(),
            });
        }
        Ok(Self {
            kind,
            col: col.into(),
            col_err,
            calib,
            settings: FunctorSettings::default(),
        })
    }

    pub fn dn_to_flux(dn: f64, flux_mag0: f64) -> f64 {
        AB_FLUX_SCALE * dn / flux_mag0
    }

    pub fn dn_to_mag(dn: f64, flux_mag0: f64) -> f64 {
        flux_to_mag(dn, flux_mag0)
    }

    pub fn dn_to_flux_err(dn: f64, dn_err: f64, flux_mag0: f64, flux_mag0_err: f64) -> f64 {
        (dn * flux_mag0_err).hypot(dn_err * flux_mag0) * AB_FLUX_SCALE / flux_mag0 / flux_mag0
    }

    pub fn dn_to_mag_err(dn: f64, dn_err: f64, flux_mag0: f64, flux_mag0_err: f64) -> f64 {
        let ratio = Self::dn_to_flux_err(dn, dn_err, flux_mag0, flux_mag0_err)
            / Self::dn_to_flux(dn, flux_mag0);
        FIVE_OVER_2LOG10 * ratio
    }
}

impl Functor for Photometry {
    fn name(&self) -> String {
        format!("mag_{}", self.col)
    }

    fn columns(&self) -> Result<Vec<String>> {
        let mut cols = vec![self.col.clone()];
        if self.kind.needs_error() {
            cols.extend(self.col_err.clone());
        }
        Ok(cols)
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let dn = floats(frame, &self.col)?;
        let Calibration {
            flux_mag0,
            flux_mag0_err,
        } = self.calib;

        let values: Vec<f64> = match (self.kind, &self.col_err) {
            (PhotometryKind::NanoJansky, _) => {
                dn.iter().map(|&d| Self::dn_to_flux(d, flux_mag0)).collect()
            }
            (PhotometryKind::Magnitude, _) => {
                dn.iter().map(|&d| Self::dn_to_mag(d, flux_mag0)).collect()
            }
            (PhotometryKind::NanoJanskyErr, Some(col_err)) => {
                let dn_err = floats(frame, col_err)?;
                dn.iter()
                    .zip(&dn_err)
                    .map(|(&d, &e)| Self::dn_to_flux_err(d, e, flux_mag0, flux_mag0_err))
                    .collect()
            }
            (PhotometryKind::MagnitudeErr, Some(col_err)) => {
                let dn_err = floats(frame, col_err)?;
                dn.iter()
                    .zip(&dn_err)
                    .map(|(&d, &e)| Self::dn_to_mag_err(d, e, flux_mag0, flux_mag0_err))
                    .collect()
            }
            (_, None) => {
                return Err(ComputeError::MissingColumn("colFluxErr".to_string()));
            }
        };
        Ok(values.into())
    }
}

impl WithSettings for Photometry {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}
