//! Per-row calibration: local photometry and local WCS
//!
//! Both families read their calibration from columns stored next to the
//! measurement instead of a single global object.

use crate::error::{ComputeResult, Result};
use crate::functor::{floats, Functor, FunctorSettings, WithSettings};
use skyfunctor_core::{ColumnValues, Frame};
use std::f64::consts::LN_10;

/// AB magnitude of 1 nJy
pub const LOG_NJANSKY_TO_AB: f64 = 31.4;

/// Which quantity a `LocalPhotometry` functor produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalPhotometryKind {
    Nanojansky,
    NanojanskyErr,
    Magnitude,
    MagnitudeErr,
}

/// Calibrated fluxes and magnitudes from a per-row calibration column
#[derive(Debug, Clone)]
pub struct LocalPhotometry {
    kind: LocalPhotometryKind,
    inst_flux_col: String,
    inst_flux_err_col: String,
    photo_calib_col: String,
    photo_calib_err_col: String,
    settings: FunctorSettings,
}

impl LocalPhotometry {
    pub fn new(
        kind: LocalPhotometryKind,
        inst_flux_col: impl Into<String>,
        inst_flux_err_col: impl Into<String>,
        photo_calib_col: impl Into<String>,
        photo_calib_err_col: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            inst_flux_col: inst_flux_col.into(),
            inst_flux_err_col: inst_flux_err_col.into(),
            photo_calib_col: photo_calib_col.into(),
            photo_calib_err_col: photo_calib_err_col.into(),
            settings: FunctorSettings::default(),
        }
    }

    pub fn inst_flux_to_nanojansky(inst_flux: f64, local_calib: f64) -> f64 {
        inst_flux * local_calib
    }

    pub fn inst_flux_err_to_nanojansky_err(
        inst_flux: f64,
        inst_flux_err: f64,
        local_calib: f64,
        local_calib_err: f64,
    ) -> f64 {
        (inst_flux_err * local_calib).hypot(inst_flux * local_calib_err)
    }

    pub fn inst_flux_to_magnitude(inst_flux: f64, local_calib: f64) -> f64 {
        let flux = Self::inst_flux_to_nanojansky(inst_flux, local_calib);
        if flux > 0.0 {
            -2.5 * flux.log10() + LOG_NJANSKY_TO_AB
        } else {
            f64::NAN
        }
    }

    pub fn inst_flux_err_to_magnitude_err(
        inst_flux: f64,
        inst_flux_err: f64,
        local_calib: f64,
        local_calib_err: f64,
    ) -> f64 {
        let err = Self::inst_flux_err_to_nanojansky_err(
            inst_flux,
            inst_flux_err,
            local_calib,
            local_calib_err,
        );
        2.5 / LN_10 * err / Self::inst_flux_to_nanojansky(inst_flux, local_calib)
    }

    fn needs_errors(&self) -> bool {
        matches!(
            self.kind,
            LocalPhotometryKind::NanojanskyErr | LocalPhotometryKind::MagnitudeErr
        )
    }
}

impl Functor for LocalPhotometry {
    fn name(&self) -> String {
        let prefix = match self.kind {
            LocalPhotometryKind::Nanojansky => "flux",
            LocalPhotometryKind::NanojanskyErr => "fluxErr",
            LocalPhotometryKind::Magnitude => "mag",
            LocalPhotometryKind::MagnitudeErr => "magErr",
        };
        format!("{}_{}", prefix, self.inst_flux_col)
    }

    fn columns(&self) -> Result<Vec<String>> {
        if self.needs_errors() {
            Ok(vec![
                self.inst_flux_col.clone(),
                self.inst_flux_err_col.clone(),
                self.photo_calib_col.clone(),
                self.photo_calib_err_col.clone(),
            ])
        } else {
            Ok(vec![self.inst_flux_col.clone(), self.photo_calib_col.clone()])
        }
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let flux = floats(frame, &self.inst_flux_col)?;
        let calib = floats(frame, &self.photo_calib_col)?;

        let values: Vec<f64> = match self.kind {
            LocalPhotometryKind::Nanojansky => flux
                .iter()
                .zip(&calib)
                .map(|(&f, &c)| Self::inst_flux_to_nanojansky(f, c))
                .collect(),
            LocalPhotometryKind::Magnitude => flux
                .iter()
                .zip(&calib)
                .map(|(&f, &c)| Self::inst_flux_to_magnitude(f, c))
                .collect(),
            LocalPhotometryKind::NanojanskyErr | LocalPhotometryKind::MagnitudeErr => {
                let flux_err = floats(frame, &self.inst_flux_err_col)?;
                let calib_err = floats(frame, &self.photo_calib_err_col)?;
                let convert: fn(f64, f64, f64, f64) -> f64 = if self.kind == LocalPhotometryKind::NanojanskyErr {
                    Self::inst_flux_err_to_nanojansky_err
                } else {
                    Self::inst_flux_err_to_magnitude_err
                };
                (0..flux.len())
                    .map(|i| convert(flux[i], flux_err[i], calib[i], calib_err[i]))
                    .collect()
            }
        };
        Ok(values.into())
    }
}

impl WithSettings for LocalPhotometry {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

/// Names of the four local affine (CD matrix) columns
#[derive(Debug, Clone, PartialEq)]
pub struct LocalWcs {
    pub cd_1_1: String,
    pub cd_1_2: String,
    pub cd_2_1: String,
    pub cd_2_2: String,
}

impl LocalWcs {
    pub fn new(
        cd_1_1: impl Into<String>,
        cd_1_2: impl Into<String>,
        cd_2_1: impl Into<String>,
        cd_2_2: impl Into<String>,
    ) -> Self {
        Self {
            cd_1_1: cd_1_1.into(),
            cd_1_2: cd_1_2.into(),
            cd_2_1: cd_2_1.into(),
            cd_2_2: cd_2_2.into(),
        }
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.cd_1_1.clone(),
            self.cd_1_2.clone(),
            self.cd_2_1.clone(),
            self.cd_2_2.clone(),
        ]
    }

    /// Pixel offset to (ra, dec) offset in radians
    pub fn compute_delta_ra_dec(x: f64, y: f64, cd: [f64; 4]) -> (f64, f64) {
        let [cd11, cd12, cd21, cd22] = cd;
        (x * cd11 + y * cd12, x * cd21 + y * cd22)
    }

    /// Great-circle distance in radians (haversine)
    pub fn compute_sky_separation(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
        let delta_dec = dec2 - dec1;
        let delta_ra = ra2 - ra1;
        2.0 * ((delta_dec / 2.0).sin().powi(2)
            + dec2.cos() * dec1.cos() * (delta_ra / 2.0).sin().powi(2))
        .sqrt()
        .asin()
    }

    /// Sky distance between two pixel positions, in radians
    pub fn sky_separation_from_pixel(x1: f64, y1: f64, x2: f64, y2: f64, cd: [f64; 4]) -> f64 {
        let (ra1, dec1) = Self::compute_delta_ra_dec(x1, y1, cd);
        let (ra2, dec2) = Self::compute_delta_ra_dec(x2, y2, cd);
        Self::compute_sky_separation(ra1, dec1, ra2, dec2)
    }

    /// Arcseconds per pixel from a CD matrix in radians
    pub fn pixel_scale_arcseconds(cd: [f64; 4]) -> f64 {
        let [cd11, cd12, cd21, cd22] = cd;
        3600.0 * (cd11 * cd22 - cd12 * cd21).abs().sqrt().to_degrees()
    }

    fn pixel_scales(&self, frame: &Frame) -> ComputeResult<Vec<f64>> {
        let cd11 = floats(frame, &self.cd_1_1)?;
        let cd12 = floats(frame, &self.cd_1_2)?;
        let cd21 = floats(frame, &self.cd_2_1)?;
        let cd22 = floats(frame, &self.cd_2_2)?;
        Ok((0..cd11.len())
            .map(|i| Self::pixel_scale_arcseconds([cd11[i], cd12[i], cd21[i], cd22[i]]))
            .collect())
    }
}

/// Local pixel scale, optionally applied to a pixel-valued column
#[derive(Debug, Clone)]
pub struct PixelScale {
    col: Option<String>,
    wcs: LocalWcs,
    settings: FunctorSettings,
}

impl PixelScale {
    /// Arcseconds per pixel
    pub fn new(wcs: LocalWcs) -> Self {
        Self {
            col: None,
            wcs,
            settings: FunctorSettings::default(),
        }
    }

    /// `col` converted from pixels to arcseconds
    pub fn convert(col: impl Into<String>, wcs: LocalWcs) -> Self {
        Self {
            col: Some(col.into()),
            wcs,
            settings: FunctorSettings::default(),
        }
    }
}

impl Functor for PixelScale {
    fn name(&self) -> String {
        match &self.col {
            Some(col) => format!("{}_asArcseconds", col),
            None => "PixelScale".to_string(),
        }
    }

    fn columns(&self) -> Result<Vec<String>> {
        let mut cols: Vec<String> = self.col.iter().cloned().collect();
        cols.extend(self.wcs.columns());
        Ok(cols)
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let scales = self.wcs.pixel_scales(frame)?;
        let values: Vec<f64> = match &self.col {
            Some(col) => floats(frame, col)?
                .into_iter()
                .zip(scales)
                .map(|(v, s)| v * s)
                .collect(),
            None => scales,
        };
        Ok(values.into())
    }
}

impl WithSettings for PixelScale {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfunctor_core::FlatTable;

    // 0.2 arcsec pixels, no rotation
    fn cd() -> [f64; 4] {
        let s = (0.2f64 / 3600.0).to_radians();
        [s, 0.0, 0.0, s]
    }

    #[test]
    fn test_pixel_scale() {
        assert!((LocalWcs::pixel_scale_arcseconds(cd()) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_sky_separation_from_pixel() {
        let sep = LocalWcs::sky_separation_from_pixel(0.0, 0.0, 3.0, 4.0, cd());
        let arcsec = sep.to_degrees() * 3600.0;
        assert!((arcsec - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_convert_pixel_to_arcseconds() {
        let [cd11, cd12, cd21, cd22] = cd();
        let table = FlatTable::with_rows(1)
            .with_column("radius", vec![10.0])
            .unwrap()
            .with_column("cd11", vec![cd11])
            .unwrap()
            .with_column("cd12", vec![cd12])
            .unwrap()
            .with_column("cd21", vec![cd21])
            .unwrap()
            .with_column("cd22", vec![cd22])
            .unwrap();

        let functor = PixelScale::convert("radius", LocalWcs::new("cd11", "cd12", "cd21", "cd22"));
        assert_eq!(functor.name(), "radius_asArcseconds");
        let values = functor.evaluate(&table, false).unwrap().floats().unwrap();
        assert!((values[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_local_photometry() {
        let table = FlatTable::with_rows(1)
            .with_column("flux", vec![100.0])
            .unwrap()
            .with_column("fluxErr", vec![10.0])
            .unwrap()
            .with_column("calib", vec![2.0])
            .unwrap()
            .with_column("calibErr", vec![0.0])
            .unwrap();

        let eval = |kind| {
            LocalPhotometry::new(kind, "flux", "fluxErr", "calib", "calibErr")
                .evaluate(&table, false)
                .unwrap()
                .floats()
                .unwrap()[0]
        };

        assert_eq!(eval(LocalPhotometryKind::Nanojansky), 200.0);
        assert_eq!(eval(LocalPhotometryKind::NanojanskyErr), 20.0);
        assert!((eval(LocalPhotometryKind::Magnitude) - (31.4 - 2.5 * 200f64.log10())).abs() < 1e-12);
        assert!((eval(LocalPhotometryKind::MagnitudeErr) - 2.5 / LN_10 * 0.1).abs() < 1e-12);
    }
}
