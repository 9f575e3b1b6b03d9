//! Shape-moment sizes and ellipticities

use crate::error::{ComputeError, ComputeResult, Result};
use crate::functor::{floats, Functor, FunctorSettings, WithSettings};
use skyfunctor_core::{ColumnValues, Frame};

const SDSS_XX: &str = "base_SdssShape_xx";
const SDSS_YY: &str = "base_SdssShape_yy";
const SDSS_PSF_XX: &str = "base_SdssShape_psf_xx";
const SDSS_PSF_YY: &str = "base_SdssShape_psf_yy";
const HSM_SOURCE_XX: &str = "ext_shapeHSM_HsmSourceMoments_xx";
const HSM_SOURCE_YY: &str = "ext_shapeHSM_HsmSourceMoments_yy";
const HSM_PSF_XX: &str = "ext_shapeHSM_HsmPsfMoments_xx";
const HSM_PSF_YY: &str = "ext_shapeHSM_HsmPsfMoments_yy";

/// Gaussian sigma to FWHM
pub fn sigma_to_fwhm() -> f64 {
    2.0 * (2.0 * 2f64.ln()).sqrt()
}

/// Which size metric a `TraceSize` functor computes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    DeconvolvedMoments,
    SdssTraceSize,
    PsfSdssTraceSizeDiff,
    HsmTraceSize,
    PsfHsmTraceSizeDiff,
    HsmFwhm,
}

/// Trace-radius sizes over the fixed SDSS / HSM moment columns
#[derive(Debug, Clone)]
pub struct TraceSize {
    kind: TraceKind,
    pixel_scale: f64,
    settings: FunctorSettings,
}

impl TraceSize {
    pub fn new(kind: TraceKind) -> Self {
        Self {
            kind,
            pixel_scale: crate::config::DEFAULT_HSM_PIXEL_SCALE,
            settings: FunctorSettings::default(),
        }
    }

    /// Arcsec per pixel, used by `HsmFwhm`
    pub fn with_pixel_scale(mut self, pixel_scale: f64) -> Self {
        self.pixel_scale = pixel_scale;
        self
    }

    fn trace(frame: &Frame, xx: &str, yy: &str) -> ComputeResult<Vec<f64>> {
        let xx = floats(frame, xx)?;
        let yy = floats(frame, yy)?;
        Ok(xx.iter().zip(&yy).map(|(a, b)| (0.5 * (a + b)).sqrt()).collect())
    }

    fn percent_diff(src: &[f64], psf: &[f64]) -> Vec<f64> {
        src.iter()
            .zip(psf)
            .map(|(s, p)| 100.0 * (s - p) / (0.5 * (s + p)))
            .collect()
    }

    fn sum(frame: &Frame, xx: &str, yy: &str) -> ComputeResult<Vec<f64>> {
        let xx = floats(frame, xx)?;
        let yy = floats(frame, yy)?;
        Ok(xx.iter().zip(&yy).map(|(a, b)| a + b).collect())
    }

    fn deconvolved_moments(frame: &Frame) -> ComputeResult<Vec<f64>> {
        if !frame.has_column(HSM_PSF_XX) || !frame.has_column(HSM_PSF_YY) {
            return Err(ComputeError::MissingColumn(
                "No psf shape parameter found in catalog".to_string(),
            ));
        }

        let sdss = Self::sum(frame, SDSS_XX, SDSS_YY)?;
        let hsm = if frame.has_column(HSM_SOURCE_XX) && frame.has_column(HSM_SOURCE_YY) {
            Self::sum(frame, HSM_SOURCE_XX, HSM_SOURCE_YY)?
        } else {
            vec![f64::NAN; frame.len()]
        };
        let psf = Self::sum(frame, HSM_PSF_XX, HSM_PSF_YY)?;

        Ok((0..frame.len())
            .map(|i| {
                let source = if hsm[i].is_finite() { hsm[i] } else { sdss[i] };
                source - psf[i]
            })
            .collect())
    }
}

impl Functor for TraceSize {
    fn name(&self) -> String {
        match self.kind {
            TraceKind::DeconvolvedMoments => "Deconvolved Moments",
            TraceKind::SdssTraceSize => "SDSS Trace Size",
            TraceKind::PsfSdssTraceSizeDiff => "PSF - SDSS Trace Size",
            TraceKind::HsmTraceSize => "HSM Trace Size",
            TraceKind::PsfHsmTraceSizeDiff => "PSF - HSM Trace Size",
            TraceKind::HsmFwhm => "HSM Psf FWHM",
        }
        .to_string()
    }

    fn shortname(&self) -> String {
        match self.kind {
            TraceKind::DeconvolvedMoments => "deconvolvedMoments".to_string(),
            TraceKind::SdssTraceSize => "sdssTrace".to_string(),
            TraceKind::PsfSdssTraceSizeDiff => "psf_sdssTrace".to_string(),
            TraceKind::HsmTraceSize => "hsmTrace".to_string(),
            TraceKind::PsfHsmTraceSizeDiff => "psf_HsmTrace".to_string(),
            TraceKind::HsmFwhm => self.name(),
        }
    }

    fn columns(&self) -> Result<Vec<String>> {
        let cols: &[&str] = match self.kind {
            TraceKind::DeconvolvedMoments => &[
                HSM_SOURCE_XX,
                HSM_SOURCE_YY,
                SDSS_XX,
                SDSS_YY,
                HSM_PSF_XX,
                HSM_PSF_YY,
            ],
            TraceKind::SdssTraceSize => &[SDSS_XX, SDSS_YY],
            TraceKind::PsfSdssTraceSizeDiff => &[SDSS_XX, SDSS_YY, SDSS_PSF_XX, SDSS_PSF_YY],
            TraceKind::HsmTraceSize => &[HSM_SOURCE_XX, HSM_SOURCE_YY],
            TraceKind::PsfHsmTraceSizeDiff => {
                &[HSM_SOURCE_XX, HSM_SOURCE_YY, HSM_PSF_XX, HSM_PSF_YY]
            }
            TraceKind::HsmFwhm => &[HSM_PSF_XX, HSM_PSF_YY],
        };
        Ok(cols.iter().map(|c| c.to_string()).collect())
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let values = match self.kind {
            TraceKind::DeconvolvedMoments => Self::deconvolved_moments(frame)?,
            TraceKind::SdssTraceSize => Self::trace(frame, SDSS_XX, SDSS_YY)?,
            TraceKind::PsfSdssTraceSizeDiff => Self::percent_diff(
                &Self::trace(frame, SDSS_XX, SDSS_YY)?,
                &Self::trace(frame, SDSS_PSF_XX, SDSS_PSF_YY)?,
            ),
            TraceKind::HsmTraceSize => Self::trace(frame, HSM_SOURCE_XX, HSM_SOURCE_YY)?,
            TraceKind::PsfHsmTraceSizeDiff => Self::percent_diff(
                &Self::trace(frame, HSM_SOURCE_XX, HSM_SOURCE_YY)?,
                &Self::trace(frame, HSM_PSF_XX, HSM_PSF_YY)?,
            ),
            TraceKind::HsmFwhm => {
                let scale = self.pixel_scale * sigma_to_fwhm();
                Self::trace(frame, HSM_PSF_XX, HSM_PSF_YY)?
                    .into_iter()
                    .map(|t| scale * t)
                    .collect()
            }
        };
        Ok(values.into())
    }
}

impl WithSettings for TraceSize {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

/// Which quantity a `Quadrupole` functor derives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadrupoleKind {
    /// Distortion ellipticity `(xx - yy) / (xx + yy)`
    E1,
    /// `2 xy / (xx + yy)`
    E2,
    /// Determinant radius `(xx yy - xy^2)^(1/4)`
    Radius,
}

/// Ellipticity and radius from named second-moment columns
#[derive(Debug, Clone)]
pub struct Quadrupole {
    kind: QuadrupoleKind,
    col_xx: String,
    col_xy: String,
    col_yy: String,
    settings: FunctorSettings,
}

impl Quadrupole {
    pub fn new(
        kind: QuadrupoleKind,
        col_xx: impl Into<String>,
        col_xy: impl Into<String>,
        col_yy: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            col_xx: col_xx.into(),
            col_xy: col_xy.into(),
            col_yy: col_yy.into(),
            settings: FunctorSettings::default(),
        }
    }
}

impl Functor for Quadrupole {
    fn name(&self) -> String {
        match self.kind {
            QuadrupoleKind::E1 => "Distortion Ellipticity (e1)",
            QuadrupoleKind::E2 => "Ellipticity e2",
            QuadrupoleKind::Radius => "RadiusFromQuadrupole",
        }
        .to_string()
    }

    fn shortname(&self) -> String {
        match self.kind {
            QuadrupoleKind::E1 => "Distortion".to_string(),
            _ => self.name(),
        }
    }

    fn columns(&self) -> Result<Vec<String>> {
        Ok(vec![
            self.col_xx.clone(),
            self.col_xy.clone(),
            self.col_yy.clone(),
        ])
    }

    fn settings(&self) -> &FunctorSettings {
        &self.settings
    }

    fn compute(&self, frame: &Frame) -> ComputeResult<ColumnValues> {
        let xx = floats(frame, &self.col_xx)?;
        let xy = floats(frame, &self.col_xy)?;
        let yy = floats(frame, &self.col_yy)?;

        let values: Vec<f64> = (0..xx.len())
            .map(|i| match self.kind {
                QuadrupoleKind::E1 => (xx[i] - yy[i]) / (xx[i] + yy[i]),
                QuadrupoleKind::E2 => 2.0 * xy[i] / (xx[i] + yy[i]),
                QuadrupoleKind::Radius => (xx[i] * yy[i] - xy[i] * xy[i]).powf(0.25),
            })
            .collect();
        Ok(values.into())
    }
}

impl WithSettings for Quadrupole {
    fn settings_mut(&mut self) -> &mut FunctorSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfunctor_core::{ColumnKey, FlatTable};

    fn moments_frame(with_psf: bool) -> Frame {
        let mut frame = Frame::new(vec![0, 1].into())
            .with_column(ColumnKey::flat(HSM_SOURCE_XX), vec![4.0, f64::NAN])
            .unwrap()
            .with_column(ColumnKey::flat(HSM_SOURCE_YY), vec![4.0, 1.0])
            .unwrap()
            .with_column(ColumnKey::flat(SDSS_XX), vec![3.0, 3.0])
            .unwrap()
            .with_column(ColumnKey::flat(SDSS_YY), vec![3.0, 3.0])
            .unwrap();
        if with_psf {
            frame = frame
                .with_column(ColumnKey::flat(HSM_PSF_XX), vec![1.0, 1.0])
                .unwrap()
                .with_column(ColumnKey::flat(HSM_PSF_YY), vec![1.0, 1.0])
                .unwrap();
        }
        frame
    }

    #[test]
    fn test_deconvolved_moments_falls_back_to_sdss() {
        let functor = TraceSize::new(TraceKind::DeconvolvedMoments);
        let values = functor.compute(&moments_frame(true)).unwrap();
        assert_eq!(values, ColumnValues::Float(vec![6.0, 4.0]));
    }

    #[test]
    fn test_deconvolved_moments_without_psf_is_contained() {
        let functor = TraceSize::new(TraceKind::DeconvolvedMoments);
        let outcome = functor.outcome(&moments_frame(false));
        assert!(outcome.is_substituted());
        assert_eq!(outcome.column().values().missing_count(), 2);
    }

    #[test]
    fn test_trace_sizes() {
        let frame = moments_frame(true);
        let hsm = TraceSize::new(TraceKind::HsmTraceSize).compute(&frame).unwrap();
        let ColumnValues::Float(hsm) = hsm else { panic!("expected floats") };
        assert_eq!(hsm[0], 2.0);

        let diff = TraceSize::new(TraceKind::PsfHsmTraceSizeDiff).compute(&frame).unwrap();
        let ColumnValues::Float(diff) = diff else { panic!("expected floats") };
        // src 2, psf 1: 100 * 1 / 1.5
        assert!((diff[0] - 200.0 / 3.0).abs() < 1e-12);

        let fwhm = TraceSize::new(TraceKind::HsmFwhm)
            .with_pixel_scale(0.2)
            .compute(&frame)
            .unwrap();
        let ColumnValues::Float(fwhm) = fwhm else { panic!("expected floats") };
        assert!((fwhm[0] - 0.2 * sigma_to_fwhm()).abs() < 1e-12);
    }

    #[test]
    fn test_quadrupole() {
        let table = FlatTable::with_rows(1)
            .with_column("xx", vec![3.0])
            .unwrap()
            .with_column("xy", vec![1.0])
            .unwrap()
            .with_column("yy", vec![1.0])
            .unwrap();

        let eval = |kind| {
            Quadrupole::new(kind, "xx", "xy", "yy")
                .evaluate(&table, false)
                .unwrap()
                .floats()
                .unwrap()[0]
        };

        assert_eq!(eval(QuadrupoleKind::E1), 0.5);
        assert_eq!(eval(QuadrupoleKind::E2), 0.5);
        assert!((eval(QuadrupoleKind::Radius) - 2f64.powf(0.25)).abs() < 1e-12);
        assert_eq!(Quadrupole::new(QuadrupoleKind::E1, "a", "b", "c").shortname(), "Distortion");
    }
}
