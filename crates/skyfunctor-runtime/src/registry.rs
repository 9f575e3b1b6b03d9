//! Functor registry
//!
//! Maps a type identifier used in declarative specifications to a factory
//! that builds the functor from its positional and keyword arguments.

use crate::config::FunctorConfig;
use crate::error::{Result, RuntimeError};
use crate::expression::CustomFunctor;
use crate::functor::{Functor, FunctorSettings, WithSettings};
use crate::library::{
    Calibration, Color, ColumnFunctor, CoordColumn, IndexFunctor, LocalPhotometry,
    LocalPhotometryKind, LocalWcs, Mag, MagDiff, NumStarLabeller, Photometry, PhotometryKind,
    PixelScale, Quadrupole, QuadrupoleKind, ReferenceBand, StarGalaxyLabeller, TraceKind,
    TraceSize,
};
use skyfunctor_core::ast::FunctorSpec;
use skyfunctor_core::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Builds one functor from its specification arguments
pub type FunctorFactory =
    Arc<dyn Fn(&FunctorArgs, &FunctorConfig) -> Result<Box<dyn Functor>> + Send + Sync>;

/// Keyword arguments every functor accepts
pub const COMMON_KWARGS: [&str; 3] = ["filt", "dataset", "noDup"];

/// Argument view over one specification entry
#[derive(Debug, Clone, Copy)]
pub struct FunctorArgs<'a> {
    spec: &'a FunctorSpec,
}

impl<'a> FunctorArgs<'a> {
    pub fn new(spec: &'a FunctorSpec) -> Self {
        Self { spec }
    }

    /// Type identifier of the entry
    pub fn functor_type(&self) -> &str {
        &self.spec.functor
    }

    /// Argument by keyword, falling back to its position
    pub fn arg(&self, index: usize, name: &str) -> Option<&'a Value> {
        self.spec
            .kwargs
            .get(name)
            .or_else(|| self.spec.args.get(index))
            .filter(|value| !value.is_null())
    }

    /// Required string argument
    pub fn string(&self, index: usize, name: &str) -> Result<String> {
        self.optional_string(index, name)?
            .ok_or_else(|| self.invalid(format!("missing required argument '{}'", name)))
    }

    pub fn optional_string(&self, index: usize, name: &str) -> Result<Option<String>> {
        match self.arg(index, name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.invalid(format!(
                "argument '{}' must be a string, got {}",
                name,
                other.type_name()
            ))),
        }
    }

    /// Calibration argument, if given
    pub fn calib(&self, index: usize) -> Result<Option<Calibration>> {
        self.arg(index, "calib").map(Calibration::from_value).transpose()
    }

    /// Common `filt` / `dataset` / `noDup` keyword arguments
    pub fn settings(&self) -> Result<FunctorSettings> {
        let kwargs = &self.spec.kwargs;
        let text = |key: &str| -> Result<Option<String>> {
            match kwargs.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(self.invalid(format!(
                    "'{}' must be a string, got {}",
                    key,
                    other.type_name()
                ))),
            }
        };

        let no_dup = match kwargs.get("noDup") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                return Err(self.invalid(format!(
                    "'noDup' must be a boolean, got {}",
                    other.type_name()
                )))
            }
        };

        Ok(FunctorSettings {
            filter: text("filt")?,
            dataset: text("dataset")?,
            no_dup,
        })
    }

    /// Reject extra positionals, unknown keywords, and arguments given twice
    pub fn check(&self, positional: &[&str]) -> Result<()> {
        if self.spec.args.len() > positional.len() {
            return Err(self.invalid(format!(
                "takes at most {} positional argument(s), got {}",
                positional.len(),
                self.spec.args.len()
            )));
        }

        for key in self.spec.kwargs.keys() {
            match positional.iter().position(|p| p == key) {
                Some(i) if i < self.spec.args.len() => {
                    return Err(self.invalid(format!("argument '{}' given twice", key)));
                }
                Some(_) => {}
                None if COMMON_KWARGS.contains(&key.as_str()) => {}
                None => {
                    return Err(self.invalid(format!("unexpected keyword argument '{}'", key)));
                }
            }
        }
        Ok(())
    }

    /// Human-readable argument summary used in construction errors
    pub fn describe(&self) -> String {
        let positional: Vec<String> = self.spec.args.iter().map(|v| v.to_string()).collect();
        let keyword: Vec<String> = self
            .spec
            .kwargs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("[{}] {{{}}}", positional.join(", "), keyword.join(", "))
    }

    fn invalid(&self, message: String) -> RuntimeError {
        RuntimeError::InvalidArgument {
            functor: self.spec.functor.clone(),
            message,
        }
    }
}

fn finish<F>(functor: F, args: &FunctorArgs) -> Result<Box<dyn Functor>>
where
    F: Functor + WithSettings + 'static,
{
    Ok(Box::new(functor.with_settings(args.settings()?)))
}

/// Type identifier → factory map
#[derive(Clone, Default)]
pub struct FunctorRegistry {
    factories: HashMap<String, FunctorFactory>,
}

impl FunctorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every library functor type
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_columns();
        registry.register_magnitudes();
        registry.register_labellers();
        registry.register_shapes();
        registry.register_wcs();
        registry.register_photometry();
        registry.register_local_photometry();

        registry.register("ReferenceBand", |args, _| {
            args.check(&[])?;
            finish(ReferenceBand::new(), args)
        });
        registry.register("CustomFunctor", |args, _| {
            args.check(&["expr"])?;
            finish(CustomFunctor::new(args.string(0, "expr")?)?, args)
        });
        registry
    }

    /// Add or replace a factory
    pub fn register<F>(&mut self, functor_type: impl Into<String>, factory: F)
    where
        F: Fn(&FunctorArgs, &FunctorConfig) -> Result<Box<dyn Functor>> + Send + Sync + 'static,
    {
        self.factories.insert(functor_type.into(), Arc::new(factory));
    }

    pub fn contains(&self, functor_type: &str) -> bool {
        self.factories.contains_key(functor_type)
    }

    /// Registered type identifiers, sorted
    pub fn type_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.factories.keys().collect();
        names.into_iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build the functor an entry describes
    pub fn build(&self, spec: &FunctorSpec, config: &FunctorConfig) -> Result<Box<dyn Functor>> {
        let factory =
            self.factories
                .get(&spec.functor)
                .ok_or_else(|| RuntimeError::UnknownFunctorType {
                    name: spec.name.clone(),
                    functor_type: spec.functor.clone(),
                })?;

        let args = FunctorArgs::new(spec);
        factory(&args, config).map_err(|source| RuntimeError::Construction {
            name: spec.name.clone(),
            functor_type: spec.functor.clone(),
            args: args.describe(),
            source: Box::new(source),
        })
    }

    fn register_columns(&mut self) {
        self.register("Column", |args, _| {
            args.check(&["col"])?;
            finish(ColumnFunctor::new(args.string(0, "col")?), args)
        });
        self.register("FootprintNPix", |args, _| {
            args.check(&[])?;
            finish(ColumnFunctor::footprint_npix(), args)
        });
        self.register("Index", |args, _| {
            args.check(&[])?;
            finish(IndexFunctor::index(), args)
        });
        self.register("IDColumn", |args, _| {
            args.check(&[])?;
            finish(IndexFunctor::id(), args)
        });
        self.register("CoordColumn", |args, _| {
            args.check(&["col"])?;
            finish(CoordColumn::new(args.string(0, "col")?), args)
        });
        self.register("RAColumn", |args, _| {
            args.check(&[])?;
            finish(CoordColumn::ra(), args)
        });
        self.register("DecColumn", |args, _| {
            args.check(&[])?;
            finish(CoordColumn::dec(), args)
        });
    }

    fn register_magnitudes(&mut self) {
        fn calib_or_default(args: &FunctorArgs, index: usize, config: &FunctorConfig) -> Result<Calibration> {
            Ok(args
                .calib(index)?
                .unwrap_or_else(|| Calibration::new(config.default_flux_mag0, 0.0)))
        }

        self.register("Mag", |args, config| {
            args.check(&["col", "calib"])?;
            let col = args.string(0, "col")?;
            finish(Mag::new(&col, calib_or_default(args, 1, config)?), args)
        });
        self.register("MagErr", |args, config| {
            args.check(&["col", "calib"])?;
            let col = args.string(0, "col")?;
            finish(Mag::err(&col, calib_or_default(args, 1, config)?), args)
        });
        self.register("NanoMaggie", |args, config| {
            args.check(&["col", "calib"])?;
            let col = args.string(0, "col")?;
            finish(Mag::nano_maggie(&col, calib_or_default(args, 1, config)?), args)
        });
        self.register("MagDiff", |args, _| {
            args.check(&["col1", "col2"])?;
            let col1 = args.string(0, "col1")?;
            let col2 = args.string(1, "col2")?;
            finish(MagDiff::new(&col1, &col2), args)
        });
        self.register("Color", |args, config| {
            args.check(&["col", "filt2", "filt1", "calib"])?;
            let col = args.string(0, "col")?;
            let filt2 = args.string(1, "filt2")?;
            let filt1 = args.string(2, "filt1")?;
            let color = Color::new(&col, &filt2, &filt1, calib_or_default(args, 3, config)?)?;
            finish(color, args)
        });
    }

    fn register_labellers(&mut self) {
        self.register("StarGalaxyLabeller", |args, config| {
            args.check(&[])?;
            finish(StarGalaxyLabeller::new(config), args)
        });
        self.register("NumStarLabeller", |args, config| {
            args.check(&[])?;
            finish(NumStarLabeller::new(config), args)
        });
    }

    fn register_shapes(&mut self) {
        let traces = [
            ("DeconvolvedMoments", TraceKind::DeconvolvedMoments),
            ("SdssTraceSize", TraceKind::SdssTraceSize),
            ("PsfSdssTraceSizeDiff", TraceKind::PsfSdssTraceSizeDiff),
            ("HsmTraceSize", TraceKind::HsmTraceSize),
            ("PsfHsmTraceSizeDiff", TraceKind::PsfHsmTraceSizeDiff),
            ("HsmFwhm", TraceKind::HsmFwhm),
        ];
        for (name, kind) in traces {
            self.register(name, move |args, config| {
                args.check(&[])?;
                finish(TraceSize::new(kind).with_pixel_scale(config.hsm_pixel_scale), args)
            });
        }

        let quadrupoles = [
            ("E1", QuadrupoleKind::E1),
            ("E2", QuadrupoleKind::E2),
            ("RadiusFromQuadrupole", QuadrupoleKind::Radius),
        ];
        for (name, kind) in quadrupoles {
            self.register(name, move |args, _| {
                args.check(&["colXX", "colXY", "colYY"])?;
                let functor = Quadrupole::new(
                    kind,
                    args.string(0, "colXX")?,
                    args.string(1, "colXY")?,
                    args.string(2, "colYY")?,
                );
                finish(functor, args)
            });
        }
    }

    fn register_wcs(&mut self) {
        const CD: [&str; 4] = ["colCD_1_1", "colCD_1_2", "colCD_2_1", "colCD_2_2"];

        fn wcs(args: &FunctorArgs, offset: usize) -> Result<LocalWcs> {
            Ok(LocalWcs::new(
                args.string(offset, CD[0])?,
                args.string(offset + 1, CD[1])?,
                args.string(offset + 2, CD[2])?,
                args.string(offset + 3, CD[3])?,
            ))
        }

        self.register("ComputePixelScale", |args, _| {
            args.check(&CD)?;
            finish(PixelScale::new(wcs(args, 0)?), args)
        });
        self.register("ConvertPixelToArcseconds", |args, _| {
            args.check(&["col", CD[0], CD[1], CD[2], CD[3]])?;
            let col = args.string(0, "col")?;
            finish(PixelScale::convert(col, wcs(args, 1)?), args)
        });
    }

    fn register_photometry(&mut self) {
        let kinds = [
            ("NanoJansky", PhotometryKind::NanoJansky),
            ("NanoJanskyErr", PhotometryKind::NanoJanskyErr),
            ("Magnitude", PhotometryKind::Magnitude),
            ("MagnitudeErr", PhotometryKind::MagnitudeErr),
        ];
        for (name, kind) in kinds {
            self.register(name, move |args, config| {
                args.check(&["colFlux", "colFluxErr", "calib"])?;
                let calib = args
                    .calib(2)?
                    .unwrap_or_else(|| Calibration::from_zero_point(config.coadd_zero_point));
                let functor = Photometry::new(
                    kind,
                    args.string(0, "colFlux")?,
                    args.optional_string(1, "colFluxErr")?,
                    calib,
                )?;
                finish(functor, args)
            });
        }
    }

    fn register_local_photometry(&mut self) {
        let kinds = [
            ("LocalNanojansky", LocalPhotometryKind::Nanojansky),
            ("LocalNanojanskyErr", LocalPhotometryKind::NanojanskyErr),
            ("LocalMagnitude", LocalPhotometryKind::Magnitude),
            ("LocalMagnitudeErr", LocalPhotometryKind::MagnitudeErr),
        ];
        for (name, kind) in kinds {
            self.register(name, move |args, _| {
                args.check(&[
                    "instFluxCol",
                    "instFluxErrCol",
                    "photoCalibCol",
                    "photoCalibErrCol",
                ])?;
                let functor = LocalPhotometry::new(
                    kind,
                    args.string(0, "instFluxCol")?,
                    args.string(1, "instFluxErrCol")?,
                    args.string(2, "photoCalibCol")?,
                    args.string(3, "photoCalibErrCol")?,
                );
                finish(functor, args)
            });
        }
    }
}

impl std::fmt::Debug for FunctorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctorRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_cover_library() {
        let registry = FunctorRegistry::with_builtins();
        assert_eq!(registry.len(), 35);
        for name in ["Mag", "Color", "E1", "LocalMagnitudeErr", "CustomFunctor"] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_keyword_and_positional_arguments() {
        let registry = FunctorRegistry::with_builtins();
        let config = FunctorConfig::default();

        let spec = FunctorSpec::new("psfMag", "Mag")
            .with_kwarg("col", "base_PsfFlux")
            .with_kwarg("filt", "HSC-G");
        let functor = registry.build(&spec, &config).unwrap();
        assert_eq!(functor.name(), "mag_base_PsfFlux_instFlux");
        assert_eq!(functor.settings().filter.as_deref(), Some("HSC-G"));

        let spec = FunctorSpec::new("d", "MagDiff")
            .with_arg("a")
            .with_arg("b");
        assert_eq!(registry.build(&spec, &config).unwrap().shortname(), "magDiff_a_instFlux_b_instFlux");
    }

    #[test]
    fn test_argument_errors_are_wrapped() {
        let registry = FunctorRegistry::with_builtins();
        let config = FunctorConfig::default();

        let spec = FunctorSpec::new("bad", "Column")
            .with_arg("a")
            .with_kwarg("col", "b");
        let err = registry.build(&spec, &config).unwrap_err();
        assert!(matches!(err, RuntimeError::Construction { .. }));

        let spec = FunctorSpec::new("bad", "Column").with_kwarg("colour", "b");
        assert!(registry.build(&spec, &config).is_err());

        let spec = FunctorSpec::new("bad", "Nope");
        assert!(matches!(
            registry.build(&spec, &config).unwrap_err(),
            RuntimeError::UnknownFunctorType { .. }
        ));
    }
}
