//! Built-in functor library

pub mod column;
pub mod labeller;
pub mod local;
pub mod photometry;
pub mod reference_band;
pub mod shape;

pub use column::{ColumnFunctor, CoordColumn, IndexFunctor};
pub use labeller::{NumStarLabeller, StarGalaxyLabeller};
pub use local::{LocalPhotometry, LocalPhotometryKind, LocalWcs, PixelScale, LOG_NJANSKY_TO_AB};
pub use photometry::{
    Calibration, Color, Mag, MagDiff, Photometry, PhotometryKind, AB_FLUX_SCALE,
    FIVE_OVER_2LOG10,
};
pub use reference_band::{ReferenceBand, REFERENCE_BANDS};
pub use shape::{sigma_to_fwhm, Quadrupole, QuadrupoleKind, TraceKind, TraceSize};
