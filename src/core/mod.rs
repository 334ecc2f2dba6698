//! Core scattering-model modules

pub mod special;
pub mod quadrature;
pub mod cubature;
pub mod spectrum;
pub mod series;
pub mod field_coefficients;
pub mod copol;
pub mod crosspol;
pub mod emissivity;

// Re-export main types
pub use spectrum::{spectrum, rms_slope, RoughnessSpectrum};
pub use series::{auto_term_count, TermSelection, MAX_SERIES_TERMS, FIXED_CROSSPOL_TERMS};
pub use field_coefficients::{
    FresnelCoefficients, KirchhoffCoefficients, ComplementaryCoefficients, ScatteringAngles,
};
pub use copol::{solve_copol, BistaticModel, BistaticSigma};
pub use crosspol::solve_crosspol;
pub use emissivity::solve_emissivity;
