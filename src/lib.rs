//! i2em: Rough-Surface Backscatter and Emissivity Models
//!
//! This library implements the Improved Integral Equation Model (I2EM) for the
//! co-polarized bistatic scattering coefficients of a randomly rough dielectric
//! surface, its IEMX extension for cross-polarized backscatter, and the
//! surface emissivity derived from both by energy conservation.
//!
//! The detailed solvers in [`core`] take an explicit [`SolverConfig`] and
//! return result structs carrying linear values, term counts and non-fatal
//! diagnostics. The flat functions below take plain numbers (angles in
//! degrees, lengths in metres, frequency in GHz, correlation family as an
//! integer code 1–4) and read the process-wide default configuration.

pub mod types;
pub mod config;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    CorrelationType, SurfaceParameters, RadarGeometry, Permittivity,
    CoPolResult, CrossPolResult, EmissivityResult, IntegrationReport, Diagnostic,
    I2emError, I2emResult,
};

pub use config::{
    IntegratorSettings, SolverConfig, global_config, replace_global_config,
    set_integrator_settings, set_auto_select_epsilon, set_vh_power_scale,
};

pub use crate::core::{solve_copol, solve_crosspol, solve_emissivity, spectrum};

/// Shape exponent used when the caller does not give one
pub const DEFAULT_SHAPE_EXPONENT: f64 = 1.0;

/// Shape exponent used by the flat emissivity entry point, which takes none
pub fn emissivity_shape_exponent(correlation_type: CorrelationType) -> f64 {
    match correlation_type {
        CorrelationType::PowerLaw => 1.5,
        _ => DEFAULT_SHAPE_EXPONENT,
    }
}

fn surface(
    rms_height: f64,
    correlation_length: f64,
    correlation_type: i32,
    shape_exponent: f64,
) -> I2emResult<SurfaceParameters> {
    let correlation_type = CorrelationType::from_code(correlation_type)?;
    Ok(SurfaceParameters::new(
        rms_height,
        correlation_length,
        correlation_type,
        shape_exponent,
    ))
}

/// Surface emissivity `(e_v, e_h)`
pub fn emissivity(
    frequency_ghz: f64,
    rms_height: f64,
    correlation_length: f64,
    incidence_deg: f64,
    permittivity_real: f64,
    permittivity_imag: f64,
    correlation_type: i32,
) -> I2emResult<(f64, f64)> {
    let kind = CorrelationType::from_code(correlation_type)?;
    let surface = SurfaceParameters::new(
        rms_height,
        correlation_length,
        kind,
        emissivity_shape_exponent(kind),
    );
    let result = solve_emissivity(
        &surface,
        frequency_ghz,
        incidence_deg,
        Permittivity::new(permittivity_real, permittivity_imag),
        &global_config(),
    )?;
    Ok((result.emissivity_v, result.emissivity_h))
}

/// Monostatic co-pol backscatter `(σ⁰_vv, σ⁰_hh)` in dB
pub fn backscatter(
    frequency_ghz: f64,
    rms_height: f64,
    correlation_length: f64,
    incidence_deg: f64,
    permittivity_real: f64,
    permittivity_imag: f64,
    correlation_type: i32,
    shape_exponent: f64,
) -> I2emResult<(f64, f64)> {
    bistatic_backscatter(
        frequency_ghz,
        rms_height,
        correlation_length,
        incidence_deg,
        incidence_deg,
        180.0,
        permittivity_real,
        permittivity_imag,
        correlation_type,
        shape_exponent,
    )
}

/// Bistatic co-pol scattering `(σ⁰_vv, σ⁰_hh)` in dB
pub fn bistatic_backscatter(
    frequency_ghz: f64,
    rms_height: f64,
    correlation_length: f64,
    incidence_deg: f64,
    scattering_deg: f64,
    relative_azimuth_deg: f64,
    permittivity_real: f64,
    permittivity_imag: f64,
    correlation_type: i32,
    shape_exponent: f64,
) -> I2emResult<(f64, f64)> {
    let surface = surface(rms_height, correlation_length, correlation_type, shape_exponent)?;
    let geometry = RadarGeometry::bistatic(
        frequency_ghz,
        incidence_deg,
        scattering_deg,
        relative_azimuth_deg,
    );
    let result = solve_copol(
        &surface,
        &geometry,
        Permittivity::new(permittivity_real, permittivity_imag),
        &global_config(),
    )?;
    Ok((result.sigma0_vv_db, result.sigma0_hh_db))
}

/// Cross-pol backscatter σ⁰_vh in dB
pub fn crosspol(
    frequency_ghz: f64,
    rms_height: f64,
    correlation_length: f64,
    incidence_deg: f64,
    permittivity_real: f64,
    permittivity_imag: f64,
    correlation_type: i32,
    shape_exponent: f64,
    auto_select: bool,
) -> I2emResult<f64> {
    let surface = surface(rms_height, correlation_length, correlation_type, shape_exponent)?;
    let result = solve_crosspol(
        &surface,
        frequency_ghz,
        incidence_deg,
        Permittivity::new(permittivity_real, permittivity_imag),
        auto_select,
        &global_config(),
    )?;
    Ok(result.sigma0_vh_db)
}

/// Combined monostatic backscatter `(σ⁰_vv, σ⁰_hh, σ⁰_vh)` in dB
///
/// Both solvers see the same configuration snapshot.
pub fn backscatter_model(
    frequency_ghz: f64,
    rms_height: f64,
    correlation_length: f64,
    incidence_deg: f64,
    permittivity_real: f64,
    permittivity_imag: f64,
    correlation_type: i32,
    shape_exponent: f64,
    auto_select: bool,
) -> I2emResult<(f64, f64, f64)> {
    let surface = surface(rms_height, correlation_length, correlation_type, shape_exponent)?;
    let er = Permittivity::new(permittivity_real, permittivity_imag);
    let config = global_config();

    let copol = solve_copol(
        &surface,
        &RadarGeometry::monostatic(frequency_ghz, incidence_deg),
        er,
        &config,
    )?;
    let crosspol = solve_crosspol(&surface, frequency_ghz, incidence_deg, er, auto_select, &config)?;
    Ok((copol.sigma0_vv_db, copol.sigma0_hh_db, crosspol.sigma0_vh_db))
}

/// Emissivity of a slightly rough moist soil: 3 GHz, σ = 0.25 cm, L = 10 cm,
/// 30° incidence, εr = 11.3 + 1.5j, Gaussian correlation
pub fn reference_emissivity() -> I2emResult<(f64, f64)> {
    emissivity(3.0, 0.0025, 0.10, 30.0, 11.3, 1.5, CorrelationType::Gaussian.code())
}
