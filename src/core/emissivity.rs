//! Emissivity from energy conservation
//!
//! `e_p = 1 − Γ_coh,p − Γ_inc,p`: the coherent part is the Fresnel reflectivity
//! attenuated by the surface roughness; the incoherent part integrates the
//! bistatic co-pol and Kirchhoff cross-pol coefficients over the upper
//! hemisphere with a fixed Gauss–Legendre product rule.

use crate::config::SolverConfig;
use crate::core::copol::BistaticModel;
use crate::core::field_coefficients::{FresnelCoefficients, ScatteringAngles};
use crate::core::quadrature::GaussLegendre;
use crate::core::series::MAX_SERIES_TERMS;
use crate::core::spectrum::RoughnessSpectrum;
use crate::types::{
    validate_permittivity, Diagnostic, EmissivityResult, I2emResult, Permittivity, RadarGeometry,
    SurfaceParameters,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Gauss–Legendre nodes over the scattering polar angle
pub const POLAR_NODES: usize = 32;

/// Gauss–Legendre nodes over the half-range of scattering azimuth
pub const AZIMUTH_NODES: usize = 64;

/// Weighted bistatic sums over one ring of scattering directions
struct Ring {
    v: f64,
    h: f64,
    capped: bool,
}

/// V and H emissivity of the rough surface at one incidence angle
pub fn solve_emissivity(
    surface: &SurfaceParameters,
    frequency_ghz: f64,
    incidence_deg: f64,
    er: Permittivity,
    config: &SolverConfig,
) -> I2emResult<EmissivityResult> {
    surface.validate()?;
    let geometry = RadarGeometry::monostatic(frequency_ghz, incidence_deg);
    geometry.validate()?;
    validate_permittivity(er)?;
    config.validate()?;

    log::debug!(
        "Emissivity: f = {} GHz, θ = {}°, σ = {} m, L = {} m, {}, εr = {}",
        frequency_ghz,
        incidence_deg,
        surface.rms_height,
        surface.correlation_length,
        surface.correlation_type,
        er
    );

    let spectrum = RoughnessSpectrum::new(surface)?;
    let k = geometry.wavenumber();
    let model = BistaticModel::new(spectrum, surface.rms_height, k, er, config.auto_select_epsilon);
    let theta_i = incidence_deg.to_radians();
    let (sin_theta, cos_theta) = theta_i.sin_cos();

    let polar: Vec<(f64, f64)> = GaussLegendre::new(POLAR_NODES)
        .mapped(0.0, std::f64::consts::FRAC_PI_2)
        .collect();
    let azimuth = GaussLegendre::new(AZIMUTH_NODES);

    // Azimuthal ring at one scattering polar angle, weighted by sin θs
    let ring = |&(theta_s, weight): &(f64, f64)| -> Ring {
        let mut v = 0.0;
        let mut h = 0.0;
        let mut capped = false;
        for (phi_s, w_phi) in azimuth.mapped(0.0, std::f64::consts::PI) {
            let sigma = model.evaluate(&ScatteringAngles::new(theta_i, theta_s, phi_s));
            v += (sigma.vv + sigma.hv) * w_phi;
            h += (sigma.hh + sigma.hv) * w_phi;
            capped |= sigma.capped;
        }
        let w = weight * theta_s.sin();
        Ring {
            v: v * w,
            h: h * w,
            capped,
        }
    };

    #[cfg(feature = "parallel")]
    let rings: Vec<Ring> = polar.par_iter().map(ring).collect();
    #[cfg(not(feature = "parallel"))]
    let rings: Vec<Ring> = polar.iter().map(ring).collect();

    // Azimuthal symmetry doubles the half-range integral
    let normalization = 2.0 / (4.0 * std::f64::consts::PI * cos_theta);
    let (sum_v, sum_h) = rings.iter().fold((0.0, 0.0), |(v, h), r| (v + r.v, h + r.h));
    let incoherent = (sum_v * normalization, sum_h * normalization);

    let mut diagnostics = Vec::new();
    if rings.iter().any(|r| r.capped) {
        log::warn!(
            "Emissivity: bistatic series truncated at {} terms for some directions (eps = {:e})",
            MAX_SERIES_TERMS,
            config.auto_select_epsilon
        );
        diagnostics.push(Diagnostic::SeriesTruncated {
            series: "emissivity".to_string(),
            terms: MAX_SERIES_TERMS,
        });
    }

    let fresnel = FresnelCoefficients::new(er, cos_theta, sin_theta);
    let (gamma_v, gamma_h) = fresnel.reflectivity();
    let attenuation = (-(2.0 * k * surface.rms_height * cos_theta).powi(2)).exp();
    let coherent = (gamma_v * attenuation, gamma_h * attenuation);

    let emissivity_v = bounded(1.0 - coherent.0 - incoherent.0, "emissivity_v", &mut diagnostics);
    let emissivity_h = bounded(1.0 - coherent.1 - incoherent.1, "emissivity_h", &mut diagnostics);
    log::debug!(
        "Emissivity: e_v = {:.4}, e_h = {:.4} (incoherent {:.4e}, {:.4e})",
        emissivity_v,
        emissivity_h,
        incoherent.0,
        incoherent.1
    );

    Ok(EmissivityResult {
        emissivity_v,
        emissivity_h,
        coherent_reflectivity: coherent,
        incoherent_reflectivity: incoherent,
        diagnostics,
    })
}

/// Clamp to [0, 1], flagging any value that needed it
fn bounded(value: f64, quantity: &str, diagnostics: &mut Vec<Diagnostic>) -> f64 {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        return value;
    }
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    log::warn!("{} = {} outside [0, 1], clamped to {}", quantity, value, clamped);
    diagnostics.push(Diagnostic::NumericInstability {
        quantity: quantity.to_string(),
        value,
    });
    clamped
}
