//! Co-polarized bistatic I2EM solver
//!
//! σ⁰_pp = (k²/2)·exp(−σ²(k_z² + k_sz²)) · Σₙ σ²ⁿ/n! · |Iₙ_pp|² · W⁽ⁿ⁾(K)
//!
//! `Iₙ` combines the Kirchhoff term `(k_z + k_sz)ⁿ f_pp exp(−σ² k_z k_sz)` with the
//! four complementary terms. All powers and factorials are folded into one
//! exponent per term, so large orders neither overflow nor lose precision.

use crate::config::SolverConfig;
use crate::core::field_coefficients::{
    backscatter_shadowing, normal_incidence_reflection, transition_factor,
    ComplementaryCoefficients, ComplementaryPair, FresnelCoefficients, KirchhoffCoefficients,
    ScatteringAngles,
};
use crate::core::series::auto_term_count;
use crate::core::special::ln_factorial;
use crate::core::spectrum::{rms_slope, RoughnessSpectrum};
use crate::types::{
    to_db, validate_permittivity, CoPolResult, Diagnostic, I2emResult, Permittivity, RadarGeometry,
    SurfaceParameters,
};
use num_complex::Complex64;

/// Linear bistatic scattering coefficients of one direction, before shadowing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BistaticSigma {
    pub vv: f64,
    pub hh: f64,
    /// Kirchhoff-only cross-polarized coefficient
    pub hv: f64,
    pub terms: usize,
    pub capped: bool,
}

/// Evaluator for one surface, wavenumber and permittivity; reused across directions
#[derive(Debug, Clone, Copy)]
pub struct BistaticModel {
    spectrum: RoughnessSpectrum,
    rms_height: f64,
    k: f64,
    er: Permittivity,
    epsilon: f64,
}

impl BistaticModel {
    /// `k` in rad/m; inputs are assumed validated
    pub fn new(spectrum: RoughnessSpectrum, rms_height: f64, k: f64, er: Permittivity, epsilon: f64) -> Self {
        Self {
            spectrum,
            rms_height,
            k,
            er,
            epsilon,
        }
    }

    /// Scattering coefficients for the incidence and scattering angles given
    pub fn evaluate(&self, angles: &ScatteringAngles) -> BistaticSigma {
        let k = self.k;
        let sigma = self.rms_height;
        let er = self.er;
        let ks = k * sigma;
        let kz = k * angles.cs;
        let ksz = k * angles.css;

        let selection = auto_term_count((ks * (angles.cs + angles.css)).powi(2), self.epsilon);
        let terms = selection.terms;
        let wavenumber = k * angles.spectral_argument();
        let spectra = self.spectrum.series(wavenumber, terms);

        let incident = FresnelCoefficients::new(er, angles.cs, angles.s);
        let tf = transition_factor(er, angles.cs, angles.s, ks, &spectra);
        let rv0 = normal_incidence_reflection(er);
        let transitioned = FresnelCoefficients {
            rv: incident.rv + (rv0 - incident.rv) * tf,
            rh: incident.rh + (-rv0 - incident.rh) * tf,
        };
        let kirchhoff = KirchhoffCoefficients::new(&transitioned, &incident, angles);
        let complementary = ComplementaryCoefficients::new(&incident, er, k, angles);

        let s2 = sigma * sigma;
        let half_attenuation = 0.5 * s2 * (kz * kz + ksz * ksz);
        let kirchhoff_exponent = -s2 * kz * ksz;
        // (coefficient, base of the (n-1)-th power, attenuation exponent)
        let branches: [(ComplementaryPair, f64, f64); 4] = [
            (
                complementary.up_incident,
                ksz - kz,
                -s2 * (kz * kz - kz * (ksz - kz)),
            ),
            (
                complementary.down_incident,
                ksz + kz,
                -s2 * (kz * kz + kz * (ksz - kz)),
            ),
            (
                complementary.up_scattered,
                kz + ksz,
                -s2 * (ksz * ksz - ksz * (ksz - kz)),
            ),
            (
                complementary.down_scattered,
                kz - ksz,
                -s2 * (ksz * ksz + ksz * (ksz - kz)),
            ),
        ];

        let mut vv = 0.0;
        let mut hh = 0.0;
        let mut hv = 0.0;
        let ln_sigma = sigma.ln();
        let ln_kirchhoff_base = (kz + ksz).ln();
        for (index, &w) in spectra.iter().enumerate() {
            let n = index + 1;
            let ln_scale = n as f64 * ln_sigma - 0.5 * ln_factorial(n) - half_attenuation;
            let kv = (n as f64 * ln_kirchhoff_base + ln_scale + kirchhoff_exponent).exp();

            let mut ivv = kirchhoff.fvv * kv;
            let mut ihh = kirchhoff.fhh * kv;
            for (pair, base, exponent) in &branches {
                let factor = 0.25 * scaled_power(*base, n - 1, ln_scale + exponent);
                ivv += pair.vv * factor;
                ihh += pair.hh * factor;
            }
            let ihv: Complex64 = kirchhoff.fvh * kv;

            vv += ivv.norm_sqr() * w;
            hh += ihh.norm_sqr() * w;
            hv += ihv.norm_sqr() * w;
        }

        let prefactor = 0.5 * k * k;
        BistaticSigma {
            vv: prefactor * vv,
            hh: prefactor * hh,
            hv: prefactor * hv,
            terms,
            capped: selection.capped,
        }
    }
}

/// `baseᵖ · exp(ln_extra)` with the sign of the power kept
fn scaled_power(base: f64, power: usize, ln_extra: f64) -> f64 {
    if power == 0 {
        return ln_extra.exp();
    }
    if base == 0.0 {
        return 0.0;
    }
    let magnitude = (power as f64 * base.abs().ln() + ln_extra).exp();
    if base < 0.0 && power % 2 == 1 {
        -magnitude
    } else {
        magnitude
    }
}

/// Co-polarized σ⁰ for an arbitrary bistatic geometry
///
/// Backscatter geometries (scattering angle equal to incidence, relative
/// azimuth 180°) include the monostatic shadowing factor.
pub fn solve_copol(
    surface: &SurfaceParameters,
    geometry: &RadarGeometry,
    er: Permittivity,
    config: &SolverConfig,
) -> I2emResult<CoPolResult> {
    surface.validate()?;
    geometry.validate()?;
    validate_permittivity(er)?;
    config.validate()?;

    let spectrum = RoughnessSpectrum::new(surface)?;
    let k = geometry.wavenumber();
    log::debug!(
        "Co-pol: f = {} GHz, θi = {}°, θs = {}°, φs = {}°, σ = {} m, L = {} m, {}, εr = {}",
        geometry.frequency_ghz,
        geometry.incidence_angle_deg,
        geometry.scattering_angle_deg,
        geometry.relative_azimuth_deg,
        surface.rms_height,
        surface.correlation_length,
        surface.correlation_type,
        er
    );

    let theta_i = geometry.incidence_angle_deg.to_radians();
    let angles = ScatteringAngles::new(
        theta_i,
        geometry.scattering_angle_deg.to_radians(),
        geometry.relative_azimuth_deg.to_radians(),
    );
    let model = BistaticModel::new(spectrum, surface.rms_height, k, er, config.auto_select_epsilon);
    let sigma = model.evaluate(&angles);
    log::debug!("Co-pol series used {} terms", sigma.terms);

    let mut diagnostics = Vec::new();
    if sigma.capped {
        log::warn!(
            "Co-pol series truncated at {} terms before reaching eps = {:e} (ks = {:.3})",
            sigma.terms,
            config.auto_select_epsilon,
            k * surface.rms_height
        );
        diagnostics.push(Diagnostic::SeriesTruncated {
            series: "copol".to_string(),
            terms: sigma.terms,
        });
    }

    let shadowing = if geometry.is_backscatter() {
        backscatter_shadowing(theta_i, rms_slope(surface))
    } else {
        1.0
    };
    let sigma0_vv = sigma.vv * shadowing;
    let sigma0_hh = sigma.hh * shadowing;

    let sigma0_vv_db = to_db(sigma0_vv, "sigma0_vv", &mut diagnostics);
    let sigma0_hh_db = to_db(sigma0_hh, "sigma0_hh", &mut diagnostics);

    Ok(CoPolResult {
        sigma0_vv_db,
        sigma0_hh_db,
        sigma0_vv: finite_or_zero(sigma0_vv),
        sigma0_hh: finite_or_zero(sigma0_hh),
        terms: sigma.terms,
        diagnostics,
    })
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}
