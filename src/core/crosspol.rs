//! IEMX cross-polarized backscatter
//!
//! The multiple-scattering VH term is a 2-D integral over the normalized
//! transverse wavenumber of the intermediate direction, `r ∈ [0.1, 1]` and
//! `φ ∈ [0, π]`, of `|F_vh|²` weighted by two spectral series and a shadowing
//! factor. The integral is evaluated with the adaptive cubature of
//! [`crate::core::cubature`] under the configured budget.

use crate::config::SolverConfig;
use crate::core::cubature;
use crate::core::field_coefficients::{
    crosspol_coefficient, multiple_scatter_shadowing, FresnelCoefficients,
};
use crate::core::series::{auto_term_count, FIXED_CROSSPOL_TERMS};
use crate::core::special::power_over_factorial;
use crate::core::spectrum::{rms_slope, RoughnessSpectrum};
use crate::types::{
    to_db, validate_permittivity, CrossPolResult, Diagnostic, I2emResult, Permittivity,
    RadarGeometry, SurfaceParameters,
};
use num_complex::Complex64;

/// Lower edge of the radial integration variable
pub const RADIAL_LOWER_BOUND: f64 = 0.1;

/// Integrand of the cross-pol integral for one surface and geometry
struct CrossPolKernel {
    spectrum: RoughnessSpectrum,
    /// `(ks cosθ)²ⁿ/n! · k²` for n = 1..N
    weights: Vec<f64>,
    k: f64,
    sin_theta: f64,
    cos_theta: f64,
    rvh: Complex64,
    er: Permittivity,
    rms_slope: f64,
    prefactor: f64,
}

impl CrossPolKernel {
    fn spectral_sum(&self, kx: f64, ky: f64) -> f64 {
        let wavenumber = self.k * (kx * kx + ky * ky).sqrt();
        self.weights
            .iter()
            .enumerate()
            .map(|(index, weight)| weight * self.spectrum.value(index + 1, wavenumber))
            .sum()
    }

    fn evaluate(&self, r: f64, phi: f64) -> f64 {
        let rx = r * phi.cos();
        let ry = r * phi.sin();
        let fvh = crosspol_coefficient(self.rvh, self.er, r, rx, ry, self.cos_theta);
        if fvh == 0.0 {
            return 0.0;
        }
        let sn = self.spectral_sum(rx - self.sin_theta, ry);
        let sm = self.spectral_sum(rx + self.sin_theta, ry);
        let shadowing = multiple_scatter_shadowing(r, self.rms_slope);
        self.prefactor * fvh * sn * sm * r * shadowing
    }
}

/// Cross-polarized σ⁰_vh in the monostatic geometry
///
/// With `auto_select` the number of spectral terms follows the configured
/// epsilon; otherwise a fixed count of 15 is used.
pub fn solve_crosspol(
    surface: &SurfaceParameters,
    frequency_ghz: f64,
    incidence_deg: f64,
    er: Permittivity,
    auto_select: bool,
    config: &SolverConfig,
) -> I2emResult<CrossPolResult> {
    surface.validate()?;
    let geometry = RadarGeometry::monostatic(frequency_ghz, incidence_deg);
    geometry.validate()?;
    validate_permittivity(er)?;
    config.validate()?;

    let spectrum = RoughnessSpectrum::new(surface)?;
    let k = geometry.wavenumber();
    let theta = incidence_deg.to_radians();
    let (sin_theta, cos_theta) = theta.sin_cos();
    let ks = k * surface.rms_height;

    let mut diagnostics = Vec::new();
    let terms = if auto_select {
        let selection = auto_term_count((2.0 * ks * cos_theta).powi(2), config.auto_select_epsilon);
        if selection.capped {
            log::warn!(
                "Cross-pol series truncated at {} terms before reaching eps = {:e} (ks = {:.3})",
                selection.terms,
                config.auto_select_epsilon,
                ks
            );
            diagnostics.push(Diagnostic::SeriesTruncated {
                series: "crosspol".to_string(),
                terms: selection.terms,
            });
        }
        selection.terms
    } else {
        FIXED_CROSSPOL_TERMS
    };
    log::debug!(
        "Cross-pol: f = {} GHz, θ = {}°, σ = {} m, L = {} m, {}, {} spectral terms{}",
        frequency_ghz,
        incidence_deg,
        surface.rms_height,
        surface.correlation_length,
        surface.correlation_type,
        terms,
        if auto_select { " (auto)" } else { "" }
    );

    let x = (ks * cos_theta).powi(2);
    let weights = (1..=terms)
        .map(|n| power_over_factorial(x, n) * k * k)
        .collect();
    let fresnel = FresnelCoefficients::new(er, cos_theta, sin_theta);
    let kernel = CrossPolKernel {
        spectrum,
        weights,
        k,
        sin_theta,
        cos_theta,
        rvh: 0.5 * (fresnel.rv - fresnel.rh),
        er,
        rms_slope: rms_slope(surface),
        prefactor: (-2.0 * x).exp() / (4.0 * std::f64::consts::PI),
    };

    let report = cubature::integrate(
        |p| kernel.evaluate(p[0], p[1]),
        &[RADIAL_LOWER_BOUND, 0.0],
        &[1.0, std::f64::consts::PI],
        &config.integrator,
    );
    log::debug!(
        "Cross-pol cubature: {} evaluations, estimate {:.4e} ± {:.2e}",
        report.evaluations,
        report.value,
        report.error
    );

    if !report.converged {
        diagnostics.push(Diagnostic::IntegrationIncomplete {
            evaluations: report.evaluations,
            estimate: report.value,
            error: report.error,
        });
    }

    let sigma0_vh = report.value * config.vh_power_scale;
    let sigma0_vh_db = to_db(sigma0_vh, "sigma0_vh", &mut diagnostics);

    Ok(CrossPolResult {
        sigma0_vh_db,
        sigma0_vh: if sigma0_vh.is_finite() { sigma0_vh.max(0.0) } else { 0.0 },
        terms,
        integration: report,
        diagnostics,
    })
}
