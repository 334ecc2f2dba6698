//! Roughness spectrum generator
//!
//! `W⁽ⁿ⁾(K)` is the Fourier (Hankel) transform of the n-th power of the surface
//! correlation function, `W⁽ⁿ⁾(K) = ∫₀^∞ ρⁿ(r) J₀(Kr) r dr`. Every family is
//! handled here; the solvers only ever see [`RoughnessSpectrum`].

use crate::core::quadrature::panel_rule;
use crate::core::special::{ln_bessel_k, ln_gamma};
use crate::types::{CorrelationType, I2emError, I2emResult, SurfaceParameters};
use std::f64::consts::{FRAC_PI_2, LN_2, PI};

/// Arguments below this are evaluated at the floor (power-law family)
const MIN_SPECTRAL_ARGUMENT: f64 = 1.0e-6;

/// Uniform panels over the first half of the stable-law angle
const XEXP_ANGLE_PANELS: usize = 4;

/// Width of the log-scale panels that approach the singular end u = π
const XEXP_LOG_PANEL_WIDTH: f64 = 2.0;

/// Closest approach to u = π, relative to the z^(-x) scale
const XEXP_ANGLE_FLOOR: f64 = 1.0e-6;

/// Panels on each side of the peak of the mixing integrand
const XEXP_PEAK_PANELS: usize = 6;

/// Drop of the log-integrand from its peak at which the mixing integral is cut
const XEXP_WINDOW: f64 = 46.0;

/// Normalized n-th order spectrum `W⁽ⁿ⁾/L²` at the dimensionless argument `kl = K·L`
pub fn spectrum(
    n: usize,
    kl: f64,
    correlation_type: CorrelationType,
    shape_exponent: f64,
) -> I2emResult<f64> {
    if n == 0 {
        return Err(I2emError::Domain(
            "spectrum order must be at least 1".to_string(),
        ));
    }
    if !(kl.is_finite() && kl >= 0.0) {
        return Err(I2emError::Domain(format!(
            "spectral argument must be finite and non-negative, got {}",
            kl
        )));
    }
    correlation_type.check_shape_exponent(shape_exponent)?;
    Ok(normalized(n, kl, correlation_type, shape_exponent))
}

fn normalized(n: usize, z: f64, correlation_type: CorrelationType, x: f64) -> f64 {
    let nf = n as f64;
    match correlation_type {
        CorrelationType::Exponential => (1.0 + (z / nf).powi(2)).powf(-1.5) / (nf * nf),
        CorrelationType::Gaussian => gaussian(nf, z),
        CorrelationType::PowerLaw => power_law(nf * x, z),
        CorrelationType::XExponential => x_exponential(nf, x, z),
    }
}

/// z^(ν-1) K_{ν-1}(z) / (2^(ν-1) Γ(ν)), the transform of (1 + t²)^(-ν)
fn power_law(nu: f64, z: f64) -> f64 {
    let z = z.max(MIN_SPECTRAL_ARGUMENT);
    let mu = nu - 1.0;
    (mu * z.ln() + ln_bessel_k(mu, z) - mu * 2f64.ln() - ln_gamma(nu)).exp()
}

fn gaussian(n: f64, z: f64) -> f64 {
    (-(z * z) / (4.0 * n)).exp() / (2.0 * n)
}

/// ∫₀^∞ exp(-n t^x) J₀(z t) t dt for 0 < x ≤ 2
///
/// Below x = 2, exp(-n t^x) is a mixture of Gaussians exp(-s t²) over a
/// one-sided stable law of index x/2, and each Gaussian transforms to
/// exp(-z²/4s)/(2s). Averaging over Kanter's representation of that law
/// leaves a double integral with a positive integrand, which stays accurate
/// for slowly decaying correlations where the Hankel integral itself cancels.
fn x_exponential(n: f64, x: f64, z: f64) -> f64 {
    if x >= 2.0 {
        return gaussian(n, z);
    }
    let mixture = StableMixture::new(n, x, z);
    let rule = panel_rule();

    let near = rule.integrate_composite(0.0, FRAC_PI_2, XEXP_ANGLE_PANELS, |u| {
        mixture.at_angle(u, u.sin())
    });

    // u = π - w with w = (π/2)e^(-y): the mixing scale diverges as w → 0 and
    // the weight sits near w ~ z^(-x) for large z
    let scale = if z > 1.0 { z.powf(-x) } else { 1.0 };
    let y_max = (FRAC_PI_2 / (XEXP_ANGLE_FLOOR * scale)).ln();
    let panels = (y_max / XEXP_LOG_PANEL_WIDTH).ceil() as usize;
    let far = rule.integrate_composite(0.0, y_max, panels, |y| {
        let w = FRAC_PI_2 * (-y).exp();
        w * mixture.at_angle(PI - w, w.sin())
    });

    (near + far) / PI
}

/// Gaussian mixture over Kanter's representation of a one-sided stable law
///
/// The mixing variable is `s = c(u)·E^(-p)` with `U ~ U(0, π)`, `E ~ Exp(1)`,
/// `c(u) = n^(1/α) A(u)^p` and `p = (1 - α)/α`.
struct StableMixture {
    alpha: f64,
    p: f64,
    /// ln(n)/α
    ln_order: f64,
    /// z²/4
    quarter_z2: f64,
}

impl StableMixture {
    fn new(n: f64, x: f64, z: f64) -> Self {
        let alpha = 0.5 * x;
        Self {
            alpha,
            p: (1.0 - alpha) / alpha,
            ln_order: n.ln() / alpha,
            quarter_z2: 0.25 * z * z,
        }
    }

    /// ln A(u), with sin u passed in so that u near π keeps its precision
    fn ln_kanter(&self, u: f64, sin_u: f64) -> f64 {
        let a = self.alpha;
        let ln_sin_au = (a * u).sin().ln();
        (ln_sin_au - sin_u.ln()) / (1.0 - a) + ((1.0 - a) * u).sin().ln() - ln_sin_au
    }

    fn at_angle(&self, u: f64, sin_u: f64) -> f64 {
        let ln_scale = self.ln_order + self.p * self.ln_kanter(u, sin_u);
        self.over_exponential(ln_scale)
    }

    /// z²/4s at v = ln E
    fn tail(&self, v: f64, ln_scale: f64) -> f64 {
        if self.quarter_z2 == 0.0 {
            return 0.0;
        }
        self.quarter_z2 * (self.p * v - ln_scale).exp()
    }

    /// ln of the integrand over v = ln E
    fn exponent(&self, v: f64, ln_scale: f64) -> f64 {
        (1.0 + self.p) * v - v.exp() - LN_2 - ln_scale - self.tail(v, ln_scale)
    }

    /// E[exp(-z²/4s)/(2s)] over E ~ Exp(1) at a fixed angle
    ///
    /// The exponent is concave in v, so Newton steps find its single peak.
    fn over_exponential(&self, ln_scale: f64) -> f64 {
        let p = self.p;
        let mut peak = 0.0_f64;
        for _ in 0..200 {
            let growth = peak.exp();
            let tail = self.tail(peak, ln_scale);
            let ratio = (1.0 + p - growth - p * tail) / (-growth - p * p * tail);
            // inf/inf only happens far right of the peak
            let step = if ratio.is_finite() { ratio.clamp(-5.0, 5.0) } else { 5.0 };
            peak -= step;
            if step.abs() < 1e-12 {
                break;
            }
        }

        let f_peak = self.exponent(peak, ln_scale);
        let inside = |v: f64| self.exponent(v, ln_scale) - f_peak > -XEXP_WINDOW;
        let mut lower = peak;
        let mut stride = 1.0;
        while inside(lower) {
            lower -= stride;
            stride *= 1.5;
        }
        let mut upper = peak;
        stride = 1.0;
        while inside(upper) {
            upper += stride;
            stride *= 1.5;
        }

        let density = |v: f64| (self.exponent(v, ln_scale) - f_peak).exp();
        let rule = panel_rule();
        f_peak.exp()
            * (rule.integrate_composite(lower, peak, XEXP_PEAK_PANELS, &density)
                + rule.integrate_composite(peak, upper, XEXP_PEAK_PANELS, &density))
    }
}

/// rms slope of the surface for the shadowing functions
pub fn rms_slope(surface: &SurfaceParameters) -> f64 {
    let ratio = surface.rms_height / surface.correlation_length;
    match surface.correlation_type {
        CorrelationType::Exponential => ratio,
        CorrelationType::Gaussian => std::f64::consts::SQRT_2 * ratio,
        CorrelationType::PowerLaw => (2.0 * surface.shape_exponent).sqrt() * ratio,
        CorrelationType::XExponential => surface.shape_exponent.sqrt() * ratio,
    }
}

/// Roughness spectrum bound to one validated surface
#[derive(Debug, Clone, Copy)]
pub struct RoughnessSpectrum {
    correlation_type: CorrelationType,
    shape_exponent: f64,
    correlation_length: f64,
}

impl RoughnessSpectrum {
    pub fn new(surface: &SurfaceParameters) -> I2emResult<Self> {
        surface.validate()?;
        Ok(Self {
            correlation_type: surface.correlation_type,
            shape_exponent: surface.shape_exponent,
            correlation_length: surface.correlation_length,
        })
    }

    pub fn correlation_type(&self) -> CorrelationType {
        self.correlation_type
    }

    /// `W⁽ⁿ⁾(K)` in m² for the surface wavenumber `K` (rad/m), n ≥ 1
    pub fn value(&self, n: usize, wavenumber: f64) -> f64 {
        let l = self.correlation_length;
        l * l
            * normalized(
                n.max(1),
                wavenumber.abs() * l,
                self.correlation_type,
                self.shape_exponent,
            )
    }

    /// `W⁽¹⁾ .. W⁽ᴺ⁾` at one wavenumber
    pub fn series(&self, wavenumber: f64, terms: usize) -> Vec<f64> {
        (1..=terms).map(|n| self.value(n, wavenumber)).collect()
    }
}
