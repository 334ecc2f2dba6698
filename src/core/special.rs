//! Special functions used by the roughness spectra and shadowing terms

use crate::core::quadrature::panel_rule;
use scilib::math::basic::erf;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// ln Γ(x) for x > 0 (Lanczos approximation)
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut series = LANCZOS_COEFFICIENTS[0];
    for (i, &c) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        series += c / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

/// ln(n!)
pub fn ln_factorial(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        _ => ln_gamma(n as f64 + 1.0),
    }
}

/// x^n / n! evaluated in log space; zero for x = 0
pub fn power_over_factorial(x: f64, n: usize) -> f64 {
    if x <= 0.0 {
        return if n == 0 { 1.0 } else { 0.0 };
    }
    (n as f64 * x.ln() - ln_factorial(n)).exp()
}

/// ln K_ν(z) for real order and z > 0
///
/// Integrates K_ν(z) = ∫₀^∞ exp(-z cosh t) cosh(νt) dt after factoring out the
/// integrand peak at sinh t* = |ν|/z, so large orders at small arguments stay
/// representable.
pub fn ln_bessel_k(order: f64, z: f64) -> f64 {
    let mu = order.abs();
    let exponent = |t: f64| -z * t.cosh() + mu * t;
    let peak = (mu / z).asinh();
    let f_peak = exponent(peak);

    // Width of the peak from the curvature z·cosh(t*)
    let width = (z * z + mu * mu).sqrt().sqrt().recip().min(1.0);

    let mut upper = peak + width;
    while exponent(upper) - f_peak > -50.0 {
        upper += (upper - peak).max(width);
    }
    let mut lower = peak;
    while lower > 0.0 && exponent(lower) - f_peak > -50.0 {
        lower = (lower - (peak - lower).max(width)).max(0.0);
    }

    let panels = (((upper - lower) / (0.5 * width)).ceil() as usize).clamp(8, 256);
    let integral = panel_rule().integrate_composite(lower, upper, panels, |t| {
        (exponent(t) - f_peak).exp() * 0.5 * (1.0 + (-2.0 * mu * t).exp())
    });

    f_peak + integral.ln()
}

/// Above this argument erfc switches to its asymptotic expansion
const ERFC_ASYMPTOTIC_ARGUMENT: f64 = 4.0;

/// Complementary error function
pub fn erfc(x: f64) -> f64 {
    if x > ERFC_ASYMPTOTIC_ARGUMENT {
        let y = 1.0 / (2.0 * x * x);
        let series = 1.0 - y * (1.0 - 3.0 * y * (1.0 - 5.0 * y * (1.0 - 7.0 * y)));
        return (-x * x).exp() / (x * std::f64::consts::PI.sqrt()) * series;
    }
    if x < -ERFC_ASYMPTOTIC_ARGUMENT {
        return 2.0 - erfc(-x);
    }
    1.0 - erf(x)
}
