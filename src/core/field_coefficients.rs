//! Kirchhoff and complementary field coefficients
//!
//! All coefficients are closed-form. The incident direction lies in the x-z
//! plane (incident azimuth 0); the scattered direction is given by its polar
//! angle and relative azimuth.

use crate::core::special::{erfc, power_over_factorial};
use crate::types::Permittivity;
use num_complex::Complex64;

/// Below this magnitude the transition function is not evaluated
const TRANSITION_GUARD: f64 = 1.0e-12;

/// Keeps `sqrt(1 - r²)` away from zero at the edge of the cross-pol domain
const GRAZING_GUARD: f64 = 1.0e-4;

/// Sines and cosines of the bistatic geometry
#[derive(Debug, Clone, Copy)]
pub struct ScatteringAngles {
    /// cos θᵢ
    pub cs: f64,
    /// sin θᵢ
    pub s: f64,
    /// cos θₛ
    pub css: f64,
    /// sin θₛ
    pub ss: f64,
    /// cos φₛ
    pub cfs: f64,
    /// sin φₛ
    pub sfs: f64,
}

impl ScatteringAngles {
    /// Angles in radians
    pub fn new(theta_i: f64, theta_s: f64, phi_s: f64) -> Self {
        Self {
            cs: theta_i.cos(),
            s: theta_i.sin(),
            css: theta_s.cos(),
            ss: theta_s.sin(),
            cfs: phi_s.cos(),
            sfs: phi_s.sin(),
        }
    }

    /// Magnitude of the surface wavenumber `|k_s,xy − k_i,xy| / k`
    pub fn spectral_argument(&self) -> f64 {
        ((self.ss * self.cfs - self.s).powi(2) + (self.ss * self.sfs).powi(2)).sqrt()
    }
}

/// Fresnel reflection coefficients at one angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FresnelCoefficients {
    pub rv: Complex64,
    pub rh: Complex64,
}

impl FresnelCoefficients {
    pub fn new(er: Permittivity, cs: f64, s: f64) -> Self {
        let rt = (er - s * s).sqrt();
        Self {
            rv: (er * cs - rt) / (er * cs + rt),
            rh: (cs - rt) / (cs + rt),
        }
    }

    /// Power reflectivities (|Rv|², |Rh|²)
    pub fn reflectivity(&self) -> (f64, f64) {
        (self.rv.norm_sqr(), self.rh.norm_sqr())
    }
}

/// Vertical reflection coefficient at normal incidence
pub fn normal_incidence_reflection(er: Permittivity) -> Complex64 {
    let root = er.sqrt();
    (root - 1.0) / (root + 1.0)
}

/// Reflection transition factor `T_f` between the Fresnel coefficients at the
/// incidence angle (`T_f = 0`) and at normal incidence (`T_f = 1`)
///
/// `spectra` holds `W⁽ⁿ⁾` for n = 1.. at the scattering wavenumber.
pub fn transition_factor(er: Permittivity, cs: f64, s: f64, ks: f64, spectra: &[f64]) -> f64 {
    let rv0 = normal_incidence_reflection(er);
    let rt = (er - s * s).sqrt();
    let ft = 8.0 * rv0 * rv0 * s * s * (cs + rt) / (cs * rt);
    if !(ft.norm() > TRANSITION_GUARD) || rv0.norm() < TRANSITION_GUARD {
        return 0.0;
    }

    let attenuation = (-(ks * cs).powi(2)).exp();
    let x = (ks * cs).powi(2);
    let mut a1 = 0.0;
    let mut b1 = 0.0;
    for (index, &w) in spectra.iter().enumerate() {
        let n = index + 1;
        let a0 = power_over_factorial(x, n);
        a1 += a0 * w;
        let shifted = ft / 2.0 + 2f64.powi(n as i32 + 2) * rv0 / cs * attenuation;
        b1 += a0 * shifted.norm_sqr() * w;
    }

    let st = 0.25 * ft.norm_sqr() * a1 / b1;
    let st0 = 1.0 / (1.0 + 8.0 * rv0 / (cs * ft)).norm_sqr();
    let tf = 1.0 - st / st0;
    if tf.is_finite() {
        tf
    } else {
        log::debug!("Transition factor not finite (a1 = {:e}, b1 = {:e}); using incidence-angle Fresnel", a1, b1);
        0.0
    }
}

/// Kirchhoff (single-scattering) field coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KirchhoffCoefficients {
    pub fvv: Complex64,
    pub fhh: Complex64,
    pub fvh: Complex64,
}

impl KirchhoffCoefficients {
    /// `transition` holds the transitioned coefficients for the co-pol terms,
    /// `incident` the plain Fresnel coefficients for the cross-pol term
    pub fn new(
        transition: &FresnelCoefficients,
        incident: &FresnelCoefficients,
        angles: &ScatteringAngles,
    ) -> Self {
        let a = angles;
        let geometry = (a.s * a.ss - (1.0 + a.cs * a.css) * a.cfs) / (a.cs + a.css);
        Self {
            fvv: 2.0 * transition.rv * geometry,
            fhh: -2.0 * transition.rh * geometry,
            fvh: (incident.rv - incident.rh) * a.sfs,
        }
    }
}

/// Which medium the complementary field propagates through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplementaryPath {
    /// Associated with the incident wave
    Incident,
    /// Associated with the scattered wave
    Scattered,
}

/// One complementary coefficient pair (vv, hh)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplementaryPair {
    pub vv: Complex64,
    pub hh: Complex64,
}

/// The four complementary field coefficients (upward/downward, incident/scattered)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplementaryCoefficients {
    pub up_incident: ComplementaryPair,
    pub down_incident: ComplementaryPair,
    pub up_scattered: ComplementaryPair,
    pub down_scattered: ComplementaryPair,
}

impl ComplementaryCoefficients {
    /// `k` is the free-space wavenumber (rad/m); coefficients scale as `k`
    pub fn new(
        fresnel: &FresnelCoefficients,
        er: Permittivity,
        k: f64,
        angles: &ScatteringAngles,
    ) -> Self {
        Self {
            up_incident: complementary(1.0, ComplementaryPath::Incident, fresnel, er, k, angles),
            down_incident: complementary(-1.0, ComplementaryPath::Incident, fresnel, er, k, angles),
            up_scattered: complementary(1.0, ComplementaryPath::Scattered, fresnel, er, k, angles),
            down_scattered: complementary(-1.0, ComplementaryPath::Scattered, fresnel, er, k, angles),
        }
    }
}

/// Complementary coefficient for one propagation direction (`ud = ±1`) and path
pub fn complementary(
    ud: f64,
    path: ComplementaryPath,
    fresnel: &FresnelCoefficients,
    er: Permittivity,
    k: f64,
    angles: &ScatteringAngles,
) -> ComplementaryPair {
    let ScatteringAngles {
        cs,
        s,
        css,
        ss,
        cfs,
        sfs,
    } = *angles;
    let kz = k * cs;
    let ksz = k * css;
    let sfs2 = sfs * sfs;
    // In-plane projection of the scattered direction relative to the incident one
    let dx = ss * cfs - s;

    // c1..c5 with the vertical wavenumber g of the upper (real) or lower (complex) medium
    let coefficients = |g: Complex64| -> [Complex64; 5] {
        match path {
            ComplementaryPath::Incident => {
                let qi = ud * kz;
                [
                    Complex64::from(k * cfs * (ksz - qi)),
                    cs * (cfs * (k * k * s * dx + g * (k * css - qi)) + k * k * s * ss * sfs2),
                    k * s * (s * cfs * (k * css - qi) - g * (cfs * dx + ss * sfs2)),
                    Complex64::from(k * cs * (cfs * css * (k * css - qi) + k * ss * dx)),
                    g * (cfs * css * (qi - k * css) - k * ss * dx),
                ]
            }
            ComplementaryPath::Scattered => {
                let qs = ud * ksz;
                [
                    Complex64::from(k * cfs * (kz + qs)),
                    g * (cfs * (cs * (kz + qs) - k * s * dx) - k * s * ss * sfs2),
                    Complex64::from(k * ss * (k * cs * dx + s * (kz + qs))),
                    Complex64::from(k * css * (cfs * (cs * (kz + qs) - k * s * dx) - k * s * ss * sfs2)),
                    -css * (k * k * ss * dx + g * cfs * (kz + qs)),
                ]
            }
        }
    };

    // Vertical wavenumbers of the path's own direction above and below the surface
    let (q, qt) = match path {
        ComplementaryPath::Incident => (kz, k * (er - s * s).sqrt()),
        ComplementaryPath::Scattered => (ksz, k * (er - ss * ss).sqrt()),
    };
    let [c11, c21, c31, c41, c51] = coefficients(Complex64::from(ud * q));
    let [c12, c22, c32, c42, c52] = coefficients(ud * qt);

    let rv = fresnel.rv;
    let vv = (1.0 + rv) * (-(1.0 - rv) * c11 / q + (1.0 + rv) * c12 / qt)
        + (1.0 - rv) * ((1.0 - rv) * c21 / q - (1.0 + rv) * c22 / qt)
        + (1.0 + rv) * ((1.0 - rv) * c31 / q - (1.0 + rv) * c32 / er / qt)
        + (1.0 - rv) * ((1.0 + rv) * c41 / q - er * (1.0 - rv) * c42 / qt)
        + (1.0 + rv) * ((1.0 + rv) * c51 / q - (1.0 - rv) * c52 / qt);

    let rh = fresnel.rh;
    let hh = (1.0 + rh) * ((1.0 - rh) * c11 / q - er * (1.0 + rh) * c12 / qt)
        - (1.0 - rh) * ((1.0 - rh) * c21 / q - (1.0 + rh) * c22 / qt)
        - (1.0 + rh) * ((1.0 - rh) * c31 / q - (1.0 + rh) * c32 / qt)
        - (1.0 - rh) * ((1.0 + rh) * c41 / q - (1.0 - rh) * c42 / qt)
        - (1.0 + rh) * ((1.0 + rh) * c51 / q - (1.0 - rh) * c52 / qt);

    ComplementaryPair { vv, hh }
}

/// Shadowing function term `(exp(-a²)/(√π a) − erfc(a)) / 2` for `a = cot θ / (√2 s)`
pub fn shadowing_term(a: f64) -> f64 {
    if !(a.is_finite() && a > 0.0) {
        return 0.0;
    }
    (0.5 * ((-a * a).exp() / (std::f64::consts::PI.sqrt() * a) - erfc(a))).max(0.0)
}

/// Monostatic shadowing factor of the co-pol backscatter
pub fn backscatter_shadowing(theta: f64, rms_slope: f64) -> f64 {
    if theta <= 0.0 || rms_slope <= 0.0 {
        return 1.0;
    }
    let a = 1.0 / theta.tan() / std::f64::consts::SQRT_2 / rms_slope;
    let term = shadowing_term(a);
    1.0 / (1.0 + 2.0 * term)
}

/// Squared cross-pol multiple-scattering coefficient `|F_vh|²` at the
/// normalized transverse wavenumber `(rx, ry)`, `r = |(rx, ry)|`
pub fn crosspol_coefficient(rvh: Complex64, er: Permittivity, r: f64, rx: f64, ry: f64, cs: f64) -> f64 {
    let r2 = r * r;
    let q = (1.0 + GRAZING_GUARD - r2).sqrt();
    let qt = (er - r2).sqrt();

    let rp = 1.0 + rvh;
    let rm = 1.0 - rvh;
    let a = rp / q;
    let b = rm / q;
    let c = rp / qt;
    let d = rm / qt;

    let b3 = rx * ry / cs;
    let fvh1 = (b - c) * (1.0 - 3.0 * rvh) - (b - c / er) * rp;
    let fvh2 = (a - d) * (1.0 + 3.0 * rvh) - (a - d * er) * rm;
    ((fvh1 + fvh2) * b3).norm_sqr()
}

/// Shadowing of the intermediate multiple-scattering direction at `r = sin θ'`
pub fn multiple_scatter_shadowing(r: f64, rms_slope: f64) -> f64 {
    let q = (1.0 + GRAZING_GUARD - r * r).sqrt();
    let a = q / r / std::f64::consts::SQRT_2 / rms_slope;
    1.0 / (1.0 + shadowing_term(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn soil() -> Permittivity {
        Permittivity::new(11.3, 1.5)
    }

    #[test]
    fn test_fresnel_normal_incidence() {
        let f = FresnelCoefficients::new(soil(), 1.0, 0.0);
        let r0 = normal_incidence_reflection(soil());
        assert_relative_eq!(f.rv.re, r0.re, epsilon = 1e-14);
        assert_relative_eq!(f.rv.im, r0.im, epsilon = 1e-14);
        assert_relative_eq!(f.rh.re, -r0.re, epsilon = 1e-14);
        let (gv, gh) = f.reflectivity();
        assert_relative_eq!(gv, gh, epsilon = 1e-14);
    }

    #[test]
    fn test_fresnel_vacuum_is_transparent() {
        let f = FresnelCoefficients::new(Permittivity::new(1.0, 0.0), 0.5f64.cos(), 0.5f64.sin());
        assert!(f.rv.norm() < 1e-14);
        assert!(f.rh.norm() < 1e-14);
    }

    #[test]
    fn test_transition_factor_guards() {
        // Normal incidence: F_t = 0
        assert_eq!(transition_factor(soil(), 1.0, 0.0, 0.1, &[1e-4, 1e-5]), 0.0);
        // Vacuum: R(0) = 0
        let t = 0.5f64;
        assert_eq!(
            transition_factor(Permittivity::new(1.0, 0.0), t.cos(), t.sin(), 0.1, &[1e-4]),
            0.0
        );
        let tf = transition_factor(soil(), t.cos(), t.sin(), 0.3, &[1e-3, 5e-4, 2e-4]);
        assert!(tf.is_finite());
    }

    #[test]
    fn test_kirchhoff_backscatter_reduces_to_monostatic_form() {
        let theta = 30f64.to_radians();
        let angles = ScatteringAngles::new(theta, theta, std::f64::consts::PI);
        let fresnel = FresnelCoefficients::new(soil(), angles.cs, angles.s);
        let k = KirchhoffCoefficients::new(&fresnel, &fresnel, &angles);
        let expected_vv = 2.0 * fresnel.rv / angles.cs;
        let expected_hh = -2.0 * fresnel.rh / angles.cs;
        assert_relative_eq!(k.fvv.re, expected_vv.re, epsilon = 1e-12);
        assert_relative_eq!(k.fhh.im, expected_hh.im, epsilon = 1e-12);
        assert!(k.fvh.norm() < 1e-12);
        assert_relative_eq!(angles.spectral_argument(), 2.0 * theta.sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_complementary_vanishes_without_dielectric_contrast() {
        let angles = ScatteringAngles::new(0.4, 0.7, 2.0);
        let vacuum = Permittivity::new(1.0, 0.0);
        let fresnel = FresnelCoefficients::new(vacuum, angles.cs, angles.s);
        let c = ComplementaryCoefficients::new(&fresnel, vacuum, 60.0, &angles);
        for pair in [c.up_incident, c.down_incident, c.up_scattered, c.down_scattered] {
            assert!(pair.vv.norm() < 1e-9, "vv = {}", pair.vv);
            assert!(pair.hh.norm() < 1e-9, "hh = {}", pair.hh);
        }
    }

    #[test]
    fn test_shadowing_bounds() {
        assert_eq!(backscatter_shadowing(0.0, 0.1), 1.0);
        for deg in [10.0f64, 30.0, 60.0, 85.0] {
            let s = backscatter_shadowing(deg.to_radians(), 0.3);
            assert!(s > 0.0 && s <= 1.0);
        }
        // Steeper look angles shadow more
        assert!(
            backscatter_shadowing(80f64.to_radians(), 0.3)
                < backscatter_shadowing(20f64.to_radians(), 0.3)
        );
        let m = multiple_scatter_shadowing(0.9, 0.2);
        assert!(m > 0.0 && m <= 1.0);
    }

    #[test]
    fn test_crosspol_coefficient_zero_on_axes() {
        let rvh = Complex64::new(0.3, -0.01);
        assert_eq!(crosspol_coefficient(rvh, soil(), 0.5, 0.5, 0.0, 0.8), 0.0);
        assert_eq!(crosspol_coefficient(rvh, soil(), 0.5, 0.0, 0.5, 0.8), 0.0);
        assert!(crosspol_coefficient(rvh, soil(), 0.5, 0.3, 0.4, 0.8) > 0.0);
    }
}
