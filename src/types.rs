use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Complex relative permittivity of the surface (real part, loss as positive imaginary part)
pub type Permittivity = Complex64;

/// Decibel value reported for a linear power at or below [`LINEAR_FLOOR`]
pub const FLOOR_DB: f64 = -300.0;

/// Smallest linear power passed to `10·log10`
pub const LINEAR_FLOOR: f64 = 1.0e-30;

/// Largest shape exponent for which exp(-(r/L)^x) is a valid correlation
pub const MAX_X_EXPONENTIAL_SHAPE: f64 = 2.0;

/// Surface height autocorrelation function family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationType {
    /// exp(-r/L)
    Exponential,
    /// exp(-r²/L²)
    Gaussian,
    /// (1 + r²/L²)^(-x)
    PowerLaw,
    /// exp(-(r/L)^x)
    XExponential,
}

impl CorrelationType {
    /// Map the integer code used by the calling application (1..=4)
    pub fn from_code(code: i32) -> I2emResult<Self> {
        match code {
            1 => Ok(CorrelationType::Exponential),
            2 => Ok(CorrelationType::Gaussian),
            3 => Ok(CorrelationType::PowerLaw),
            4 => Ok(CorrelationType::XExponential),
            other => Err(I2emError::Domain(format!(
                "Unknown correlation function code {} (expected 1=exponential, 2=Gaussian, 3=power-law, 4=x-exponential)",
                other
            ))),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            CorrelationType::Exponential => 1,
            CorrelationType::Gaussian => 2,
            CorrelationType::PowerLaw => 3,
            CorrelationType::XExponential => 4,
        }
    }

    /// Whether the shape exponent enters the spectrum formula
    pub fn uses_shape_exponent(&self) -> bool {
        matches!(self, CorrelationType::PowerLaw | CorrelationType::XExponential)
    }

    /// Check a shape exponent against this family
    ///
    /// Power-law needs `x > 0`; x-exponential needs `0 < x ≤ 2`, beyond which
    /// its transform turns negative.
    pub fn check_shape_exponent(&self, shape_exponent: f64) -> I2emResult<()> {
        if !self.uses_shape_exponent() {
            return Ok(());
        }
        if !(shape_exponent.is_finite() && shape_exponent > 0.0) {
            return Err(I2emError::Domain(format!(
                "{} correlation requires a positive shape exponent, got {}",
                self, shape_exponent
            )));
        }
        if *self == CorrelationType::XExponential && shape_exponent > MAX_X_EXPONENTIAL_SHAPE {
            return Err(I2emError::Domain(format!(
                "x-exponential shape exponent must not exceed {}, got {}",
                MAX_X_EXPONENTIAL_SHAPE, shape_exponent
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for CorrelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrelationType::Exponential => write!(f, "exponential"),
            CorrelationType::Gaussian => write!(f, "Gaussian"),
            CorrelationType::PowerLaw => write!(f, "power-law"),
            CorrelationType::XExponential => write!(f, "x-exponential"),
        }
    }
}

/// Statistical description of the rough surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceParameters {
    /// Standard deviation of the surface height (m)
    pub rms_height: f64,
    /// Correlation length (m)
    pub correlation_length: f64,
    pub correlation_type: CorrelationType,
    /// Exponent `x` of the power-law / x-exponential families, ignored otherwise
    pub shape_exponent: f64,
}

impl SurfaceParameters {
    pub fn new(
        rms_height: f64,
        correlation_length: f64,
        correlation_type: CorrelationType,
        shape_exponent: f64,
    ) -> Self {
        Self {
            rms_height,
            correlation_length,
            correlation_type,
            shape_exponent,
        }
    }

    pub fn validate(&self) -> I2emResult<()> {
        if !(self.rms_height.is_finite() && self.rms_height > 0.0) {
            return Err(I2emError::Domain(format!(
                "rms height must be positive, got {}",
                self.rms_height
            )));
        }
        if !(self.correlation_length.is_finite() && self.correlation_length > 0.0) {
            return Err(I2emError::Domain(format!(
                "correlation length must be positive, got {}",
                self.correlation_length
            )));
        }
        self.correlation_type.check_shape_exponent(self.shape_exponent)
    }
}

/// Radar geometry for one evaluation; angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadarGeometry {
    pub frequency_ghz: f64,
    pub incidence_angle_deg: f64,
    pub scattering_angle_deg: f64,
    /// Azimuth of the scattered direction relative to the incident plane
    pub relative_azimuth_deg: f64,
}

impl RadarGeometry {
    /// Monostatic geometry: scattering angle equals incidence, azimuth 180°
    pub fn monostatic(frequency_ghz: f64, incidence_angle_deg: f64) -> Self {
        Self {
            frequency_ghz,
            incidence_angle_deg,
            scattering_angle_deg: incidence_angle_deg,
            relative_azimuth_deg: 180.0,
        }
    }

    pub fn bistatic(
        frequency_ghz: f64,
        incidence_angle_deg: f64,
        scattering_angle_deg: f64,
        relative_azimuth_deg: f64,
    ) -> Self {
        Self {
            frequency_ghz,
            incidence_angle_deg,
            scattering_angle_deg,
            relative_azimuth_deg,
        }
    }

    /// Free-space wavenumber in rad/m
    pub fn wavenumber(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.frequency_ghz / SPEED_OF_LIGHT_M_PER_NS
    }

    pub fn is_backscatter(&self) -> bool {
        self.incidence_angle_deg == self.scattering_angle_deg
            && (self.relative_azimuth_deg - 180.0).abs() < 1e-12
    }

    pub fn validate(&self) -> I2emResult<()> {
        if !(self.frequency_ghz.is_finite() && self.frequency_ghz > 0.0) {
            return Err(I2emError::Domain(format!(
                "frequency must be positive, got {} GHz",
                self.frequency_ghz
            )));
        }
        check_angle("incidence", self.incidence_angle_deg)?;
        check_angle("scattering", self.scattering_angle_deg)?;
        if !self.relative_azimuth_deg.is_finite() {
            return Err(I2emError::Domain(
                "relative azimuth must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Speed of light used for the free-space wavenumber (m/ns)
pub const SPEED_OF_LIGHT_M_PER_NS: f64 = 0.3;

fn check_angle(name: &str, angle_deg: f64) -> I2emResult<()> {
    if !(angle_deg.is_finite() && (0.0..90.0).contains(&angle_deg)) {
        return Err(I2emError::Domain(format!(
            "{} angle must lie in [0, 90) degrees, got {}",
            name, angle_deg
        )));
    }
    Ok(())
}

/// Reject non-physical permittivity: real part must be positive, loss non-negative
pub fn validate_permittivity(er: Permittivity) -> I2emResult<()> {
    if !(er.re.is_finite() && er.im.is_finite()) {
        return Err(I2emError::Domain(format!(
            "permittivity must be finite, got {}",
            er
        )));
    }
    if er.re <= 0.0 || er.im < 0.0 {
        return Err(I2emError::Domain(format!(
            "non-physical permittivity {} (real part must be > 0, imaginary part >= 0)",
            er
        )));
    }
    Ok(())
}

/// Non-fatal conditions raised during one evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A non-finite or out-of-range intermediate value was clamped
    NumericInstability { quantity: String, value: f64 },
    /// Adaptive cubature hit its evaluation budget before the tolerance
    IntegrationIncomplete {
        evaluations: usize,
        estimate: f64,
        error: f64,
    },
    /// A spectral series stopped at the term cap before reaching the tolerance
    SeriesTruncated { series: String, terms: usize },
}

/// Co-polarized scattering coefficients of one geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoPolResult {
    pub sigma0_vv_db: f64,
    pub sigma0_hh_db: f64,
    pub sigma0_vv: f64,
    pub sigma0_hh: f64,
    /// Number of spectral series terms summed
    pub terms: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of one adaptive cubature run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationReport {
    pub value: f64,
    pub error: f64,
    pub evaluations: usize,
    pub converged: bool,
}

/// Cross-polarized backscatter of one geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossPolResult {
    pub sigma0_vh_db: f64,
    /// Linear VH power after the configured power scale
    pub sigma0_vh: f64,
    pub terms: usize,
    pub integration: IntegrationReport,
    pub diagnostics: Vec<Diagnostic>,
}

/// Surface emissivity per polarization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissivityResult {
    pub emissivity_v: f64,
    pub emissivity_h: f64,
    /// Coherent (specular) reflectivity
    pub coherent_reflectivity: (f64, f64),
    /// Hemispherically integrated bistatic scattering
    pub incoherent_reflectivity: (f64, f64),
    pub diagnostics: Vec<Diagnostic>,
}

/// Error types for scattering-model evaluation
#[derive(Debug, thiserror::Error)]
pub enum I2emError {
    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for scattering-model operations
pub type I2emResult<T> = Result<T, I2emError>;

/// Convert linear power to dB, clamping to [`LINEAR_FLOOR`]
///
/// A non-finite or negative input is reported through `diagnostics`; an exact
/// zero is a legitimate null return and is clamped silently.
pub fn to_db(linear: f64, quantity: &str, diagnostics: &mut Vec<Diagnostic>) -> f64 {
    if !linear.is_finite() || linear < 0.0 {
        log::warn!("Clamping non-physical {} = {} to the dB floor", quantity, linear);
        diagnostics.push(Diagnostic::NumericInstability {
            quantity: quantity.to_string(),
            value: linear,
        });
        return FLOOR_DB;
    }
    10.0 * linear.max(LINEAR_FLOOR).log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_codes() {
        for code in 1..=4 {
            assert_eq!(CorrelationType::from_code(code).unwrap().code(), code);
        }
        assert!(matches!(
            CorrelationType::from_code(0),
            Err(I2emError::Domain(_))
        ));
        assert!(CorrelationType::from_code(5).is_err());
    }

    #[test]
    fn test_surface_validation() {
        let ok = SurfaceParameters::new(0.01, 0.1, CorrelationType::Gaussian, 0.0);
        assert!(ok.validate().is_ok());

        let flat = SurfaceParameters::new(0.0, 0.1, CorrelationType::Gaussian, 1.0);
        assert!(matches!(flat.validate(), Err(I2emError::Domain(_))));

        let power = SurfaceParameters::new(0.01, 0.1, CorrelationType::PowerLaw, 0.0);
        assert!(power.validate().is_err());
    }

    #[test]
    fn test_geometry_validation() {
        assert!(RadarGeometry::monostatic(5.3, 0.0).validate().is_ok());
        assert!(RadarGeometry::monostatic(5.3, 90.0).validate().is_err());
        assert!(RadarGeometry::monostatic(0.0, 30.0).validate().is_err());
        assert!(RadarGeometry::monostatic(5.3, 30.0).is_backscatter());
    }

    #[test]
    fn test_permittivity_validation() {
        assert!(validate_permittivity(Permittivity::new(11.3, 1.5)).is_ok());
        assert!(validate_permittivity(Permittivity::new(3.0, 0.0)).is_ok());
        assert!(validate_permittivity(Permittivity::new(-1.0, 1.0)).is_err());
        assert!(validate_permittivity(Permittivity::new(5.0, -0.1)).is_err());
    }

    #[test]
    fn test_x_exponential_shape_range() {
        let surface = |x| SurfaceParameters::new(0.01, 0.1, CorrelationType::XExponential, x);
        assert!(surface(0.3).validate().is_ok());
        assert!(surface(2.0).validate().is_ok());
        assert!(matches!(surface(2.5).validate(), Err(I2emError::Domain(_))));
        assert!(matches!(surface(0.0).validate(), Err(I2emError::Domain(_))));

        // Power-law has no upper bound
        let power = SurfaceParameters::new(0.01, 0.1, CorrelationType::PowerLaw, 3.0);
        assert!(power.validate().is_ok());
        // Closed-form families ignore the exponent
        assert!(CorrelationType::Gaussian.check_shape_exponent(-1.0).is_ok());
    }

    #[test]
    fn test_db_conversion() {
        let mut diagnostics = Vec::new();
        assert!((to_db(100.0, "test", &mut diagnostics) - 20.0).abs() < 1e-12);
        assert_eq!(to_db(0.0, "test", &mut diagnostics), FLOOR_DB);
        assert!(diagnostics.is_empty());

        assert_eq!(to_db(f64::NAN, "test", &mut diagnostics), FLOOR_DB);
        assert_eq!(diagnostics.len(), 1);
    }
}
