//! Numeric control parameters of the solvers
//!
//! A [`SolverConfig`] is an immutable value handed to each detailed solver call.
//! The flat entry points in the crate root read a process-wide default instead;
//! that default is swapped atomically as a whole (`RwLock<Arc<_>>`), so a
//! running cross-pol evaluation always sees one consistent snapshot.

use crate::types::{I2emError, I2emResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock, RwLock};

/// Default auto-selection threshold for spectral series truncation
pub const DEFAULT_AUTO_SELECT_EPSILON: f64 = 1.0e-8;

/// Upper bound on cubature evaluations when the caller sets no cap
pub const CUBATURE_EVALUATION_CEILING: usize = 2_000_000;

/// Adaptive cubature controls for the cross-pol integral
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratorSettings {
    /// Evaluation budget; 0 means no caller cap (internal ceiling still applies)
    ///
    /// The first region is always evaluated in full, so a budget below one
    /// region's rule (17 points in two dimensions) spends 17 evaluations.
    pub max_evaluations: usize,
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            max_evaluations: 20_000,
            relative_tolerance: 1.0e-4,
            absolute_tolerance: 0.0,
        }
    }
}

impl IntegratorSettings {
    /// Effective evaluation budget
    pub fn evaluation_budget(&self) -> usize {
        if self.max_evaluations == 0 {
            CUBATURE_EVALUATION_CEILING
        } else {
            self.max_evaluations.min(CUBATURE_EVALUATION_CEILING)
        }
    }

    /// Apply caller values, keeping the current field wherever the sentinel is given
    ///
    /// Sentinels: `max_evaluations < 0`, `relative_tolerance <= 0`,
    /// `absolute_tolerance < 0`.
    pub fn with_overrides(
        &self,
        max_evaluations: i64,
        relative_tolerance: f64,
        absolute_tolerance: f64,
    ) -> Self {
        let mut updated = *self;
        if max_evaluations >= 0 {
            updated.max_evaluations = max_evaluations as usize;
        }
        if relative_tolerance > 0.0 {
            updated.relative_tolerance = relative_tolerance;
        }
        if absolute_tolerance >= 0.0 {
            updated.absolute_tolerance = absolute_tolerance;
        }
        updated
    }
}

/// Immutable per-call solver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    pub integrator: IntegratorSettings,
    /// Series truncation threshold shared by the co-pol and cross-pol solvers
    pub auto_select_epsilon: f64,
    /// Empirical power-domain factor applied to the linear VH result
    pub vh_power_scale: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            integrator: IntegratorSettings::default(),
            auto_select_epsilon: DEFAULT_AUTO_SELECT_EPSILON,
            vh_power_scale: 1.0,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> I2emResult<()> {
        if !(self.auto_select_epsilon.is_finite() && self.auto_select_epsilon > 0.0) {
            return Err(I2emError::InvalidConfiguration(format!(
                "auto-select epsilon must be positive, got {}",
                self.auto_select_epsilon
            )));
        }
        if !(self.vh_power_scale.is_finite() && self.vh_power_scale > 0.0) {
            return Err(I2emError::InvalidConfiguration(format!(
                "VH power scale must be positive, got {}",
                self.vh_power_scale
            )));
        }
        let tol = &self.integrator;
        if !(tol.relative_tolerance.is_finite() && tol.relative_tolerance > 0.0) {
            return Err(I2emError::InvalidConfiguration(format!(
                "relative tolerance must be positive, got {}",
                tol.relative_tolerance
            )));
        }
        if !(tol.absolute_tolerance.is_finite() && tol.absolute_tolerance >= 0.0) {
            return Err(I2emError::InvalidConfiguration(format!(
                "absolute tolerance must be non-negative, got {}",
                tol.absolute_tolerance
            )));
        }
        Ok(())
    }

    pub fn with_auto_select_epsilon(mut self, epsilon: f64) -> Self {
        self.auto_select_epsilon = epsilon;
        self
    }

    pub fn with_vh_power_scale(mut self, scale: f64) -> Self {
        self.vh_power_scale = scale;
        self
    }

    pub fn with_integrator(mut self, integrator: IntegratorSettings) -> Self {
        self.integrator = integrator;
        self
    }
}

fn global_slot() -> &'static RwLock<Arc<SolverConfig>> {
    static GLOBAL_CONFIG: OnceLock<RwLock<Arc<SolverConfig>>> = OnceLock::new();
    GLOBAL_CONFIG.get_or_init(|| RwLock::new(Arc::new(SolverConfig::default())))
}

/// Snapshot of the process-wide configuration
pub fn global_config() -> Arc<SolverConfig> {
    let guard = global_slot()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(&guard)
}

/// Replace the process-wide configuration after validating it
pub fn replace_global_config(config: SolverConfig) -> I2emResult<()> {
    config.validate()?;
    update_global(|_| Ok(config))
}

fn update_global<F>(update: F) -> I2emResult<()>
where
    F: FnOnce(&SolverConfig) -> I2emResult<SolverConfig>,
{
    let mut guard = global_slot()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let next = update(&guard)?;
    log::debug!("Solver configuration updated: {:?}", next);
    *guard = Arc::new(next);
    Ok(())
}

/// Update the integrator settings, honoring the keep-current sentinels
pub fn set_integrator_settings(
    max_evaluations: i64,
    relative_tolerance: f64,
    absolute_tolerance: f64,
) -> I2emResult<()> {
    if relative_tolerance.is_nan() || absolute_tolerance.is_nan() {
        return Err(I2emError::InvalidConfiguration(
            "integrator tolerances must not be NaN".to_string(),
        ));
    }
    update_global(|current| {
        let integrator =
            current
                .integrator
                .with_overrides(max_evaluations, relative_tolerance, absolute_tolerance);
        let next = current.with_integrator(integrator);
        next.validate()?;
        Ok(next)
    })
}

/// Set the series auto-selection threshold (must be positive)
pub fn set_auto_select_epsilon(epsilon: f64) -> I2emResult<()> {
    update_global(|current| {
        let next = current.with_auto_select_epsilon(epsilon);
        next.validate()?;
        Ok(next)
    })
}

/// Set the linear-domain VH scale factor (must be positive)
pub fn set_vh_power_scale(scale: f64) -> I2emResult<()> {
    update_global(|current| {
        let next = current.with_vh_power_scale(scale);
        next.validate()?;
        Ok(next)
    })
}
