//! Auto-selected truncation of the spectral series
//!
//! Term `n` of every I2EM series carries the factor `xⁿ/n!` with
//! `x = ks²(cosθᵢ + cosθₛ)²`, which bounds its marginal contribution. The
//! series stops at the first `n ≥ 2` whose factor drops below the threshold.

use crate::core::special::ln_factorial;

/// Hard cap on the number of series terms
pub const MAX_SERIES_TERMS: usize = 256;

/// Term count used by the cross-pol solver when auto-selection is off
pub const FIXED_CROSSPOL_TERMS: usize = 15;

/// Outcome of the term-count selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSelection {
    pub terms: usize,
    /// The cap was reached before the threshold
    pub capped: bool,
}

/// Select the number of terms for the series with growth factor `x`
///
/// The caller decides how to report a capped selection.
pub fn auto_term_count(x: f64, epsilon: f64) -> TermSelection {
    let threshold = epsilon.ln();
    for n in 2..=MAX_SERIES_TERMS {
        if x <= 0.0 || n as f64 * x.ln() - ln_factorial(n) <= threshold {
            return TermSelection {
                terms: n,
                capped: false,
            };
        }
    }
    TermSelection {
        terms: MAX_SERIES_TERMS,
        capped: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_surface_uses_minimum_terms() {
        let selection = auto_term_count(1e-6, 1e-8);
        assert_eq!(selection.terms, 2);
        assert!(!selection.capped);
        assert_eq!(auto_term_count(0.0, 1e-8).terms, 2);
    }

    #[test]
    fn test_smaller_epsilon_never_reduces_terms() {
        for x in [0.01, 0.3, 1.0, 4.0, 25.0] {
            let mut previous = 0;
            for eps in [1e-2, 1e-4, 1e-6, 1e-8, 1e-10, 1e-12] {
                let terms = auto_term_count(x, eps).terms;
                assert!(terms >= previous, "x={} eps={} gave {} < {}", x, eps, terms, previous);
                previous = terms;
            }
        }
    }

    #[test]
    fn test_selected_term_is_below_threshold() {
        let x: f64 = 3.0;
        let selection = auto_term_count(x, 1e-8);
        let n = selection.terms;
        let factor = (n as f64 * x.ln() - ln_factorial(n)).exp();
        assert!(factor <= 1e-8);
        let previous = ((n - 1) as f64 * x.ln() - ln_factorial(n - 1)).exp();
        assert!(n == 2 || previous > 1e-8);
    }

    #[test]
    fn test_cap_is_enforced() {
        let selection = auto_term_count(500.0, 1e-12);
        assert_eq!(selection.terms, MAX_SERIES_TERMS);
        assert!(selection.capped);
    }

    #[test]
    fn test_convergence_at_the_last_allowed_term_is_not_capped() {
        let x: f64 = 50.0;
        let ln_term = |n: usize| n as f64 * x.ln() - ln_factorial(n);
        let last = MAX_SERIES_TERMS;
        let epsilon = (0.5 * (ln_term(last - 1) + ln_term(last))).exp();
        let selection = auto_term_count(x, epsilon);
        assert_eq!(selection.terms, last);
        assert!(!selection.capped);
    }
}
