//! h-adaptive cubature over hyper-rectangles
//!
//! Each region is integrated with the degree-7 Genz–Malik rule; the embedded
//! degree-5 rule provides the error estimate. The region with the largest
//! error is bisected along the axis with the largest fourth difference until
//! the global error meets `max(abs_tol, rel_tol·|I|)` or the evaluation budget
//! is spent.

use crate::config::IntegratorSettings;
use crate::types::IntegrationReport;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const LAMBDA2: f64 = 0.358_568_582_800_318_1; // sqrt(9/70)
const LAMBDA4: f64 = 0.948_683_298_050_513_8; // sqrt(9/10)
const LAMBDA5: f64 = 0.688_247_201_611_685_3; // sqrt(9/19)

/// A sub-region with its rule estimates
#[derive(Debug, Clone)]
struct Region {
    center: Vec<f64>,
    half_width: Vec<f64>,
    value: f64,
    error: f64,
    split_axis: usize,
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.error == other.error
    }
}

impl Eq for Region {}

impl PartialOrd for Region {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Region {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error
            .partial_cmp(&other.error)
            .unwrap_or(Ordering::Equal)
    }
}

/// Genz–Malik rule for a fixed dimension
struct GenzMalik {
    dim: usize,
    weights7: [f64; 5],
    weights5: [f64; 4],
}

impl GenzMalik {
    fn new(dim: usize) -> Self {
        let n = dim as f64;
        let weights7 = [
            (12824.0 - 9120.0 * n + 400.0 * n * n) / 19683.0,
            980.0 / 6561.0,
            (1820.0 - 400.0 * n) / 19683.0,
            200.0 / 19683.0,
            6859.0 / 19683.0 / 2f64.powi(dim as i32),
        ];
        let weights5 = [
            (729.0 - 950.0 * n + 50.0 * n * n) / 729.0,
            245.0 / 486.0,
            (265.0 - 100.0 * n) / 1458.0,
            25.0 / 729.0,
        ];
        Self {
            dim,
            weights7,
            weights5,
        }
    }

    fn points_per_region(&self) -> usize {
        let d = self.dim;
        1 + 4 * d + 2 * d * (d - 1) + (1 << d)
    }

    fn evaluate<F>(&self, f: &mut F, center: Vec<f64>, half_width: Vec<f64>) -> Region
    where
        F: FnMut(&[f64]) -> f64,
    {
        let d = self.dim;
        let mut point = center.clone();

        let f0 = f(&point);
        let mut sum2 = 0.0;
        let mut sum3 = 0.0;
        let mut best_axis = 0;
        let mut best_difference = -1.0;
        let ratio = (LAMBDA2 / LAMBDA4).powi(2);

        for i in 0..d {
            point[i] = center[i] - LAMBDA2 * half_width[i];
            let f2m = f(&point);
            point[i] = center[i] + LAMBDA2 * half_width[i];
            let f2p = f(&point);
            point[i] = center[i] - LAMBDA4 * half_width[i];
            let f3m = f(&point);
            point[i] = center[i] + LAMBDA4 * half_width[i];
            let f3p = f(&point);
            point[i] = center[i];

            sum2 += f2m + f2p;
            sum3 += f3m + f3p;

            let difference = ((f2m + f2p - 2.0 * f0) - ratio * (f3m + f3p - 2.0 * f0)).abs();
            if difference > best_difference {
                best_difference = difference;
                best_axis = i;
            }
        }

        let mut sum4 = 0.0;
        for i in 0..d {
            for j in (i + 1)..d {
                for (si, sj) in [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)] {
                    point[i] = center[i] + si * LAMBDA4 * half_width[i];
                    point[j] = center[j] + sj * LAMBDA4 * half_width[j];
                    sum4 += f(&point);
                }
                point[i] = center[i];
                point[j] = center[j];
            }
        }

        let mut sum5 = 0.0;
        for corner in 0..(1usize << d) {
            for i in 0..d {
                let sign = if corner & (1 << i) == 0 { -1.0 } else { 1.0 };
                point[i] = center[i] + sign * LAMBDA5 * half_width[i];
            }
            sum5 += f(&point);
        }

        let volume: f64 = half_width.iter().map(|h| 2.0 * h).product();
        let w7 = &self.weights7;
        let w5 = &self.weights5;
        let value = volume * (w7[0] * f0 + w7[1] * sum2 + w7[2] * sum3 + w7[3] * sum4 + w7[4] * sum5);
        let lower = volume * (w5[0] * f0 + w5[1] * sum2 + w5[2] * sum3 + w5[3] * sum4);
        let error = (value - lower).abs();

        Region {
            center,
            half_width,
            value,
            error: if error.is_finite() { error } else { f64::INFINITY },
            split_axis: best_axis,
        }
    }
}

/// Integrate `f` over the box `[lower_i, upper_i]`
///
/// Never fails: on budget exhaustion the best estimate is returned with
/// `converged = false`.
pub fn integrate<F>(
    mut f: F,
    lower: &[f64],
    upper: &[f64],
    settings: &IntegratorSettings,
) -> IntegrationReport
where
    F: FnMut(&[f64]) -> f64,
{
    debug_assert_eq!(lower.len(), upper.len(), "bounds must share a dimension");
    let dim = lower.len();
    let rule = GenzMalik::new(dim.max(1));
    let per_region = rule.points_per_region();
    let budget = settings.evaluation_budget().max(per_region);

    let center: Vec<f64> = lower.iter().zip(upper).map(|(a, b)| 0.5 * (a + b)).collect();
    let half_width: Vec<f64> = lower.iter().zip(upper).map(|(a, b)| 0.5 * (b - a)).collect();

    let first = rule.evaluate(&mut f, center, half_width);
    let mut evaluations = per_region;
    let mut value = first.value;
    let mut error = first.error;
    let mut heap = BinaryHeap::new();
    heap.push(first);

    let tolerance = |value: f64| {
        settings
            .absolute_tolerance
            .max(settings.relative_tolerance * value.abs())
    };

    let mut converged = error <= tolerance(value);
    while !converged && evaluations + 2 * per_region <= budget {
        let Some(worst) = heap.pop() else { break };
        let axis = worst.split_axis;

        let mut half_width = worst.half_width.clone();
        half_width[axis] *= 0.5;
        let mut left_center = worst.center.clone();
        left_center[axis] -= half_width[axis];
        let mut right_center = worst.center;
        right_center[axis] += half_width[axis];

        let left = rule.evaluate(&mut f, left_center, half_width.clone());
        let right = rule.evaluate(&mut f, right_center, half_width);
        evaluations += 2 * per_region;

        value += left.value + right.value - worst.value;
        error += left.error + right.error - worst.error;
        heap.push(left);
        heap.push(right);

        converged = error <= tolerance(value);
        if converged || !error.is_finite() {
            // Re-sum to rule out drift from repeated subtraction
            value = heap.iter().map(|r| r.value).sum();
            error = heap.iter().map(|r| r.error).sum();
            converged = error <= tolerance(value);
        }
    }

    // Fresh sum of the region values for the final estimate
    let value: f64 = heap.iter().map(|r| r.value).sum();

    if !converged {
        log::warn!(
            "Cubature stopped after {} evaluations without reaching tolerance (estimate {:.3e}, error {:.3e})",
            evaluations,
            value,
            error
        );
    }

    IntegrationReport {
        value,
        error,
        evaluations,
        converged,
    }
}
