use std::sync::OnceLock;

/// Gauss-Legendre rule on [-1, 1]
#[derive(Debug, Clone)]
pub struct GaussLegendre {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussLegendre {
    /// Build an `order`-point rule by Newton iteration on the Legendre polynomial roots
    pub fn new(order: usize) -> Self {
        let order = order.max(1);
        let mut nodes = Vec::with_capacity(order);
        let mut weights = Vec::with_capacity(order);
        let n = order as f64;

        for i in 1..=order {
            // Tricomi initial guess
            let mut x = (std::f64::consts::PI * (i as f64 - 0.25) / (n + 0.5)).cos();
            let mut derivative = 1.0;
            for _ in 0..100 {
                let (p, dp) = legendre_with_derivative(order, x);
                derivative = dp;
                let dx = p / dp;
                x -= dx;
                if dx.abs() < 1e-15 {
                    break;
                }
            }
            let (_, dp) = legendre_with_derivative(order, x);
            if dp.is_finite() && dp != 0.0 {
                derivative = dp;
            }
            nodes.push(x);
            weights.push(2.0 / ((1.0 - x * x) * derivative * derivative));
        }

        Self { nodes, weights }
    }

    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes and weights mapped onto [a, b]
    pub fn mapped(&self, a: f64, b: f64) -> impl Iterator<Item = (f64, f64)> + '_ {
        let half = 0.5 * (b - a);
        let mid = 0.5 * (b + a);
        self.nodes
            .iter()
            .zip(self.weights.iter())
            .map(move |(&x, &w)| (mid + half * x, half * w))
    }

    pub fn integrate<F>(&self, a: f64, b: f64, mut f: F) -> f64
    where
        F: FnMut(f64) -> f64,
    {
        self.mapped(a, b).map(|(x, w)| w * f(x)).sum()
    }

    /// Composite rule over `panels` equal sub-intervals of [a, b]
    pub fn integrate_composite<F>(&self, a: f64, b: f64, panels: usize, mut f: F) -> f64
    where
        F: FnMut(f64) -> f64,
    {
        let panels = panels.max(1);
        let width = (b - a) / panels as f64;
        (0..panels)
            .map(|p| {
                let lo = a + width * p as f64;
                self.integrate(lo, lo + width, &mut f)
            })
            .sum()
    }
}

fn legendre_with_derivative(order: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    for j in 2..=order {
        let jf = j as f64;
        let p2 = ((2.0 * jf - 1.0) * x * p1 - (jf - 1.0) * p0) / jf;
        p0 = p1;
        p1 = p2;
    }
    if order == 1 {
        return (x, 1.0);
    }
    let dp = order as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}

/// Shared 8-point rule used for panel integration
pub fn panel_rule() -> &'static GaussLegendre {
    static RULE: OnceLock<GaussLegendre> = OnceLock::new();
    RULE.get_or_init(|| GaussLegendre::new(8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weights_sum_to_interval_length() {
        for order in [1, 2, 5, 8, 32, 64] {
            let rule = GaussLegendre::new(order);
            assert_eq!(rule.order(), order);
            assert_relative_eq!(rule.integrate(0.0, 3.0, |_| 1.0), 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_polynomial_exactness() {
        // 5-point rule integrates degree 9 exactly
        let rule = GaussLegendre::new(5);
        let value = rule.integrate(-1.0, 2.0, |x| x.powi(9) - 2.0 * x.powi(4));
        let exact = (2f64.powi(10) - 1.0) / 10.0 - 2.0 * (2f64.powi(5) + 1.0) / 5.0;
        assert_relative_eq!(value, exact, epsilon = 1e-10);
    }

    #[test]
    fn test_composite_oscillatory() {
        let value = panel_rule().integrate_composite(0.0, 10.0 * std::f64::consts::PI, 40, |x| {
            x.sin().powi(2)
        });
        assert_relative_eq!(value, 5.0 * std::f64::consts::PI, epsilon = 1e-9);
    }
}
