//! Statistical utility functions shared across modules
//!
//! Polygamma functions used by the empirical Bayes variance prior, and the
//! order statistics used for summaries and box plots.

pub use statrs::function::gamma::digamma;

/// Below this argument the polygamma functions recurse upward before
/// applying the asymptotic series
const ASYMPTOTIC_START: f64 = 8.0;

/// Trigamma function (derivative of digamma)
pub fn trigamma(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).powi(2) - trigamma(1.0 - x);
    }

    let mut result = 0.0;
    let mut z = x;
    while z < ASYMPTOTIC_START {
        result += 1.0 / (z * z);
        z += 1.0;
    }

    let z2 = z * z;
    let z3 = z2 * z;
    result + 1.0 / z + 0.5 / z2 + 1.0 / (6.0 * z3) - 1.0 / (30.0 * z3 * z2)
        + 1.0 / (42.0 * z3 * z2 * z2)
        - 1.0 / (30.0 * z3 * z3 * z3)
}

/// Tetragamma function (second derivative of digamma), for x > 0
pub fn tetragamma(x: f64) -> f64 {
    if x.is_nan() || x <= 0.0 {
        return f64::NAN;
    }

    let mut result = 0.0;
    let mut z = x;
    while z < ASYMPTOTIC_START {
        result -= 2.0 / (z * z * z);
        z += 1.0;
    }

    let z2 = z * z;
    let z4 = z2 * z2;
    result - 1.0 / z2 - 1.0 / (z2 * z) - 0.5 / z4 + 1.0 / (6.0 * z4 * z2) - 1.0 / (6.0 * z4 * z4)
        + 3.0 / (10.0 * z4 * z4 * z2)
}

/// Inverse of the trigamma function, by Newton iteration on 1/trigamma.
///
/// Solves `trigamma(y) = x` for `x > 0`. `1/trigamma` is convex, so starting
/// from `0.5 + 1/x` (just above the root) the iterates decrease monotonically.
pub fn trigamma_inverse(x: f64) -> f64 {
    if x.is_nan() || x <= 0.0 {
        return f64::NAN;
    }
    if x > 1e7 {
        return 1.0 / x.sqrt();
    }
    if x < 1e-6 {
        return 1.0 / x;
    }

    let mut y = 0.5 + 1.0 / x;
    for _ in 0..50 {
        let tri = trigamma(y);
        let dif = tri * (1.0 - tri / x) / tetragamma(y);
        y += dif;
        if -dif / y < 1e-8 {
            return y;
        }
    }
    log::warn!("Inverse trigamma iteration did not converge for x = {}", x);
    y
}

/// Median of the finite values; NaN when there are none
pub fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, 0.5)
}

/// Quantile of sorted data with linear interpolation between order
/// statistics (R's default type 7)
pub fn quantile_sorted(sorted: &[f64], prob: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * prob.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

/// Five-number summary (min, lower quartile, median, upper quartile, max)
pub fn five_number_summary(values: &[f64]) -> Option<[f64; 5]> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some([
        sorted[0],
        quantile_sorted(&sorted, 0.25),
        quantile_sorted(&sorted, 0.5),
        quantile_sorted(&sorted, 0.75),
        sorted[sorted.len() - 1],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigamma() {
        // trigamma(1) = pi^2/6
        let expected = std::f64::consts::PI.powi(2) / 6.0;
        assert!((trigamma(1.0) - expected).abs() < 1e-10);
        // trigamma(0.5) = pi^2/2
        let expected_half = std::f64::consts::PI.powi(2) / 2.0;
        assert!((trigamma(0.5) - expected_half).abs() < 1e-10);
    }

    #[test]
    fn test_tetragamma() {
        // tetragamma(1) = -2 * zeta(3)
        assert!((tetragamma(1.0) + 2.404_113_806_319_188_5).abs() < 1e-9);
        // recurrence: psi''(x + 1) = psi''(x) + 2 / x^3
        let x = 2.5;
        assert!((tetragamma(x + 1.0) - tetragamma(x) - 2.0 / x.powi(3)).abs() < 1e-10);
    }

    #[test]
    fn test_trigamma_inverse() {
        for x in [1e-3, 0.05, 0.5, 1.0, 3.0, 50.0, 1e4] {
            let y = trigamma_inverse(x);
            assert!(
                ((trigamma(y) - x) / x).abs() < 1e-6,
                "trigamma(trigamma_inverse({})) = {}",
                x,
                trigamma(y)
            );
        }
    }

    #[test]
    fn test_digamma_reexport() {
        // digamma(1) = -Euler-Mascheroni
        assert!((digamma(1.0) + 0.577_215_664_901_532_9).abs() < 1e-10);
    }

    #[test]
    fn test_median_and_quantiles() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert!(median(&[]).is_nan());
        let summary = five_number_summary(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(summary, [1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
