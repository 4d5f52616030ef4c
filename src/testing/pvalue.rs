//! Two-sided p-values for moderated t-statistics

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Two-sided tail probability of `stat` under Student's t with `df` degrees of
/// freedom. An infinite `df` (an infinitely informative variance prior) uses
/// the standard normal. Non-finite statistics and non-positive df give NaN.
pub fn two_sided_pvalue(stat: f64, df: f64) -> f64 {
    if !stat.is_finite() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }

    let lower_tail = if df.is_infinite() {
        Normal::new(0.0, 1.0).ok().map(|d| d.cdf(-stat.abs()))
    } else {
        StudentsT::new(0.0, 1.0, df).ok().map(|d| d.cdf(-stat.abs()))
    };

    lower_tail.map_or(f64::NAN, |p| (2.0 * p).min(1.0))
}
