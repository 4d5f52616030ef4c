//! Empirical Bayes moderation of per-row residual variances
//!
//! Residual variances s² of all rows are modelled as scaled F draws around a
//! common prior s0² with d0 prior degrees of freedom. The hyperparameters are
//! estimated by matching the first two moments of log(s²), then every row's
//! variance is replaced by the posterior
//!
//!   s²_post = (d · s² + d0 · s0²) / (d + d0)
//!
//! and moderated t-statistics are computed with d + d0 degrees of freedom.
//! Borrowing strength across rows matters most with few samples per row, and a
//! row whose own variance is zero is pulled up to a usable posterior instead of
//! being excluded.

use log::{debug, info, warn};
use ndarray::{Array1, Array2};

use crate::error::{LimmaError, Result};
use crate::lm::LinearFit;
use crate::stats::{digamma, median, trigamma, trigamma_inverse};
use crate::testing::two_sided_pvalue;

/// Scaled-F prior on the residual variances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariancePrior {
    /// Prior degrees of freedom d0 (may be infinite)
    pub df_prior: f64,
    /// Prior variance s0²
    pub s2_prior: f64,
}

/// Estimate the scaled-F prior from sample variances and their degrees of freedom.
///
/// Non-finite variances and rows without residual df are ignored. With no
/// usable rows the prior is undefined (NaN); with one row, d0 = 0.
pub fn fit_f_dist(var: &[f64], df1: &[f64]) -> VariancePrior {
    let (x, d): (Vec<f64>, Vec<f64>) = var
        .iter()
        .zip(df1.iter())
        .filter(|(&v, &d)| v.is_finite() && d.is_finite() && v > -1e-15 && d > 1e-15)
        .map(|(&v, &d)| (v, d))
        .unzip();

    let n = x.len();
    if n == 0 {
        return VariancePrior {
            df_prior: f64::NAN,
            s2_prior: f64::NAN,
        };
    }
    if n == 1 {
        return VariancePrior {
            df_prior: 0.0,
            s2_prior: x[0],
        };
    }

    // Zero variances would give log(0); floor them relative to the median
    let x: Vec<f64> = x.iter().map(|v| v.max(0.0)).collect();
    let mut m = median(&x);
    if m == 0.0 {
        warn!("More than half of residual variances are exactly zero: eBayes unreliable");
        m = 1.0;
    }
    let floor = 1e-5 * m;

    let e: Vec<f64> = x
        .iter()
        .zip(d.iter())
        .map(|(&v, &di)| v.max(floor).ln() - digamma(di / 2.0) + (di / 2.0).ln())
        .collect();

    let n_f = n as f64;
    let emean = e.iter().sum::<f64>() / n_f;
    let evar_total = e.iter().map(|ei| (ei - emean).powi(2)).sum::<f64>() / (n_f - 1.0);
    let evar = evar_total - d.iter().map(|&di| trigamma(di / 2.0)).sum::<f64>() / n_f;

    if evar > 0.0 {
        let df_prior = 2.0 * trigamma_inverse(evar);
        let s2_prior = (emean + digamma(df_prior / 2.0) - (df_prior / 2.0).ln()).exp();
        VariancePrior { df_prior, s2_prior }
    } else {
        VariancePrior {
            df_prior: f64::INFINITY,
            s2_prior: emean.exp(),
        }
    }
}

/// Prior plus posterior variances of every row
#[derive(Debug, Clone)]
pub struct SqueezedVar {
    pub prior: VariancePrior,
    pub var_post: Vec<f64>,
}

/// Shrink sample variances towards the fitted prior
pub fn squeeze_var(var: &[f64], df: &[f64]) -> SqueezedVar {
    if var.len() <= 1 {
        return SqueezedVar {
            prior: VariancePrior {
                df_prior: 0.0,
                s2_prior: var.first().copied().unwrap_or(f64::NAN),
            },
            var_post: var.to_vec(),
        };
    }

    let mut prior = fit_f_dist(var, df);
    if prior.df_prior.is_nan() {
        prior.df_prior = 0.0;
    }

    let var_post = if prior.df_prior.is_infinite() {
        vec![prior.s2_prior; var.len()]
    } else {
        var.iter()
            .zip(df.iter())
            .map(|(&v, &d)| {
                if prior.df_prior == 0.0 {
                    v
                } else {
                    (d * v + prior.df_prior * prior.s2_prior) / (d + prior.df_prior)
                }
            })
            .collect()
    };

    SqueezedVar { prior, var_post }
}

/// Linear fit with empirical Bayes moderated statistics for every coefficient
#[derive(Debug, Clone)]
pub struct ModeratedFit {
    /// The ordinary least squares fit being moderated
    pub linear: LinearFit,
    /// Prior degrees of freedom d0
    pub df_prior: f64,
    /// Prior variance s0²
    pub s2_prior: f64,
    /// Posterior residual variance per row
    pub s2_post: Array1<f64>,
    /// Moderated standard errors (rows x coefficients)
    pub std_error: Array2<f64>,
    /// Moderated t-statistics (rows x coefficients)
    pub t: Array2<f64>,
    /// Degrees of freedom of the moderated t per row
    pub df_total: Array1<f64>,
    /// Two-sided p-values (rows x coefficients)
    pub p_value: Array2<f64>,
}

impl ModeratedFit {
    pub fn n_rows(&self) -> usize {
        self.linear.n_rows()
    }

    pub fn row_keys(&self) -> &[String] {
        &self.linear.row_keys
    }

    pub fn coef_names(&self) -> &[String] {
        &self.linear.coef_names
    }

    pub fn coefficients(&self) -> &Array2<f64> {
        &self.linear.coefficients
    }
}

/// Moderate a linear fit with empirical Bayes variance shrinkage
pub fn ebayes(fit: &LinearFit) -> Result<ModeratedFit> {
    let n_rows = fit.n_rows();
    let n_coefs = fit.n_coefs();

    if n_rows > 0 && fit.df_residual.iter().all(|&d| d == 0.0) {
        return Err(LimmaError::NoResidualDf);
    }

    let var: Vec<f64> = fit.sigma.iter().map(|s| s * s).collect();
    let df: Vec<f64> = fit.df_residual.to_vec();
    let squeezed = squeeze_var(&var, &df);
    let prior = squeezed.prior;

    debug!(
        "Variance prior: df_prior={:.4}, s2_prior={:.6}",
        prior.df_prior, prior.s2_prior
    );

    let df_pooled: f64 = df.iter().filter(|d| d.is_finite()).sum();
    let df_total: Array1<f64> = Array1::from_iter(
        df.iter().map(|&d| (d + prior.df_prior).min(df_pooled)),
    );
    let s2_post = Array1::from_vec(squeezed.var_post);

    let mut std_error = Array2::zeros((n_rows, n_coefs));
    let mut t = Array2::zeros((n_rows, n_coefs));
    let mut p_value = Array2::zeros((n_rows, n_coefs));
    for i in 0..n_rows {
        let s_post = s2_post[i].sqrt();
        for k in 0..n_coefs {
            let se = fit.stdev_unscaled[k] * s_post;
            let stat = fit.coefficients[[i, k]] / se;
            std_error[[i, k]] = se;
            t[[i, k]] = stat;
            p_value[[i, k]] = two_sided_pvalue(stat, df_total[i]);
        }
    }

    info!(
        "Empirical Bayes moderation: prior df {:.3}, prior variance {:.5}",
        prior.df_prior, prior.s2_prior
    );

    Ok(ModeratedFit {
        linear: fit.clone(),
        df_prior: prior.df_prior,
        s2_prior: prior.s2_prior,
        s2_post,
        std_error,
        t,
        df_total,
        p_value,
    })
}
