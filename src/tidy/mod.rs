//! Row-oriented projection of a moderated fit
//!
//! `tidy` turns the per-coefficient matrices of a [`ModeratedFit`] into one
//! row per (gene-condition key, term); `glance` summarises the fit in one row.

use serde::{Deserialize, Serialize};

use crate::lm::INTERCEPT;
use crate::shrinkage::ModeratedFit;

/// One coefficient of one row fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidyRow {
    /// Gene-condition key of the matrix row
    pub gene: String,
    pub term: String,
    pub estimate: f64,
    #[serde(rename = "std.error")]
    pub std_error: f64,
    /// Moderated t-statistic
    pub statistic: f64,
    #[serde(rename = "p.value")]
    pub p_value: f64,
}

/// Options for [`tidy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TidyOptions {
    /// Emit the intercept term as well as the slope terms
    pub intercept: bool,
}

/// One row per (row key, term), grouped by term in design order.
///
/// The intercept is left out unless requested. An empty fit yields an empty table.
pub fn tidy(fit: &ModeratedFit, options: TidyOptions) -> Vec<TidyRow> {
    let terms: Vec<(usize, &String)> = fit
        .coef_names()
        .iter()
        .enumerate()
        .filter(|(_, name)| options.intercept || name.as_str() != INTERCEPT)
        .collect();

    let mut rows = Vec::with_capacity(terms.len() * fit.n_rows());
    for (k, term) in terms {
        for (i, gene) in fit.row_keys().iter().enumerate() {
            rows.push(TidyRow {
                gene: gene.clone(),
                term: term.clone(),
                estimate: fit.coefficients()[[i, k]],
                std_error: fit.std_error[[i, k]],
                statistic: fit.t[[i, k]],
                p_value: fit.p_value[[i, k]],
            });
        }
    }
    rows
}

/// Single-row summary of a moderated fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glance {
    pub n_genes: usize,
    pub n_coefficients: usize,
    /// Residual degrees of freedom of the row fits (max over rows)
    pub df_residual: f64,
    /// Prior degrees of freedom; `null` in JSON when infinite
    pub df_prior: Option<f64>,
    pub s2_prior: Option<f64>,
}

pub fn glance(fit: &ModeratedFit) -> Glance {
    let finite = |x: f64| if x.is_finite() { Some(x) } else { None };
    Glance {
        n_genes: fit.n_rows(),
        n_coefficients: fit.coef_names().len(),
        df_residual: fit.linear.df_residual.iter().copied().fold(0.0, f64::max),
        df_prior: finite(fit.df_prior),
        s2_prior: finite(fit.s2_prior),
    }
}
