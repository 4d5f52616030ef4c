//! P-value adjustment for multiple testing
//!
//! NaN p-values are carried through as NaN and do not count towards the
//! number of tests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LimmaError, Result};

/// Multiple-testing correction applied within each result group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdjustMethod {
    /// Benjamini-Hochberg false discovery rate
    #[default]
    Fdr,
    /// Bonferroni family-wise error rate
    Bonferroni,
    /// No adjustment
    Identity,
}

impl AdjustMethod {
    pub fn adjust(&self, pvalues: &[f64]) -> Vec<f64> {
        match self {
            AdjustMethod::Fdr => benjamini_hochberg(pvalues),
            AdjustMethod::Bonferroni => bonferroni(pvalues),
            AdjustMethod::Identity => pvalues.to_vec(),
        }
    }
}

impl FromStr for AdjustMethod {
    type Err = LimmaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fdr" | "bh" => Ok(AdjustMethod::Fdr),
            "bonferroni" => Ok(AdjustMethod::Bonferroni),
            "none" => Ok(AdjustMethod::Identity),
            other => Err(LimmaError::InvalidInput {
                reason: format!("Unknown adjustment method '{}'. Use: fdr, bonferroni, none", other),
            }),
        }
    }
}

impl fmt::Display for AdjustMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdjustMethod::Fdr => "fdr",
            AdjustMethod::Bonferroni => "bonferroni",
            AdjustMethod::Identity => "none",
        };
        f.write_str(name)
    }
}

/// Benjamini-Hochberg adjusted p-values (q-values).
///
/// Walking from the largest p-value down, `p * m / rank` is capped at 1 and
/// carried as a running minimum, so the adjusted values are non-decreasing in
/// the raw p-values.
pub fn benjamini_hochberg(pvalues: &[f64]) -> Vec<f64> {
    let n = pvalues.len();
    let mut finite: Vec<usize> = (0..n).filter(|&i| pvalues[i].is_finite()).collect();
    let m = finite.len();

    let mut padj = vec![f64::NAN; n];
    if m == 0 {
        return padj;
    }

    finite.sort_by(|&a, &b| pvalues[a].total_cmp(&pvalues[b]));

    let mut cummin = f64::INFINITY;
    for (rank0, &i) in finite.iter().enumerate().rev() {
        let adj = (pvalues[i] * m as f64 / (rank0 + 1) as f64).min(1.0);
        cummin = cummin.min(adj);
        padj[i] = cummin;
    }

    padj
}

/// Bonferroni adjusted p-values
pub fn bonferroni(pvalues: &[f64]) -> Vec<f64> {
    let m = pvalues.iter().filter(|p| p.is_finite()).count() as f64;
    pvalues
        .iter()
        .map(|&p| if p.is_finite() { (p * m).min(1.0) } else { f64::NAN })
        .collect()
}
