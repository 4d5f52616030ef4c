//! Significance testing and multiple-testing correction

mod fdr;
mod pvalue;

pub use fdr::{benjamini_hochberg, bonferroni, AdjustMethod};
pub use pvalue::two_sided_pvalue;
