//! Empirical Bayes shrinkage of residual variances

mod ebayes;

pub use ebayes::{ebayes, fit_f_dist, squeeze_var, ModeratedFit, SqueezedVar, VariancePrior};
