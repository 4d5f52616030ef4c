//! Linear model fitting

mod design;
mod fitting;

pub use design::{DesignMatrix, INTERCEPT, RATE};
pub use fitting::{lm_fit, LinearFit, LmFitParams};
