//! rust_limma: per-gene linear models of yeast expression against growth rate
//!
//! Expression of every gene under each limiting nutrient is regressed on the
//! chemostat growth rate. Per-row least squares fits are moderated with an
//! empirical Bayes prior on the residual variances, then tidied into one row
//! per gene, nutrient and term for ranking, annotation lookups and charts.
//!
//! # Example
//!
//! ```ignore
//! use rust_limma::prelude::*;
//!
//! let params = PipelineParams {
//!     source: "Brauer2008_DataSet1.tds".to_string(),
//!     ..PipelineParams::default()
//! };
//! let results = run_pipeline(&params)?;
//! println!("{}", results.summary);
//! ```

pub mod analysis;
pub mod cli;
pub mod data;
pub mod error;
pub mod io;
pub mod lm;
pub mod pipeline;
pub mod plot;
pub mod shrinkage;
pub mod stats;
pub mod testing;
pub mod tidy;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analysis::{
        adjust_by_group, intercepts_for_process, join_trends, separate, significant,
        top_by_effect, GeneTermResult, ResultsSummary, TrendPoint,
    };
    pub use crate::data::{
        compose_key, load_long_table, split_key, ExpressionMatrix, GeneSetTable, LoadParams,
        LongRecord, LongTable, Nutrient,
    };
    pub use crate::error::{LimmaError, Result};
    pub use crate::io::{read_raw_table, read_text_input, write_long_table, write_results};
    pub use crate::lm::{lm_fit, DesignMatrix, LinearFit, LmFitParams, INTERCEPT, RATE};
    pub use crate::pipeline::{analyze, run_pipeline, PipelineParams, PipelineResults};
    pub use crate::shrinkage::{ebayes, squeeze_var, ModeratedFit};
    pub use crate::testing::{benjamini_hochberg, AdjustMethod};
    pub use crate::tidy::{glance, tidy, Glance, TidyOptions, TidyRow};
}
