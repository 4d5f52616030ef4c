//! Data structures for the growth-rate expression analysis

mod expression_matrix;
mod gene_set;
pub mod key;
mod long_table;
mod nutrient;

pub use expression_matrix::ExpressionMatrix;
pub use gene_set::{GeneAnnotation, GeneSetTable};
pub use key::{compose_key, split_key};
pub use long_table::{
    clean_raw_table, filter_complete_groups, load_long_table, LoadParams, LongRecord, LongTable,
};
pub use nutrient::{parse_sample_column, Nutrient};
