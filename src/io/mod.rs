//! Input/Output operations

mod csv;
mod fetch;

pub use self::csv::{read_raw_table, write_glance, write_long_table, write_results, RawTable};
pub use fetch::{is_remote, read_text_input, DEFAULT_SOURCE};
