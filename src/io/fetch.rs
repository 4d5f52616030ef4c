//! Retrieval of the raw expression table from a URL or a local file

use std::fs;

use log::info;

use crate::error::{LimmaError, Result};

/// Default location of the Brauer et al. (2008) growth-rate data set
pub const DEFAULT_SOURCE: &str = "http://varianceexplained.org/files/Brauer2008_DataSet1.tds";

/// True when the source should be fetched over HTTP(S)
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Read the whole source as text.
///
/// Sources starting with `http://` or `https://` are fetched with a single
/// blocking GET; anything else is treated as a filesystem path. There is no
/// retry: an unreachable source aborts the run.
pub fn read_text_input(source: &str) -> Result<String> {
    if is_remote(source) {
        info!("Fetching expression table from: {}", source);
        let response = reqwest::blocking::get(source)?;
        if !response.status().is_success() {
            return Err(LimmaError::HttpStatus {
                url: source.to_string(),
                status: response.status().to_string(),
            });
        }
        Ok(response.text()?)
    } else {
        info!("Reading expression table from: {}", source);
        Ok(fs::read_to_string(source)?)
    }
}
