//! Composite gene-condition keys used as expression matrix row names
//!
//! A key joins a systematic gene name and a nutrient with `_`, e.g.
//! `YNL049C_Glucose`. Splitting happens at the last `_`, and nutrient names
//! never contain one, so [`split_key`] is the exact inverse of [`compose_key`]
//! even for systematic names that contain underscores.

use super::Nutrient;
use crate::error::{LimmaError, Result};

pub const KEY_SEPARATOR: char = '_';

/// Build the row key for a gene under a nutrient
pub fn compose_key(systematic_name: &str, nutrient: Nutrient) -> String {
    format!("{}{}{}", systematic_name, KEY_SEPARATOR, nutrient)
}

/// Split a row key back into (systematic name, nutrient)
pub fn split_key(key: &str) -> Result<(String, Nutrient)> {
    let (systematic_name, nutrient) =
        key.rsplit_once(KEY_SEPARATOR)
            .ok_or_else(|| LimmaError::InvalidKey {
                key: key.to_string(),
                reason: format!("no '{}' separator", KEY_SEPARATOR),
            })?;

    if systematic_name.is_empty() {
        return Err(LimmaError::InvalidKey {
            key: key.to_string(),
            reason: "empty systematic name".to_string(),
        });
    }

    let nutrient = nutrient.parse::<Nutrient>().map_err(|_| LimmaError::InvalidKey {
        key: key.to_string(),
        reason: format!("'{}' is not a nutrient", nutrient),
    })?;

    Ok((systematic_name.to_string(), nutrient))
}
