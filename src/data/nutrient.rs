//! Limiting nutrients of the chemostat growth experiments

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LimmaError, Result};

/// Nutrient limiting growth in a chemostat culture.
///
/// Sample columns of the source table are named by the nutrient's single-letter
/// code followed by the dilution (growth) rate, e.g. `G0.05`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Nutrient {
    Ammonia,
    Glucose,
    Leucine,
    Phosphate,
    Sulfate,
    Uracil,
}

impl Nutrient {
    /// All nutrients, in display order
    pub const ALL: [Nutrient; 6] = [
        Nutrient::Ammonia,
        Nutrient::Glucose,
        Nutrient::Leucine,
        Nutrient::Phosphate,
        Nutrient::Sulfate,
        Nutrient::Uracil,
    ];

    /// Map a sample column prefix to its nutrient
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'G' => Some(Nutrient::Glucose),
            'L' => Some(Nutrient::Leucine),
            'P' => Some(Nutrient::Phosphate),
            'S' => Some(Nutrient::Sulfate),
            'N' => Some(Nutrient::Ammonia),
            'U' => Some(Nutrient::Uracil),
            _ => None,
        }
    }

    pub fn code(&self) -> char {
        match self {
            Nutrient::Glucose => 'G',
            Nutrient::Leucine => 'L',
            Nutrient::Phosphate => 'P',
            Nutrient::Sulfate => 'S',
            Nutrient::Ammonia => 'N',
            Nutrient::Uracil => 'U',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Nutrient::Ammonia => "Ammonia",
            Nutrient::Glucose => "Glucose",
            Nutrient::Leucine => "Leucine",
            Nutrient::Phosphate => "Phosphate",
            Nutrient::Sulfate => "Sulfate",
            Nutrient::Uracil => "Uracil",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Nutrient {
    type Err = LimmaError;

    fn from_str(s: &str) -> Result<Self> {
        Nutrient::ALL
            .iter()
            .copied()
            .find(|n| n.name() == s)
            .ok_or_else(|| LimmaError::UnknownNutrient {
                value: s.to_string(),
            })
    }
}

/// Parse a sample column header such as `G0.05` into (nutrient, rate).
///
/// Returns `None` when the header does not look like a sample column at all
/// (first character is not an uppercase letter or the remainder is not a number).
pub fn parse_sample_column(header: &str) -> Option<(char, f64)> {
    let mut chars = header.chars();
    let code = chars.next()?;
    if !code.is_ascii_uppercase() {
        return None;
    }
    let rate: f64 = chars.as_str().parse().ok()?;
    if !rate.is_finite() {
        return None;
    }
    Some((code, rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for nutrient in Nutrient::ALL {
            assert_eq!(Nutrient::from_code(nutrient.code()), Some(nutrient));
            assert_eq!(nutrient.name().parse::<Nutrient>().unwrap(), nutrient);
        }
        assert_eq!(Nutrient::from_code('X'), None);
    }

    #[test]
    fn test_parse_sample_column() {
        assert_eq!(parse_sample_column("G0.05"), Some(('G', 0.05)));
        assert_eq!(parse_sample_column("U0.3"), Some(('U', 0.3)));
        assert_eq!(parse_sample_column("GWEIGHT"), None);
        assert_eq!(parse_sample_column("NAME"), None);
        assert_eq!(parse_sample_column("g0.1"), None);
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert!("Nitrogen".parse::<Nutrient>().is_err());
    }
}
