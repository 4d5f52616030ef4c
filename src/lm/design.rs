//! Design matrix creation for the per-row linear models

use ndarray::Array2;

use crate::error::{LimmaError, Result};

/// Name of the intercept coefficient
pub const INTERCEPT: &str = "(Intercept)";

/// Name of the growth-rate slope coefficient
pub const RATE: &str = "rate";

/// Design matrix shared by every row fit, with named coefficients
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    matrix: Array2<f64>,
    coef_names: Vec<String>,
}

impl DesignMatrix {
    pub fn new(matrix: Array2<f64>, coef_names: Vec<String>) -> Result<Self> {
        if matrix.ncols() != coef_names.len() {
            return Err(LimmaError::DimensionMismatch {
                expected: format!("{} coefficient names", matrix.ncols()),
                got: format!("{} coefficient names", coef_names.len()),
            });
        }
        if matrix.iter().any(|x| !x.is_finite()) {
            return Err(LimmaError::InvalidDesignMatrix {
                reason: "Design values must be finite".to_string(),
            });
        }
        Ok(Self { matrix, coef_names })
    }

    /// `~ rate`: an intercept column of ones and a column of growth rates
    pub fn intercept_slope(rates: &[f64]) -> Result<Self> {
        let n = rates.len();
        let mut matrix = Array2::zeros((n, 2));
        for (i, &rate) in rates.iter().enumerate() {
            matrix[[i, 0]] = 1.0;
            matrix[[i, 1]] = rate;
        }
        Self::new(matrix, vec![INTERCEPT.to_string(), RATE.to_string()])
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn coef_names(&self) -> &[String] {
        &self.coef_names
    }

    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_coefs(&self) -> usize {
        self.matrix.ncols()
    }

    #[cfg(test)]
    pub fn coef_index(&self, name: &str) -> Option<usize> {
        self.coef_names.iter().position(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intercept_slope() {
        let design = DesignMatrix::intercept_slope(&[0.05, 0.1, 0.15]).unwrap();
        assert_eq!(design.n_samples(), 3);
        assert_eq!(design.n_coefs(), 2);
        assert_eq!(design.matrix()[[2, 0]], 1.0);
        assert_eq!(design.matrix()[[2, 1]], 0.15);
        assert_eq!(design.coef_index(RATE), Some(1));
    }

    #[test]
    fn test_name_count_mismatch() {
        let matrix = Array2::zeros((3, 2));
        assert!(DesignMatrix::new(matrix, vec!["a".to_string()]).is_err());
    }
}
