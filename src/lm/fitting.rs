//! Batched ordinary least squares over a shared design matrix
//!
//! Every row of the expression matrix is regressed on the same design, so
//! `(X'X)^-1` is factorised once and reused; each row then costs one
//! matrix-vector product plus its residual sum of squares.

use log::info;
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;

use super::design::DesignMatrix;
use crate::data::ExpressionMatrix;
use crate::error::{LimmaError, Result};

/// Configurable parameters for linear model fitting.
#[derive(Debug, Clone)]
pub struct LmFitParams {
    /// Relative pivot tolerance below which `X'X` is treated as singular
    pub singular_tol: f64,
}

impl Default for LmFitParams {
    fn default() -> Self {
        Self { singular_tol: 1e-10 }
    }
}

/// Per-row least squares fits
#[derive(Debug, Clone)]
pub struct LinearFit {
    /// Row keys of the fitted matrix
    pub row_keys: Vec<String>,
    /// Coefficient names from the design
    pub coef_names: Vec<String>,
    /// Estimated coefficients (rows x coefficients)
    pub coefficients: Array2<f64>,
    /// sqrt(diag((X'X)^-1)), shared by all rows
    pub stdev_unscaled: Array1<f64>,
    /// Residual standard deviation per row
    pub sigma: Array1<f64>,
    /// Residual degrees of freedom per row
    pub df_residual: Array1<f64>,
    /// Average expression per row
    pub amean: Array1<f64>,
}

impl LinearFit {
    pub fn n_rows(&self) -> usize {
        self.row_keys.len()
    }

    pub fn n_coefs(&self) -> usize {
        self.coef_names.len()
    }
}

/// Fit `y = X b + e` for every row of the matrix.
/// Rows are fitted in parallel; output order matches the matrix.
pub fn lm_fit(
    matrix: &ExpressionMatrix,
    design: &DesignMatrix,
    params: &LmFitParams,
) -> Result<LinearFit> {
    let x = design.matrix();
    let n_samples = x.nrows();
    let n_coefs = x.ncols();

    if n_samples != matrix.n_samples() {
        return Err(LimmaError::DimensionMismatch {
            expected: format!("{} design rows (one per matrix column)", matrix.n_samples()),
            got: format!("{} design rows", n_samples),
        });
    }

    let xtx = cross_product(x);
    let xtx_inv = invert_symmetric_matrix(&xtx, n_coefs, params.singular_tol).ok_or_else(|| {
        LimmaError::InvalidDesignMatrix {
            reason: "X'X is singular; coefficients are not estimable".to_string(),
        }
    })?;

    let stdev_unscaled = Array1::from_iter((0..n_coefs).map(|k| xtx_inv[k * n_coefs + k].sqrt()));
    let df = n_samples as f64 - n_coefs as f64;

    info!(
        "Fitting linear models: {} rows, {} samples, {} coefficients",
        matrix.n_rows(),
        n_samples,
        n_coefs
    );

    let row_fits: Vec<RowFit> = (0..matrix.n_rows())
        .into_par_iter()
        .map(|i| fit_row(matrix.row(i), x, &xtx_inv, df))
        .collect();

    let n_rows = row_fits.len();
    let mut coefficients = Array2::zeros((n_rows, n_coefs));
    let mut sigma = Array1::zeros(n_rows);
    let mut amean = Array1::zeros(n_rows);
    for (i, fit) in row_fits.into_iter().enumerate() {
        for (k, &b) in fit.beta.iter().enumerate() {
            coefficients[[i, k]] = b;
        }
        sigma[i] = fit.sigma;
        amean[i] = fit.amean;
    }

    Ok(LinearFit {
        row_keys: matrix.row_keys().to_vec(),
        coef_names: design.coef_names().to_vec(),
        coefficients,
        stdev_unscaled,
        sigma,
        df_residual: Array1::from_elem(n_rows, df.max(0.0)),
        amean,
    })
}

struct RowFit {
    beta: Vec<f64>,
    sigma: f64,
    amean: f64,
}

fn fit_row(y: ArrayView1<'_, f64>, x: &Array2<f64>, xtx_inv: &[f64], df: f64) -> RowFit {
    let n_coefs = x.ncols();

    let mut xty = vec![0.0; n_coefs];
    for (i, &yi) in y.iter().enumerate() {
        for (j, v) in xty.iter_mut().enumerate() {
            *v += x[[i, j]] * yi;
        }
    }

    let beta: Vec<f64> = (0..n_coefs)
        .map(|j| (0..n_coefs).map(|k| xtx_inv[j * n_coefs + k] * xty[k]).sum())
        .collect();

    let rss: f64 = y
        .iter()
        .enumerate()
        .map(|(i, &yi)| {
            let fitted: f64 = (0..n_coefs).map(|j| x[[i, j]] * beta[j]).sum();
            (yi - fitted).powi(2)
        })
        .sum();

    let sigma = if df > 0.0 { (rss / df).sqrt() } else { f64::NAN };
    let amean = if y.is_empty() { f64::NAN } else { y.sum() / y.len() as f64 };

    RowFit { beta, sigma, amean }
}

/// X'X as a flat row-major vector
fn cross_product(x: &Array2<f64>) -> Vec<f64> {
    let n_coefs = x.ncols();
    let mut xtx = vec![0.0; n_coefs * n_coefs];
    for row in x.rows() {
        for j in 0..n_coefs {
            for k in 0..n_coefs {
                xtx[j * n_coefs + k] += row[j] * row[k];
            }
        }
    }
    xtx
}

/// Cholesky factor L (row-major, lower triangular) of a symmetric matrix.
/// Returns None when a pivot falls below `tol` relative to the largest diagonal.
fn cholesky(a: &[f64], n: usize, tol: f64) -> Option<Vec<f64>> {
    let scale = (0..n).map(|i| a[i * n + i].abs()).fold(0.0, f64::max);
    if scale == 0.0 {
        return None;
    }

    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if sum <= tol * scale {
                    return None;
                }
                l[i * n + j] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }
    Some(l)
}

fn cholesky_solve(l: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i * n + j] * y[j];
        }
        y[i] = sum / l[i * n + i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j * n + i] * x[j];
        }
        x[i] = sum / l[i * n + i];
    }
    x
}

fn invert_symmetric_matrix(a: &[f64], n: usize, tol: f64) -> Option<Vec<f64>> {
    let l = cholesky(a, n, tol)?;
    let mut result = vec![0.0; n * n];
    for i in 0..n {
        let mut e = vec![0.0; n];
        e[i] = 1.0;
        let col = cholesky_solve(&l, &e, n);
        for j in 0..n {
            result[j * n + i] = col[j];
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn matrix(values: Array2<f64>, rates: Vec<f64>) -> ExpressionMatrix {
        let keys = (0..values.nrows()).map(|i| format!("Y{}_Glucose", i)).collect();
        ExpressionMatrix::new(values, keys, rates).unwrap()
    }

    #[test]
    fn test_exact_line_recovered() {
        let rates = vec![0.05, 0.1, 0.15, 0.2, 0.25, 0.3];
        let values = array![
            [2.15, 2.3, 2.45, 2.6, 2.75, 2.9], // 2 + 3 * rate
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        ];
        let m = matrix(values, rates.clone());
        let design = DesignMatrix::intercept_slope(&rates).unwrap();
        let fit = lm_fit(&m, &design, &LmFitParams::default()).unwrap();

        assert!((fit.coefficients[[0, 0]] - 2.0).abs() < 1e-10);
        assert!((fit.coefficients[[0, 1]] - 3.0).abs() < 1e-10);
        assert!(fit.sigma[0] < 1e-8);
        assert!((fit.coefficients[[1, 0]] - 1.0).abs() < 1e-10);
        assert!(fit.coefficients[[1, 1]].abs() < 1e-10);
        assert_eq!(fit.df_residual[0], 4.0);
        assert!((fit.amean[0] - 2.525).abs() < 1e-10);
    }

    #[test]
    fn test_residual_sigma_and_unscaled_sd() {
        // x = 0,1,2,3 ; y = 0,1,1,2 -> b = (0.1, 0.6), rss = 0.2
        let rates = vec![0.0, 1.0, 2.0, 3.0];
        let m = matrix(array![[0.0, 1.0, 1.0, 2.0]], rates.clone());
        let design = DesignMatrix::intercept_slope(&rates).unwrap();
        let fit = lm_fit(&m, &design, &LmFitParams::default()).unwrap();

        assert!((fit.coefficients[[0, 0]] - 0.1).abs() < 1e-10);
        assert!((fit.coefficients[[0, 1]] - 0.6).abs() < 1e-10);
        assert!((fit.sigma[0] - (0.2f64 / 2.0).sqrt()).abs() < 1e-10);
        // (X'X)^-1 = [[0.7, -0.3], [-0.3, 0.2]]
        assert!((fit.stdev_unscaled[0] - 0.7f64.sqrt()).abs() < 1e-10);
        assert!((fit.stdev_unscaled[1] - 0.2f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_singular_design_rejected() {
        let rates = vec![0.1, 0.1, 0.1];
        let m = matrix(array![[1.0, 2.0, 3.0]], rates.clone());
        let design = DesignMatrix::intercept_slope(&rates).unwrap();
        assert!(matches!(
            lm_fit(&m, &design, &LmFitParams::default()),
            Err(LimmaError::InvalidDesignMatrix { .. })
        ));
    }

    #[test]
    fn test_design_length_mismatch() {
        let m = matrix(array![[1.0, 2.0, 3.0]], vec![0.1, 0.2, 0.3]);
        let design = DesignMatrix::intercept_slope(&[0.1, 0.2]).unwrap();
        assert!(lm_fit(&m, &design, &LmFitParams::default()).is_err());
    }

    #[test]
    fn test_empty_matrix() {
        let rates = vec![0.1, 0.2, 0.3];
        let m = matrix(Array2::zeros((0, 3)), rates.clone());
        let design = DesignMatrix::intercept_slope(&rates).unwrap();
        let fit = lm_fit(&m, &design, &LmFitParams::default()).unwrap();
        assert_eq!(fit.n_rows(), 0);
        assert_eq!(fit.coefficients.dim(), (0, 2));
    }
}
