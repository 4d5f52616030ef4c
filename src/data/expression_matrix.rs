//! Gene-condition × growth-rate expression matrix

use std::collections::BTreeMap;

use log::info;
use ndarray::{Array2, ArrayView1, ArrayView2};

use super::key::compose_key;
use super::LongTable;
use crate::error::{LimmaError, Result};

/// Expression values pivoted for model fitting.
/// Rows are gene-condition keys (sorted), columns are growth rates (ascending).
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    /// Expression data (rows x rates)
    values: Array2<f64>,
    /// Composite gene-condition keys
    row_keys: Vec<String>,
    /// Growth rate of each column
    rates: Vec<f64>,
}

impl ExpressionMatrix {
    /// Create a new expression matrix from raw data
    pub fn new(values: Array2<f64>, row_keys: Vec<String>, rates: Vec<f64>) -> Result<Self> {
        let (n_rows, n_cols) = values.dim();

        if row_keys.len() != n_rows {
            return Err(LimmaError::DimensionMismatch {
                expected: format!("{} row keys", n_rows),
                got: format!("{} row keys", row_keys.len()),
            });
        }

        if rates.len() != n_cols {
            return Err(LimmaError::DimensionMismatch {
                expected: format!("{} rates", n_cols),
                got: format!("{} rates", rates.len()),
            });
        }

        if values.iter().any(|x| !x.is_finite()) {
            return Err(LimmaError::InvalidExpressionMatrix {
                reason: "Expression values must be finite".to_string(),
            });
        }

        Ok(Self {
            values,
            row_keys,
            rates,
        })
    }

    /// Pivot a long table: one row per (systematic name, nutrient), one
    /// column per distinct rate.
    ///
    /// Every cell must be covered exactly once; a gap or a duplicate means the
    /// table was not filtered to complete groups and is reported as an error.
    pub fn from_long(table: &LongTable) -> Result<Self> {
        let mut rates: Vec<f64> = table.records().iter().map(|r| r.rate).collect();
        rates.sort_by(|a, b| a.total_cmp(b));
        rates.dedup();

        let mut cells: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        for record in table.records() {
            let key = compose_key(&record.systematic_name, record.nutrient);
            let col = rates
                .iter()
                .position(|&r| r == record.rate)
                .ok_or_else(|| LimmaError::InvalidExpressionMatrix {
                    reason: format!("Rate {} not among matrix columns", record.rate),
                })?;
            let row = cells.entry(key.clone()).or_insert_with(|| vec![None; rates.len()]);
            if row[col].is_some() {
                return Err(LimmaError::DuplicateCell {
                    row: key,
                    rate: record.rate.to_string(),
                });
            }
            row[col] = Some(record.expression);
        }

        let mut values = Array2::zeros((cells.len(), rates.len()));
        let mut row_keys = Vec::with_capacity(cells.len());
        for (i, (key, row)) in cells.into_iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                values[[i, j]] = cell.ok_or_else(|| LimmaError::MissingCell {
                    row: key.clone(),
                    rate: rates[j].to_string(),
                })?;
            }
            row_keys.push(key);
        }

        info!(
            "Built expression matrix: {} gene-condition rows x {} rates",
            row_keys.len(),
            rates.len()
        );
        Self::new(values, row_keys, rates)
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn row(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(idx)
    }

    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    /// The design vector: growth rate of each column
    pub fn design_vector(&self) -> &[f64] {
        &self.rates
    }

    #[cfg(test)]
    pub fn row_index(&self, key: &str) -> Option<usize> {
        self.row_keys.iter().position(|k| k == key)
    }
}
