//! Error types for rust_limma

use thiserror::Error;

/// Main error type for the expression modelling pipeline
#[derive(Error, Debug)]
pub enum LimmaError {
    #[error("Invalid table layout: {reason}")]
    InvalidSchema { reason: String },

    #[error("Malformed NAME field on data line {line}: {reason}")]
    MalformedName { line: usize, reason: String },

    #[error("Missing expression value for row '{row}' at rate {rate}")]
    MissingCell { row: String, rate: String },

    #[error("Duplicate expression value for row '{row}' at rate {rate}")]
    DuplicateCell { row: String, rate: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Invalid expression matrix: {reason}")]
    InvalidExpressionMatrix { reason: String },

    #[error("Invalid design matrix: {reason}")]
    InvalidDesignMatrix { reason: String },

    #[error("No residual degrees of freedom in linear model fits")]
    NoResidualDf,

    #[error("Invalid gene-condition key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Unknown nutrient: {value}")]
    UnknownNutrient { value: String },

    #[error("Could not fetch '{url}': HTTP {status}")]
    HttpStatus { url: String, status: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Plot rendering failed: {reason}")]
    PlotFailed { reason: String },

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, LimmaError>;
