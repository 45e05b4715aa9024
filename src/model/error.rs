use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model file '{0}'")]
    ModelRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse model JSON")]
    ModelParse(#[from] serde_json::Error),

    #[error("Invalid base score '{0}'")]
    BaseScore(String),

    #[error("Model was trained on columns {found:?}, expected {expected:?}")]
    FeatureNames {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Malformed tree {tree}: {message}")]
    MalformedTree { tree: usize, message: String },

    #[error("Model input column '{0}' not found")]
    MissingColumn(String, #[source] PolarsError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Forecaster returned {found} predictions for {expected} rows")]
    PredictionCount { expected: usize, found: usize },
}
