use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Failed to read normalization bounds '{0}'")]
    BoundsRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse normalization bounds")]
    BoundsParse(#[from] serde_json::Error),

    #[error("Normalization bounds must hold exactly 2 rows, found {0}")]
    BoundsShape(usize),

    #[error("Post id '{0}' is not numeric")]
    NonNumericPostId(String),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),
}
