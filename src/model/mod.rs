//! The scoring boundary between feature tables and water-level predictions.

pub mod error;
pub mod xgboost;

use crate::model::error::ModelError;
use polars::prelude::DataFrame;

/// Scores feature rows.
///
/// Implementations read the model columns by name and return exactly one
/// prediction per input row, in input order. Null cells are missing values.
pub trait Forecaster {
    fn predict(&self, input: &DataFrame) -> Result<Vec<f64>, ModelError>;
}
