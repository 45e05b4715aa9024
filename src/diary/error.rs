use crate::types::weather_category::UnknownWeatherToken;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // Neither a data table nor the "no observations" marker
    #[error("Unexpected page layout for {url}: {message}")]
    UnexpectedLayout { url: String, message: String },

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl DiaryError {
    /// Transport failures are never cached and can be retried by the caller.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DiaryError::NetworkRequest(..) | DiaryError::HttpStatus { .. }
        )
    }
}

/// Failure to decode a single row of a diary table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("row has {found} cells, expected at least {expected}")]
    TooFewCells { found: usize, expected: usize },

    #[error("day of month could not be resolved")]
    MissingDay,

    #[error("cell {cell} holds non-numeric value '{text}'")]
    InvalidNumber { cell: usize, text: String },

    #[error("unexpected icon count {count} in cell {cell}")]
    IconCount { cell: usize, count: usize },

    #[error("icon path '{0}' carries no weather token")]
    IconPath(String),

    #[error(transparent)]
    UnknownCategory(#[from] UnknownWeatherToken),

    #[error("day {day} is outside a month of {days_in_month} days")]
    DayOutOfRange { day: u32, days_in_month: u32 },
}

impl RowError {
    /// Markup that does not have the expected shape, as opposed to a value that
    /// cannot be resolved.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            RowError::TooFewCells { .. }
                | RowError::IconCount { .. }
                | RowError::IconPath(_)
                | RowError::UnknownCategory(_)
        )
    }
}
