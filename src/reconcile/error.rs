use crate::diary::error::{DiaryError, RowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Diary(#[from] DiaryError),

    #[error("Unexpected table format ({source}), check {}", .sources.join(" + "))]
    Format {
        sources: Vec<String>,
        #[source]
        source: RowError,
    },

    #[error("Unresolvable row ({source}), check {}", .sources.join(" + "))]
    Parse {
        sources: Vec<String>,
        #[source]
        source: RowError,
    },

    #[error("{year}-{month} is not a calendar month")]
    InvalidMonth { year: i32, month: u32 },
}

impl ReconcileError {
    pub(crate) fn from_row(source: RowError, sources: &[String]) -> Self {
        let sources = sources.to_vec();
        if source.is_format() {
            ReconcileError::Format { sources, source }
        } else {
            ReconcileError::Parse { sources, source }
        }
    }
}
