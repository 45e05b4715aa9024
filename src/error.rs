use crate::diary::error::DiaryError;
use crate::features::error::FeatureError;
use crate::model::error::ModelError;
use crate::reconcile::error::ReconcileError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Diary(#[from] DiaryError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Failed to read post catalog '{0}'")]
    CatalogRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse post catalog '{0}'")]
    CatalogParse(PathBuf, #[source] serde_json::Error),

    #[error("Post '{0}' is not in the catalog")]
    UnknownPost(String),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}
