mod diary;
mod error;
mod features;
mod model;
mod predictor;
mod reconcile;
mod types;
mod utils;

pub use error::ForecastError;
pub use predictor::*;

pub use types::day::{DayRecord, ReconciledDay};
pub use types::post::{Fallback, LatLon, Post, PostCatalog};
pub use types::weather_category::{UnknownWeatherToken, WeatherCategory};

pub use diary::monthly_table::{minify_markup, Cell, MonthlyTable, RowCells};
pub use diary::row_parser::parse_row;
pub use diary::source_cache::{CacheKey, SourceCache};
pub use diary::table_fetcher::{TableFetcher, DEFAULT_DIARY_URL, DEFAULT_THROTTLE};

pub use reconcile::reconciler::Reconciler;
pub use reconcile::source::{MemorySource, MonthlySource};

pub use features::bounds::{AnchorRow, NormalizationBounds};
pub use features::builder::{build as build_features, day_of_year_encoding, FeatureTable};
pub use features::columns::*;

pub use model::xgboost::TreeEnsemble;
pub use model::Forecaster;

pub use diary::error::{DiaryError, RowError};
pub use features::error::FeatureError;
pub use model::error::ModelError;
pub use reconcile::error::ReconcileError;
