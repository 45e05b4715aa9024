//! This module provides the main entry point: a client that turns a post id and a
//! month into a day-by-day water-level forecast.

use crate::diary::table_fetcher::{TableFetcher, DEFAULT_DIARY_URL, DEFAULT_THROTTLE};
use crate::error::ForecastError;
use crate::features::bounds::NormalizationBounds;
use crate::features::builder::build;
use crate::features::columns::COL_DATE;
use crate::features::error::FeatureError;
use crate::model::error::ModelError;
use crate::model::xgboost::TreeEnsemble;
use crate::model::Forecaster;
use crate::reconcile::reconciler::Reconciler;
use crate::reconcile::source::MonthlySource;
use crate::types::day::ReconciledDay;
use crate::types::post::{Post, PostCatalog};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the prediction column in [`Forecast::frame`].
pub const COL_RESULT: &str = "result";

/// Predicted water levels of one post for one month.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub post_id: String,
    pub year: i32,
    pub month: u32,
    /// Columns `date` and `result`, one row per day that had weather data.
    pub frame: DataFrame,
}

impl Forecast {
    /// `true` when neither weather station had data for the month.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }
}

fn forecast_frame(dates: &[NaiveDate], predictions: Vec<f64>) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        DateChunked::from_naive_date(COL_DATE.into(), dates.iter().copied())
            .into_series()
            .into_column(),
        Series::new(COL_RESULT.into(), predictions).into_column(),
    ])
}

/// The forecasting client.
///
/// Holds the post catalog, the normalization bounds and the model, all loaded
/// once, and reads weather through a [`MonthlySource`] (by default the cached
/// diary fetcher).
///
/// # Examples
///
/// ```no_run
/// # use riverlevel::{ForecastError, WaterLevelPredictor};
/// # use std::path::Path;
/// # async fn run() -> Result<(), ForecastError> {
/// let predictor = WaterLevelPredictor::builder()
///     .catalog_path(Path::new("data/water_posts_data.json"))
///     .bounds_path(Path::new("data/normalization.json"))
///     .model_path(Path::new("data/xgboost.json"))
///     .build()
///     .await?;
///
/// let forecast = predictor.predict("75163", 2015, 10).await?;
/// println!("{}", forecast.frame);
/// # Ok(())
/// # }
/// ```
pub struct WaterLevelPredictor<F = TreeEnsemble, S = TableFetcher> {
    catalog: PostCatalog,
    bounds: NormalizationBounds,
    forecaster: F,
    reconciler: Reconciler<S>,
}

#[bon]
impl WaterLevelPredictor<TreeEnsemble, TableFetcher> {
    /// Loads the configuration files and prepares the diary cache.
    ///
    /// # Arguments
    ///
    /// * `.catalog_path(&Path)`: **Required.** Post catalog JSON.
    /// * `.bounds_path(&Path)`: **Required.** Normalization bounds JSON.
    /// * `.model_path(&Path)`: **Required.** XGBoost JSON model.
    /// * `.cache_dir(PathBuf)`: Optional. Defaults to `riverlevel_cache` in the
    ///   system cache directory. Created if missing.
    /// * `.diary_url(&str)`: Optional. Base URL of the weather diary.
    /// * `.throttle(Duration)`: Optional. Pause after every diary request, 1s by default.
    ///
    /// # Errors
    ///
    /// Fails if any file cannot be read or parsed, or the cache directory
    /// cannot be resolved or created.
    #[builder]
    pub async fn new(
        catalog_path: &Path,
        bounds_path: &Path,
        model_path: &Path,
        cache_dir: Option<PathBuf>,
        diary_url: Option<&str>,
        throttle: Option<Duration>,
    ) -> Result<Self, ForecastError> {
        let cache_dir = match cache_dir {
            Some(dir) => dir,
            None => get_cache_dir().map_err(ForecastError::CacheDirResolution)?,
        };
        ensure_cache_dir_exists(&cache_dir)
            .await
            .map_err(|e| ForecastError::CacheDirCreation(cache_dir.clone(), e))?;

        let catalog = PostCatalog::load(catalog_path).await?;
        let bounds = NormalizationBounds::load(bounds_path).await?;
        let forecaster = TreeEnsemble::load(model_path).await?;
        let fetcher = TableFetcher::new(
            &cache_dir,
            diary_url.unwrap_or(DEFAULT_DIARY_URL),
            throttle.unwrap_or(DEFAULT_THROTTLE),
        )?;
        info!(
            "Loaded {} posts, diary cache at {}",
            catalog.len(),
            cache_dir.display()
        );

        Ok(Self::from_parts(catalog, bounds, forecaster, fetcher))
    }
}

impl<F: Forecaster, S: MonthlySource> WaterLevelPredictor<F, S> {
    /// Assembles a predictor from already loaded parts.
    pub fn from_parts(
        catalog: PostCatalog,
        bounds: NormalizationBounds,
        forecaster: F,
        source: S,
    ) -> Self {
        Self {
            catalog,
            bounds,
            forecaster,
            reconciler: Reconciler::new(source),
        }
    }

    pub fn catalog(&self) -> &PostCatalog {
        &self.catalog
    }

    pub fn source(&self) -> &S {
        self.reconciler.source()
    }

    fn post(&self, post_id: &str) -> Result<&Post, ForecastError> {
        self.catalog
            .get(post_id)
            .ok_or_else(|| ForecastError::UnknownPost(post_id.to_string()))
    }

    /// The reconciled weather series the forecast is built from.
    pub async fn reconcile(
        &self,
        post_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<ReconciledDay>, ForecastError> {
        let post = self.post(post_id)?;
        Ok(self.reconciler.reconcile(post, year, month).await?)
    }

    /// Predicts the water level of `post_id` for every day of the month that has
    /// weather data. An empty [`Forecast`] means no data was available.
    pub async fn predict(
        &self,
        post_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Forecast, ForecastError> {
        let days = self.reconcile(post_id, year, month).await?;

        let (dates, predictions) = if days.is_empty() {
            info!("No weather for post {} in {}-{:02}", post_id, year, month);
            (Vec::new(), Vec::new())
        } else {
            let table = build(post_id, &days, &self.bounds)?;
            let predictions = self.forecaster.predict(&table.model_input()?)?;
            if predictions.len() != table.len() {
                return Err(ModelError::PredictionCount {
                    expected: table.len(),
                    found: predictions.len(),
                }
                .into());
            }
            (table.dates().to_vec(), predictions)
        };

        let frame = forecast_frame(&dates, predictions).map_err(FeatureError::from)?;
        Ok(Forecast {
            post_id: post_id.to_string(),
            year,
            month,
            frame,
        })
    }
}
