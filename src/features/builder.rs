//! Turns a reconciled day series into the numeric table the forecaster reads.

use crate::features::bounds::{parse_post_id, AnchorRow, NormalizationBounds};
use crate::features::columns::*;
use crate::features::error::FeatureError;
use crate::types::day::ReconciledDay;
use crate::types::weather_category::WeatherCategory;
use crate::utils::days_in_year;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::f64::consts::TAU;

/// Feature rows aligned one-to-one with the reconciled days they were built from.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    frame: DataFrame,
}

impl FeatureTable {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Every column, including `date`.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Only the model columns, in training order.
    pub fn model_input(&self) -> Result<DataFrame, FeatureError> {
        Ok(self.frame.select(MODEL_COLUMNS)?)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Sine and cosine of the day of year, with the period set to that year's
/// own length so December 31 and January 1 stay adjacent across leap years.
///
/// ```
/// use chrono::NaiveDate;
/// use riverlevel::day_of_year_encoding;
///
/// let (sin, cos) = day_of_year_encoding(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap());
/// assert!(sin.abs() < 1e-9);
/// assert!((cos - 1.0).abs() < 1e-9);
/// ```
pub fn day_of_year_encoding(date: NaiveDate) -> (f64, f64) {
    let angle = TAU * f64::from(date.ordinal()) / f64::from(days_in_year(date.year()));
    angle.sin_cos()
}

struct RawRow {
    date: NaiveDate,
    uid: f64,
    latitude: f64,
    longitude: f64,
    temperature: Option<f64>,
    weather: WeatherCategory,
    is_fallback: f64,
}

impl RawRow {
    fn from_day(uid: f64, day: &ReconciledDay) -> Self {
        Self {
            date: day.date,
            uid,
            latitude: day.location.latitude(),
            longitude: day.location.longitude(),
            temperature: day.temperature.map(f64::from),
            weather: day.weather,
            is_fallback: if day.is_fallback { 1.0 } else { 0.0 },
        }
    }

    fn from_anchor(anchor: &AnchorRow) -> Self {
        Self {
            date: anchor.date,
            uid: anchor.post_id,
            latitude: anchor.latitude,
            longitude: anchor.longitude,
            temperature: Some(anchor.temperature),
            weather: anchor.weather,
            is_fallback: anchor.is_fallback,
        }
    }
}

fn raw_frame(rows: &[RawRow]) -> PolarsResult<DataFrame> {
    let mut day_sin = Vec::with_capacity(rows.len());
    let mut day_cos = Vec::with_capacity(rows.len());
    let mut flags: [Vec<f64>; 3] = Default::default();
    for row in rows {
        let (sin, cos) = day_of_year_encoding(row.date);
        day_sin.push(sin);
        day_cos.push(cos);
        for (column, flag) in flags.iter_mut().zip(row.weather.one_hot()) {
            column.push(flag);
        }
    }
    let [snow, rain, storm] = flags;

    let float = |name: &str, values: Vec<f64>| Series::new(name.into(), values).into_column();
    DataFrame::new(vec![
        DateChunked::from_naive_date(COL_DATE.into(), rows.iter().map(|r| r.date))
            .into_series()
            .into_column(),
        float(COL_UID, rows.iter().map(|r| r.uid).collect()),
        float(COL_LATITUDE, rows.iter().map(|r| r.latitude).collect()),
        float(COL_LONGITUDE, rows.iter().map(|r| r.longitude).collect()),
        Series::new(
            COL_TEMPERATURE.into(),
            rows.iter().map(|r| r.temperature).collect::<Vec<_>>(),
        )
        .into_column(),
        float(COL_IS_FALLBACK, rows.iter().map(|r| r.is_fallback).collect()),
        float(COL_YEAR, rows.iter().map(|r| f64::from(r.date.year())).collect()),
        float(COL_DAY_SIN, day_sin),
        float(COL_DAY_COS, day_cos),
        float(COL_WEATHER_SNOW, snow),
        float(COL_WEATHER_RAIN, rain),
        float(COL_WEATHER_STORM, storm),
    ])
}

/// `(x - min) / (max - min)` over the whole column; a constant column scales to 0.
fn min_max(name: &str) -> Expr {
    let range = col(name).max() - col(name).min();
    let scale = when(range.clone().eq(lit(0.0)))
        .then(lit(1.0))
        .otherwise(range);
    ((col(name) - col(name).min()) / scale).alias(name)
}

/// Builds the feature table for `days` of post `post_id`.
///
/// The anchor rows of `bounds` take part in scaling and are dropped afterwards,
/// so the result has exactly one row per input day, in input order. Empty input
/// gives an empty table.
pub fn build(
    post_id: &str,
    days: &[ReconciledDay],
    bounds: &NormalizationBounds,
) -> Result<FeatureTable, FeatureError> {
    let uid = parse_post_id(post_id)?;
    let rows: Vec<RawRow> = days
        .iter()
        .map(|day| RawRow::from_day(uid, day))
        .chain(bounds.rows().iter().map(RawRow::from_anchor))
        .collect();

    let scaled = raw_frame(&rows)?
        .lazy()
        .with_columns(SCALED_COLUMNS.iter().map(|name| min_max(name)).collect::<Vec<_>>())
        .collect()?;

    Ok(FeatureTable {
        dates: days.iter().map(|d| d.date).collect(),
        frame: scaled.slice(0, days.len()),
    })
}
