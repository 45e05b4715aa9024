//! The two anchor rows that pin min-max scaling to the training range.

use crate::features::error::FeatureError;
use crate::types::weather_category::WeatherCategory;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

/// One synthetic row of raw, unscaled feature values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRow {
    pub post_id: f64,
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub weather: WeatherCategory,
    pub is_fallback: f64,
}

/// Minimum and maximum anchor rows saved when the model was trained.
///
/// Appending both rows to a batch before scaling reproduces the training
/// normalization exactly; they are removed again before scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationBounds {
    pub min: AnchorRow,
    pub max: AnchorRow,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(f64),
}

#[derive(Debug, Deserialize)]
struct AnchorRecord(
    NumberOrText,
    NaiveDate,
    f64,
    f64,
    f64,
    WeatherCategory,
    Flag,
);

impl TryFrom<AnchorRecord> for AnchorRow {
    type Error = FeatureError;

    fn try_from(record: AnchorRecord) -> Result<Self, Self::Error> {
        let AnchorRecord(post_id, date, latitude, longitude, temperature, weather, flag) = record;
        let post_id = match post_id {
            NumberOrText::Number(n) => n,
            NumberOrText::Text(text) => parse_post_id(&text)?,
        };
        let is_fallback = match flag {
            Flag::Bool(b) => f64::from(u8::from(b)),
            Flag::Number(n) => n,
        };
        Ok(AnchorRow {
            post_id,
            date,
            latitude,
            longitude,
            temperature,
            weather,
            is_fallback,
        })
    }
}

/// Post ids double as a numeric model feature.
pub(crate) fn parse_post_id(id: &str) -> Result<f64, FeatureError> {
    id.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FeatureError::NonNumericPostId(id.to_string()))
}

impl NormalizationBounds {
    pub async fn load(path: &Path) -> Result<Self, FeatureError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FeatureError::BoundsRead(path.to_path_buf(), e))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, FeatureError> {
        let records: Vec<AnchorRecord> = serde_json::from_str(raw)?;
        if records.len() != 2 {
            return Err(FeatureError::BoundsShape(records.len()));
        }
        let mut rows = records.into_iter().map(AnchorRow::try_from);
        match (rows.next(), rows.next()) {
            (Some(min), Some(max)) => Ok(Self {
                min: min?,
                max: max?,
            }),
            _ => Err(FeatureError::BoundsShape(0)),
        }
    }

    pub fn rows(&self) -> [AnchorRow; 2] {
        [self.min, self.max]
    }
}
