//! Observation posts and the static catalog they are loaded from.

use crate::error::ForecastError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// ```
/// use riverlevel::LatLon;
///
/// let post = LatLon(59.38, 28.19);
/// assert_eq!(post.0, 59.38); // Latitude
/// assert_eq!(post.1, 28.19); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }
}

/// Secondary weather station used to fill days missing from a post's primary station.
#[derive(Debug, Clone, PartialEq)]
pub struct Fallback {
    pub station_id: String,
    pub location: LatLon,
}

/// A water-level observation post bound to a weather diary station.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Post identifier as used by the water-level portal and the model.
    pub id: String,
    pub name: String,
    pub location: LatLon,
    /// Diary station with the preferred weather record for this post.
    pub station_id: String,
    pub fallback: Option<Fallback>,
    /// Tags every reconciled day of this post as fallback data, regardless of
    /// which station supplied it. Used for posts whose primary station is known
    /// to publish borrowed observations.
    pub flag_as_fallback: bool,
}

#[derive(Debug, Deserialize)]
struct FallbackRecord {
    #[serde(alias = "gismeteo_id")]
    station_id: StationId,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct PostRecord {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(alias = "gismeteo_id")]
    station_id: StationId,
    fallback: Option<FallbackRecord>,
    #[serde(default)]
    flag_as_fallback: bool,
}

/// Station ids show up both as JSON numbers and strings in catalog files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StationId {
    Number(u64),
    Text(String),
}

impl StationId {
    fn into_sanitized(self) -> String {
        match self {
            StationId::Number(n) => n.to_string(),
            StationId::Text(s) => sanitize_station_id(&s),
        }
    }
}

/// Keeps only characters that are safe inside a cache path component.
pub(crate) fn sanitize_station_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Read-only catalog of every post the service can forecast, keyed by post id.
#[derive(Debug, Clone, Default)]
pub struct PostCatalog {
    posts: BTreeMap<String, Post>,
}

impl PostCatalog {
    pub async fn load(path: &Path) -> Result<Self, ForecastError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ForecastError::CatalogRead(path.to_path_buf(), e))?;
        Self::from_json(&raw).map_err(|e| ForecastError::CatalogParse(path.to_path_buf(), e))
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let records: BTreeMap<String, PostRecord> = serde_json::from_str(raw)?;
        let posts = records
            .into_iter()
            .map(|(id, record)| {
                let post = Post {
                    id: id.clone(),
                    name: record.name,
                    location: LatLon(record.latitude, record.longitude),
                    station_id: record.station_id.into_sanitized(),
                    fallback: record.fallback.map(|fb| Fallback {
                        station_id: fb.station_id.into_sanitized(),
                        location: LatLon(fb.latitude, fb.longitude),
                    }),
                    flag_as_fallback: record.flag_as_fallback,
                };
                (id, post)
            })
            .collect();
        Ok(Self { posts })
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.get(id)
    }

    /// Posts in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.values()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl FromIterator<Post> for PostCatalog {
    fn from_iter<T: IntoIterator<Item = Post>>(iter: T) -> Self {
        Self {
            posts: iter.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }
}
