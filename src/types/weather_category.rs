//! Defines the `WeatherCategory` enum, the coarse daily weather classes read from
//! the diary's icon columns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The weather observed on a day, as recorded by a diary icon.
///
/// The diary shows at most one "phenomenon" icon per observation. A cell without
/// any icon means nothing notable was observed, which is mapped to [`WeatherCategory::Clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCategory {
    /// No precipitation or storm icon.
    Clear,
    /// Rain icon.
    Rain,
    /// Thunderstorm icon.
    Storm,
    /// Snow icon.
    Snow,
}

/// Returned when an icon token does not name one of the known categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown weather token '{0}'")]
pub struct UnknownWeatherToken(pub String);

impl WeatherCategory {
    /// The token used in icon file names and in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCategory::Clear => "clear",
            WeatherCategory::Rain => "rain",
            WeatherCategory::Storm => "storm",
            WeatherCategory::Snow => "snow",
        }
    }

    /// One-hot flags in model order: `[snow, rain, storm]`.
    ///
    /// `Clear` is encoded as all zeros.
    ///
    /// ```
    /// use riverlevel::WeatherCategory;
    ///
    /// assert_eq!(WeatherCategory::Clear.one_hot(), [0.0, 0.0, 0.0]);
    /// assert_eq!(WeatherCategory::Snow.one_hot(), [1.0, 0.0, 0.0]);
    /// ```
    pub fn one_hot(&self) -> [f64; 3] {
        match self {
            WeatherCategory::Clear => [0.0, 0.0, 0.0],
            WeatherCategory::Snow => [1.0, 0.0, 0.0],
            WeatherCategory::Rain => [0.0, 1.0, 0.0],
            WeatherCategory::Storm => [0.0, 0.0, 1.0],
        }
    }
}

impl FromStr for WeatherCategory {
    type Err = UnknownWeatherToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clear" => Ok(WeatherCategory::Clear),
            "rain" => Ok(WeatherCategory::Rain),
            "storm" => Ok(WeatherCategory::Storm),
            "snow" => Ok(WeatherCategory::Snow),
            other => Err(UnknownWeatherToken(other.to_string())),
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
