use crate::types::post::LatLon;
use crate::types::weather_category::WeatherCategory;
use chrono::NaiveDate;

/// One decoded row of a station's monthly diary table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayRecord {
    /// Day of month, 1-based.
    pub day: u32,
    /// Degrees Celsius. `None` when neither the day nor the evening reading was published.
    pub temperature: Option<i32>,
    pub weather: WeatherCategory,
}

/// A day of the reconciled series, tagged with where its weather came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconciledDay {
    pub date: NaiveDate,
    /// Coordinates of the station whose observation was used.
    pub location: LatLon,
    pub temperature: Option<i32>,
    pub weather: WeatherCategory,
    pub is_fallback: bool,
}
