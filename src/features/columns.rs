//! Column names of the feature table.

pub const COL_DATE: &str = "date";
pub const COL_UID: &str = "uid";
pub const COL_LATITUDE: &str = "latitude";
pub const COL_LONGITUDE: &str = "longitude";
pub const COL_TEMPERATURE: &str = "temperature";
pub const COL_IS_FALLBACK: &str = "is_fallback_data";
pub const COL_YEAR: &str = "year";
pub const COL_DAY_SIN: &str = "day_sin";
pub const COL_DAY_COS: &str = "day_cos";
pub const COL_WEATHER_SNOW: &str = "weather_snow";
pub const COL_WEATHER_RAIN: &str = "weather_v3_rain";
pub const COL_WEATHER_STORM: &str = "weather_v3_storm";

/// Model input columns, in the order the model was trained on.
pub const MODEL_COLUMNS: [&str; 11] = [
    COL_UID,
    COL_LATITUDE,
    COL_LONGITUDE,
    COL_TEMPERATURE,
    COL_IS_FALLBACK,
    COL_YEAR,
    COL_DAY_SIN,
    COL_DAY_COS,
    COL_WEATHER_SNOW,
    COL_WEATHER_RAIN,
    COL_WEATHER_STORM,
];

/// Columns min-max scaled against the normalization anchors.
pub const SCALED_COLUMNS: [&str; 5] = [
    COL_UID,
    COL_TEMPERATURE,
    COL_YEAR,
    COL_LATITUDE,
    COL_LONGITUDE,
];
