//! Decodes one row of a monthly diary table into a [`DayRecord`].
//!
//! A row holds the day of month followed by two blocks of five cells, one for the
//! day-time observation and one for the evening. A value missing from the day-time
//! block is taken from the same column of the evening block.

use crate::diary::error::RowError;
use crate::diary::monthly_table::Cell;
use crate::types::day::DayRecord;
use crate::types::weather_category::WeatherCategory;
use regex::Regex;
use std::sync::OnceLock;

const DAY_CELL: usize = 0;
const TEMPERATURE_CELL: usize = 1;
const WEATHER_CELL: usize = 4;
const EVENING_STRIDE: usize = 5;
const LAST_CELL: usize = 10;

/// Shown instead of a number when nothing was measured.
const NO_VALUE: &str = "−";
/// Placeholder icon for "no phenomena reported at this time".
const STILL_ICON: &str = "still.gif";
/// A colour and a monochrome rendering of the same icon.
const MAX_ICONS: usize = 2;

fn icon_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"diary/img/(\w+)\.png").expect("icon regex should be valid"))
}

/// The cell itself, then its evening counterpart if that still lies inside the row.
fn candidates(cell: usize) -> impl Iterator<Item = usize> {
    [cell, cell + EVENING_STRIDE]
        .into_iter()
        .filter(|&idx| idx <= LAST_CELL)
}

fn parse_number(text: &str) -> Option<i32> {
    match text.strip_prefix('−') {
        Some(rest) => format!("-{rest}").parse().ok(),
        None => text.parse().ok(),
    }
}

fn resolve_number(cells: &[Cell], cell: usize) -> Result<Option<i32>, RowError> {
    for idx in candidates(cell) {
        let text = cells.get(idx).map_or("", |c| c.text.as_str());
        if text.is_empty() || text == NO_VALUE {
            continue;
        }
        return parse_number(text)
            .map(Some)
            .ok_or_else(|| RowError::InvalidNumber {
                cell: idx,
                text: text.to_string(),
            });
    }
    Ok(None)
}

fn weather_from_icon(src: &str) -> Result<WeatherCategory, RowError> {
    let token = icon_token_regex()
        .captures(src)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| RowError::IconPath(src.to_string()))?;
    Ok(token.as_str().parse()?)
}

fn resolve_weather(cells: &[Cell], cell: usize) -> Result<WeatherCategory, RowError> {
    for idx in candidates(cell) {
        let icons = cells.get(idx).map_or(&[][..], |c| c.icons.as_slice());
        match icons.len() {
            0 => return Ok(WeatherCategory::Clear),
            1..=MAX_ICONS => {
                let src = &icons[0];
                if src.ends_with(STILL_ICON) {
                    continue;
                }
                return weather_from_icon(src);
            }
            count => return Err(RowError::IconCount { cell: idx, count }),
        }
    }
    Ok(WeatherCategory::Clear)
}

/// Decodes a data row. The day must resolve; the temperature may be absent.
pub fn parse_row(cells: &[Cell]) -> Result<DayRecord, RowError> {
    if cells.len() <= WEATHER_CELL {
        return Err(RowError::TooFewCells {
            found: cells.len(),
            expected: WEATHER_CELL + 1,
        });
    }

    let day = resolve_number(cells, DAY_CELL)?.ok_or(RowError::MissingDay)?;
    let day = u32::try_from(day)
        .ok()
        .filter(|&d| d > 0)
        .ok_or_else(|| RowError::InvalidNumber {
            cell: DAY_CELL,
            text: day.to_string(),
        })?;

    Ok(DayRecord {
        day,
        temperature: resolve_number(cells, TEMPERATURE_CELL)?,
        weather: resolve_weather(cells, WEATHER_CELL)?,
    })
}
