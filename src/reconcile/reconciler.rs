//! Merges a post's primary and fallback diary stations into one day series.
//!
//! The primary station always wins for a day it reports. The fallback station is
//! read only when the primary month is missing or short, and then only fills the
//! days the primary lacks. If the primary published nothing, the fallback series
//! stands in for it entirely. Days neither station reports are left out.

use crate::diary::error::RowError;
use crate::diary::row_parser::parse_row;
use crate::reconcile::error::ReconcileError;
use crate::reconcile::source::MonthlySource;
use crate::types::day::{DayRecord, ReconciledDay};
use crate::types::post::Post;
use crate::utils::days_in_month;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

type DaySeries = BTreeMap<u32, DayRecord>;

pub struct Reconciler<S> {
    source: S,
}

impl<S: MonthlySource> Reconciler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Builds the calendar-ordered weather series of `post` for one month.
    ///
    /// An empty result means neither station has data for the month.
    ///
    /// # Errors
    ///
    /// Any row that fails to decode aborts the whole month with
    /// [`ReconcileError::Format`] or [`ReconcileError::Parse`], naming the primary
    /// and (if configured) fallback pages. Fetch failures surface as
    /// [`ReconcileError::Diary`].
    pub async fn reconcile(
        &self,
        post: &Post,
        year: i32,
        month: u32,
    ) -> Result<Vec<ReconciledDay>, ReconcileError> {
        let days_in_month =
            days_in_month(year, month).ok_or(ReconcileError::InvalidMonth { year, month })?;

        let mut sources = vec![self.source.source_url(&post.station_id, year, month)];
        if let Some(fallback) = &post.fallback {
            sources.push(self.source.source_url(&fallback.station_id, year, month));
        }

        let primary = self
            .load_month(&post.station_id, year, month, days_in_month, &sources)
            .await?;

        let needs_fallback = match &primary {
            None => true,
            Some(series) => series.len() < days_in_month as usize && post.fallback.is_some(),
        };

        let mut location = post.location;
        let mut fallback_location = None;
        let mut gap_fill = DaySeries::new();

        let primary = match (&post.fallback, needs_fallback) {
            (Some(fallback), true) => {
                info!(
                    "Post {} {}-{:02}: reading fallback station {}",
                    post.id, year, month, fallback.station_id
                );
                fallback_location = Some(fallback.location);
                let secondary = self
                    .load_month(&fallback.station_id, year, month, days_in_month, &sources)
                    .await?;
                match (primary, secondary) {
                    (None, None) => {
                        info!("Post {} {}-{:02}: no data in either station", post.id, year, month);
                        return Ok(Vec::new());
                    }
                    (Some(series), None) => series,
                    (Some(series), Some(secondary)) => {
                        gap_fill = secondary;
                        series
                    }
                    (None, Some(secondary)) => {
                        info!(
                            "Post {} {}-{:02}: primary station empty, using fallback series",
                            post.id, year, month
                        );
                        location = fallback.location;
                        secondary
                    }
                }
            }
            _ => match primary {
                Some(series) => series,
                None => {
                    info!("Post {} {}-{:02}: no data published", post.id, year, month);
                    return Ok(Vec::new());
                }
            },
        };

        let is_fallback = post.flag_as_fallback || fallback_location == Some(location);

        let mut days = Vec::with_capacity(days_in_month as usize);
        for day in 1..=days_in_month {
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
                continue;
            };
            if let Some(record) = primary.get(&day) {
                days.push(ReconciledDay {
                    date,
                    location,
                    temperature: record.temperature,
                    weather: record.weather,
                    is_fallback,
                });
            } else if let (Some(fallback_location), Some(record)) =
                (fallback_location, gap_fill.get(&day))
            {
                days.push(ReconciledDay {
                    date,
                    location: fallback_location,
                    temperature: record.temperature,
                    weather: record.weather,
                    is_fallback: true,
                });
            } else {
                debug!("Post {}: {} missing from every station, skipped", post.id, date);
            }
        }
        Ok(days)
    }

    /// Decodes a station's month, keyed by day. `None` if nothing was published.
    async fn load_month(
        &self,
        station_id: &str,
        year: i32,
        month: u32,
        days_in_month: u32,
        sources: &[String],
    ) -> Result<Option<DaySeries>, ReconcileError> {
        let table = self.source.fetch_month(station_id, year, month).await?;
        let rows = table.data_rows();
        if rows.is_empty() {
            return Ok(None);
        }

        let mut series = DaySeries::new();
        for cells in &rows {
            let record = parse_row(cells).map_err(|e| ReconcileError::from_row(e, sources))?;
            if record.day > days_in_month {
                return Err(ReconcileError::from_row(
                    RowError::DayOutOfRange {
                        day: record.day,
                        days_in_month,
                    },
                    sources,
                ));
            }
            match series.entry(record.day) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(_) => warn!(
                    "Station {} {}-{:02}: duplicate row for day {} ignored",
                    station_id, year, month, record.day
                ),
            }
        }
        Ok(Some(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diary::error::DiaryError;
    use crate::diary::fixtures::{diary_page, icon, month_page, row};
    use crate::diary::monthly_table::MonthlyTable;
    use crate::reconcile::source::MemorySource;
    use crate::types::post::{Fallback, LatLon};
    use crate::types::weather_category::WeatherCategory;
    use chrono::Datelike;
    use std::sync::Mutex;

    const PRIMARY: &str = "4015";
    const SECONDARY: &str = "158155";
    const POST_AT: LatLon = LatLon(59.38, 28.19);
    const FALLBACK_AT: LatLon = LatLon(59.5, 28.0);

    fn post(with_fallback: bool) -> Post {
        Post {
            id: "75163".to_string(),
            name: "Kerbo".to_string(),
            location: POST_AT,
            station_id: PRIMARY.to_string(),
            fallback: with_fallback.then(|| Fallback {
                station_id: SECONDARY.to_string(),
                location: FALLBACK_AT,
            }),
            flag_as_fallback: false,
        }
    }

    fn table(days: impl IntoIterator<Item = u32>, temperature: i32) -> MonthlyTable {
        MonthlyTable::Table(month_page(days, temperature))
    }

    /// Records which stations were asked for.
    struct CountingSource {
        inner: MemorySource,
        fetched: Mutex<Vec<String>>,
    }

    impl MonthlySource for CountingSource {
        fn source_url(&self, station_id: &str, year: i32, month: u32) -> String {
            self.inner.source_url(station_id, year, month)
        }

        async fn fetch_month(
            &self,
            station_id: &str,
            year: i32,
            month: u32,
        ) -> Result<MonthlyTable, DiaryError> {
            self.fetched.lock().unwrap().push(station_id.to_string());
            self.inner.fetch_month(station_id, year, month).await
        }
    }

    #[tokio::test]
    async fn fills_interior_gap_from_fallback() {
        // October 2015 has 31 days; the primary misses 18-20 and neither reports 31.
        let source = MemorySource::new()
            .with_table(PRIMARY, 2015, 10, table((1..=17).chain(21..=30), 10))
            .with_table(SECONDARY, 2015, 10, table(1..=30, -5));
        let days = Reconciler::new(source)
            .reconcile(&post(true), 2015, 10)
            .await
            .unwrap();

        assert_eq!(days.len(), 30);
        for d in &days {
            let day = d.date.day();
            if (18..=20).contains(&day) {
                assert!(d.is_fallback, "day {day} should come from the fallback");
                assert_eq!(d.location, FALLBACK_AT);
                assert_eq!(d.temperature, Some(-5));
            } else {
                assert!(!d.is_fallback, "day {day} should come from the primary");
                assert_eq!(d.location, POST_AT);
                assert_eq!(d.temperature, Some(10));
            }
        }
        assert!(days.iter().all(|d| d.date.day() != 31));
    }

    #[tokio::test]
    async fn output_is_strictly_ascending_with_matching_dates() {
        let source = MemorySource::new()
            .with_table(PRIMARY, 2016, 2, table([9, 2, 5, 1], 1))
            .with_table(SECONDARY, 2016, 2, table([3, 4, 29], 2));
        let days = Reconciler::new(source)
            .reconcile(&post(true), 2016, 2)
            .await
            .unwrap();

        let numbers: Vec<u32> = days.iter().map(|d| d.date.day()).collect();
        assert_eq!(numbers, [1, 2, 3, 4, 5, 9, 29]);
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));
        assert!(days.iter().all(|d| d.date.year() == 2016 && d.date.month() == 2));
    }

    #[tokio::test]
    async fn primary_days_are_never_overridden() {
        let primary = diary_page(&[
            row("1", "+1", &icon("rain"), "", ""),
            row("2", "−", "", "", ""),
            row("4", "+4", &icon("storm"), "", ""),
        ]);
        let secondary = diary_page(
            &(1..=30)
                .map(|d| row(&d.to_string(), "-20", &icon("snow"), "", ""))
                .collect::<Vec<_>>(),
        );
        let source = MemorySource::new()
            .with_table(PRIMARY, 2019, 4, MonthlyTable::Table(primary))
            .with_table(SECONDARY, 2019, 4, MonthlyTable::Table(secondary));
        let days = Reconciler::new(source)
            .reconcile(&post(true), 2019, 4)
            .await
            .unwrap();

        assert_eq!(days.len(), 30);
        let by_day = |n: u32| days.iter().find(|d| d.date.day() == n).unwrap();
        assert_eq!((by_day(1).temperature, by_day(1).weather), (Some(1), WeatherCategory::Rain));
        assert_eq!((by_day(2).temperature, by_day(2).weather), (None, WeatherCategory::Clear));
        assert_eq!((by_day(4).temperature, by_day(4).weather), (Some(4), WeatherCategory::Storm));
        assert!(!by_day(2).is_fallback);
        assert_eq!(by_day(3).weather, WeatherCategory::Snow);
        assert!(by_day(3).is_fallback);
    }

    #[tokio::test]
    async fn explicit_no_data_without_fallback_is_empty() {
        let source = MemorySource::new().with_table(PRIMARY, 2018, 7, MonthlyTable::NoData);
        let days = Reconciler::new(source)
            .reconcile(&post(false), 2018, 7)
            .await
            .unwrap();
        assert!(days.is_empty());
    }

    #[tokio::test]
    async fn both_stations_empty_is_empty() {
        let days = Reconciler::new(MemorySource::new())
            .reconcile(&post(true), 2018, 7)
            .await
            .unwrap();
        assert!(days.is_empty());
    }

    #[tokio::test]
    async fn empty_primary_promotes_fallback() {
        let source = MemorySource::new().with_table(SECONDARY, 2015, 3, table(18..=31, 0));
        let days = Reconciler::new(source)
            .reconcile(&post(true), 2015, 3)
            .await
            .unwrap();

        assert_eq!(days.len(), 14);
        assert!(days.iter().all(|d| d.is_fallback && d.location == FALLBACK_AT));
    }

    #[tokio::test]
    async fn complete_primary_skips_fallback() {
        let source = CountingSource {
            inner: MemorySource::new().with_table(PRIMARY, 2015, 9, table(1..=30, 3)),
            fetched: Mutex::new(Vec::new()),
        };
        let reconciler = Reconciler::new(source);
        let days = reconciler.reconcile(&post(true), 2015, 9).await.unwrap();

        assert_eq!(days.len(), 30);
        assert!(days.iter().all(|d| !d.is_fallback && d.location == POST_AT));
        assert_eq!(*reconciler.source().fetched.lock().unwrap(), [PRIMARY]);
    }

    #[tokio::test]
    async fn short_primary_without_fallback_keeps_gaps() {
        let source = MemorySource::new().with_table(PRIMARY, 2015, 9, table(1..=19, 3));
        let days = Reconciler::new(source)
            .reconcile(&post(false), 2015, 9)
            .await
            .unwrap();
        assert_eq!(days.len(), 19);
    }

    #[tokio::test]
    async fn empty_fallback_keeps_primary() {
        let source = MemorySource::new()
            .with_table(PRIMARY, 2015, 10, table(1..=28, 3))
            .with_table(SECONDARY, 2015, 10, MonthlyTable::NoData);
        let days = Reconciler::new(source)
            .reconcile(&post(true), 2015, 10)
            .await
            .unwrap();
        assert_eq!(days.len(), 28);
        assert!(days.iter().all(|d| !d.is_fallback));
    }

    #[tokio::test]
    async fn trailing_gap_is_filled() {
        let source = MemorySource::new()
            .with_table(PRIMARY, 2015, 10, table(1..=28, 3))
            .with_table(SECONDARY, 2015, 10, table(1..=31, 7));
        let days = Reconciler::new(source)
            .reconcile(&post(true), 2015, 10)
            .await
            .unwrap();
        assert_eq!(days.len(), 31);
        assert!(days[28..].iter().all(|d| d.is_fallback && d.temperature == Some(7)));
    }

    #[tokio::test]
    async fn leading_gap_is_filled() {
        let source = MemorySource::new()
            .with_table(PRIMARY, 2015, 10, table(5..=31, 3))
            .with_table(SECONDARY, 2015, 10, table(1..=4, 7));
        let days = Reconciler::new(source)
            .reconcile(&post(true), 2015, 10)
            .await
            .unwrap();

        assert_eq!(days.len(), 31);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2015, 10, 1).unwrap());
        for d in &days[..4] {
            assert!(d.is_fallback);
            assert_eq!(d.location, FALLBACK_AT);
            assert_eq!(d.temperature, Some(7));
        }
        for d in &days[4..] {
            assert!(!d.is_fallback);
            assert_eq!(d.location, POST_AT);
            assert_eq!(d.temperature, Some(3));
        }
    }

    #[tokio::test]
    async fn flagged_post_tags_every_day() {
        let mut flagged = post(false);
        flagged.flag_as_fallback = true;
        let source = MemorySource::new().with_table(PRIMARY, 2020, 1, table(1..=31, -8));
        let days = Reconciler::new(source)
            .reconcile(&flagged, 2020, 1)
            .await
            .unwrap();
        assert_eq!(days.len(), 31);
        assert!(days.iter().all(|d| d.is_fallback && d.location == POST_AT));
    }

    #[tokio::test]
    async fn bad_row_names_both_pages() {
        let primary = diary_page(&[row("1", "+1", "", "", ""), row("2a", "", "", "", "")]);
        let source = MemorySource::new()
            .with_table(PRIMARY, 2015, 10, MonthlyTable::Table(primary))
            .with_table(SECONDARY, 2015, 10, table(1..=31, 0));
        let err = Reconciler::new(source)
            .reconcile(&post(true), 2015, 10)
            .await
            .unwrap_err();

        match &err {
            ReconcileError::Parse { sources, source } => {
                assert_eq!(
                    *source,
                    RowError::InvalidNumber {
                        cell: 0,
                        text: "2a".to_string()
                    }
                );
                assert_eq!(
                    *sources,
                    ["memory://4015/2015/10/", "memory://158155/2015/10/"]
                );
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        let message = err.to_string();
        assert!(message.contains("memory://4015/2015/10/"));
        assert!(message.contains("memory://158155/2015/10/"));
    }

    #[tokio::test]
    async fn bad_fallback_row_is_fatal() {
        let secondary = diary_page(&[row("1", "0", &format!("{0}{0}{0}", icon("rain")), "", "")]);
        let source = MemorySource::new()
            .with_table(PRIMARY, 2015, 10, table(2..=31, 0))
            .with_table(SECONDARY, 2015, 10, MonthlyTable::Table(secondary));
        let err = Reconciler::new(source)
            .reconcile(&post(true), 2015, 10)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Format {
                source: RowError::IconCount { count: 6, .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn day_beyond_month_end_is_rejected() {
        let source = MemorySource::new().with_table(PRIMARY, 2021, 2, table([1, 30], 0));
        let err = Reconciler::new(source)
            .reconcile(&post(false), 2021, 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Parse {
                source: RowError::DayOutOfRange { day: 30, days_in_month: 28 },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn duplicate_day_keeps_first_row() {
        let primary = diary_page(&[
            row("1", "+1", "", "", ""),
            row("1", "+9", "", "", ""),
        ]);
        let source = MemorySource::new().with_table(PRIMARY, 2015, 10, MonthlyTable::Table(primary));
        let days = Reconciler::new(source)
            .reconcile(&post(false), 2015, 10)
            .await
            .unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].temperature, Some(1));
    }

    #[tokio::test]
    async fn rejects_invalid_month() {
        let err = Reconciler::new(MemorySource::new())
            .reconcile(&post(false), 2015, 13)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidMonth { year: 2015, month: 13 }));
    }
}
