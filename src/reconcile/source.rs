//! Where reconciliation reads monthly tables from.

use crate::diary::error::DiaryError;
use crate::diary::monthly_table::MonthlyTable;
use crate::diary::source_cache::CacheKey;
use crate::diary::table_fetcher::TableFetcher;
use std::collections::HashMap;
use std::future::Future;

/// A provider of monthly diary tables keyed by station id.
pub trait MonthlySource {
    /// Human-readable location of a month, quoted in errors so the page can be inspected.
    fn source_url(&self, station_id: &str, year: i32, month: u32) -> String;

    fn fetch_month(
        &self,
        station_id: &str,
        year: i32,
        month: u32,
    ) -> impl Future<Output = Result<MonthlyTable, DiaryError>> + Send;
}

impl MonthlySource for TableFetcher {
    fn source_url(&self, station_id: &str, year: i32, month: u32) -> String {
        TableFetcher::source_url(self, station_id, year, month)
    }

    async fn fetch_month(
        &self,
        station_id: &str,
        year: i32,
        month: u32,
    ) -> Result<MonthlyTable, DiaryError> {
        self.fetch(station_id, year, month).await
    }
}

/// Tables held in memory. Months that were never inserted read as [`MonthlyTable::NoData`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<CacheKey, MonthlyTable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, station_id: &str, year: i32, month: u32, table: MonthlyTable) {
        self.tables
            .insert(CacheKey::new(station_id, year, month), table);
    }

    pub fn with_table(mut self, station_id: &str, year: i32, month: u32, table: MonthlyTable) -> Self {
        self.insert(station_id, year, month, table);
        self
    }
}

impl MonthlySource for MemorySource {
    fn source_url(&self, station_id: &str, year: i32, month: u32) -> String {
        format!("memory://{}/{}/{}/", station_id, year, month)
    }

    async fn fetch_month(
        &self,
        station_id: &str,
        year: i32,
        month: u32,
    ) -> Result<MonthlyTable, DiaryError> {
        Ok(self
            .tables
            .get(&CacheKey::new(station_id, year, month))
            .cloned()
            .unwrap_or(MonthlyTable::NoData))
    }
}
