use crate::diary::error::DiaryError;
use crate::diary::monthly_table::{classify_page, MonthlyPage, MonthlyTable};
use crate::diary::source_cache::{CacheKey, SourceCache};
use log::{info, warn};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_DIARY_URL: &str = "https://www.gismeteo.ru/diary";

/// Pause after every remote request, whether it succeeded or not.
pub const DEFAULT_THROTTLE: Duration = Duration::from_secs(1);

// The diary refuses clients that do not look like a browser.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/102.0.5005.63 Safari/537.36";

/// Loads monthly diary tables, from the [`SourceCache`] when possible.
pub struct TableFetcher {
    cache: SourceCache,
    client: Client,
    base_url: String,
    throttle: Duration,
}

impl TableFetcher {
    pub fn new(cache_dir: &Path, base_url: &str, throttle: Duration) -> Result<Self, DiaryError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(DiaryError::ClientBuild)?;
        Ok(Self {
            cache: SourceCache::new(cache_dir),
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            throttle,
        })
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    pub fn source_url(&self, station_id: &str, year: i32, month: u32) -> String {
        format!("{}/{}/{}/{}/", self.base_url, station_id, year, month)
    }

    /// Returns the month's table, or [`MonthlyTable::NoData`] when the diary says
    /// the station published nothing. Both outcomes are cached; failures are not.
    pub async fn fetch(
        &self,
        station_id: &str,
        year: i32,
        month: u32,
    ) -> Result<MonthlyTable, DiaryError> {
        let key = CacheKey::new(station_id, year, month);

        match self.cache.lookup(&key).await {
            Some(content) => match classify_page(&content) {
                Some(page) => {
                    info!("Cache hit for station {} {}-{:02}", station_id, year, month);
                    return Ok(page.into_table());
                }
                None => warn!(
                    "Cache entry {:?} holds neither a table nor a no-data marker, fetching again",
                    self.cache.path_for(&key)
                ),
            },
            None => warn!(
                "Cache miss for station {} {}-{:02}. Downloading.",
                station_id, year, month
            ),
        }

        let url = self.source_url(station_id, year, month);
        let body = self.download(&url).await?;
        let page = classify_page(&body).ok_or_else(|| DiaryError::UnexpectedLayout {
            url: url.clone(),
            message: "page holds neither a data table nor a no-data marker".to_string(),
        })?;

        if let MonthlyPage::NoData(_) = page {
            info!("No observations published at {}", url);
        }
        self.cache.store(&key, page.fragment()).await?;
        info!("Cached {} to {:?}", url, self.cache.path_for(&key));
        Ok(page.into_table())
    }

    async fn download(&self, url: &str) -> Result<String, DiaryError> {
        info!("Downloading diary page {}", url);
        let result = self.request(url).await;
        tokio::time::sleep(self.throttle).await;
        result
    }

    async fn request(&self, url: &str) -> Result<String, DiaryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DiaryError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    DiaryError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    DiaryError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        response
            .text()
            .await
            .map_err(|e| DiaryError::NetworkRequest(url.to_string(), e))
    }
}
