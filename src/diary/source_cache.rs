//! On-disk cache of raw diary pages, one file per (station, year, month).
//!
//! Published months never change, so entries have no expiry. Entries are written
//! to a temporary file and renamed into place so readers never see a partial file,
//! and writers for the same key are serialized.

use crate::diary::error::DiaryError;
use crate::types::post::sanitize_station_id;
use log::{debug, warn};
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;
use tokio::{fs, task};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub station_id: String,
    pub year: i32,
    pub month: u32,
}

impl CacheKey {
    pub fn new(station_id: &str, year: i32, month: u32) -> Self {
        Self {
            station_id: station_id.to_string(),
            year,
            month,
        }
    }

    /// `<station_id>/<year>-<month:02>.html`
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(sanitize_station_id(&self.station_id))
            .join(format!("{}-{:02}.html", self.year, self.month))
    }
}

pub struct SourceCache {
    root: PathBuf,
    write_locks: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl SourceCache {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Returns the cached content, or `None` on a miss.
    ///
    /// Entries that cannot be read or are not UTF-8 count as misses.
    pub async fn lookup(&self, key: &CacheKey) -> Option<String> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => {
                    debug!("Cache hit for {:?} at {:?}", key, path);
                    Some(content)
                }
                Err(_) => {
                    warn!("Cache entry {:?} is not valid UTF-8, ignoring it", path);
                    None
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    /// Writes `content` for `key`, replacing any previous entry.
    pub async fn store(&self, key: &CacheKey, content: &str) -> Result<(), DiaryError> {
        let lease = self.write_lock(key);
        let _guard = lease.lock.lock().await;

        let path = self.path_for(key);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| DiaryError::CacheDirCreation(dir.clone(), e))?;

        let content = content.to_owned();
        task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new_in(&dir)
                .map_err(|e| DiaryError::CacheWrite(path.clone(), e))?;
            temp_file
                .write_all(content.as_bytes())
                .map_err(|e| DiaryError::CacheWrite(path.clone(), e))?;
            temp_file
                .flush()
                .map_err(|e| DiaryError::CacheWrite(path.clone(), e))?;
            temp_file
                .persist(&path)
                .map_err(|e| DiaryError::CacheWrite(path.clone(), e.error))?;
            Ok::<(), DiaryError>(())
        })
        .await??;
        Ok(())
    }

    fn write_lock(&self, key: &CacheKey) -> WriteLease<'_> {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        WriteLease {
            cache: self,
            key: key.clone(),
            lock: locks.entry(key.clone()).or_default().clone(),
        }
    }
}

/// A per-key write lock; the map entry goes away with the last lease.
struct WriteLease<'a> {
    cache: &'a SourceCache,
    key: CacheKey,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for WriteLease<'_> {
    fn drop(&mut self) {
        let mut locks = self
            .cache
            .write_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.key);
        }
    }
}
