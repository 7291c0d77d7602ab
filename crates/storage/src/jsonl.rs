use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use demandcast_core::{ForecastRecord, HistoryFilter};

use crate::error::StorageError;
use crate::id::record_id;
use crate::query;
use crate::record::StoredForecast;
use crate::traits::ForecastStore;

/// Append-only JSON-lines document store: one `StoredForecast` per line.
///
/// The whole file is loaded at open time and kept in memory; inserts
/// append a line and update the in-memory view under the same write
/// lock, so readers never observe a half-written state. Corrupt lines
/// are skipped with a warning rather than failing startup.
pub struct JsonlStore {
    path: PathBuf,
    records: RwLock<Vec<StoredForecast>>,
    seq: AtomicU64,
}

impl JsonlStore {
    /// Open (or create on first insert) the document file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let mut records = Vec::new();
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                for (lineno, line) in contents.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<StoredForecast>(line) {
                        Ok(stored) => records.push(stored),
                        Err(e) => {
                            eprintln!(
                                "Warning: skipping corrupt record at {}:{}: {}",
                                path.display(),
                                lineno + 1,
                                e
                            );
                        }
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        }

        let seq = AtomicU64::new(records.len() as u64);
        Ok(JsonlStore {
            path,
            records: RwLock::new(records),
            seq,
        })
    }
}

#[async_trait]
impl ForecastStore for JsonlStore {
    async fn insert(&self, record: ForecastRecord) -> Result<StoredForecast, StorageError> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let stored = StoredForecast {
            id: record_id(&record, seq),
            record,
        };

        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        // Hold the write lock across the append so the file and the
        // in-memory view stay in step.
        let mut records = self.records.write().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StorageError::Io {
                path: self.path.display().to_string(),
                source: e,
            })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StorageError::Io {
                path: self.path.display().to_string(),
                source: e,
            })?;
        records.push(stored.clone());

        Ok(stored)
    }

    async fn find(
        &self,
        filter: &HistoryFilter,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<StoredForecast>, StorageError> {
        let records = self.records.read().await;
        Ok(query::page(&records, filter, skip, limit))
    }

    async fn count(&self, filter: &HistoryFilter) -> Result<u64, StorageError> {
        let records = self.records.read().await;
        Ok(query::count(&records, filter))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredForecast>, StorageError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|s| s.id == id).cloned())
    }
}
