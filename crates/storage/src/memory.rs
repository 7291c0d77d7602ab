use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use demandcast_core::{ForecastRecord, HistoryFilter};

use crate::error::StorageError;
use crate::id::record_id;
use crate::query;
use crate::record::StoredForecast;
use crate::traits::ForecastStore;

/// In-memory backend for tests and development. Nothing survives a
/// restart.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<StoredForecast>>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl ForecastStore for MemoryStore {
    async fn insert(&self, record: ForecastRecord) -> Result<StoredForecast, StorageError> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let stored = StoredForecast {
            id: record_id(&record, seq),
            record,
        };
        self.records.write().await.push(stored.clone());
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
