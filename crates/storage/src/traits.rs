use async_trait::async_trait;

use demandcast_core::{ForecastRecord, HistoryFilter};

use crate::error::StorageError;
use crate::record::StoredForecast;

/// The document-store interface for forecast records.
///
/// Everything above this trait (history queries, metrics, the relay) is
/// backend-agnostic; swapping the document store means implementing these
/// four methods and nothing else.
///
/// ## Ordering
///
/// `find` returns records in descending `uploadedAt` order (most recent
/// first). `skip`/`limit` are applied after filtering and ordering.
///
/// ## Thread safety
///
/// Implementations must be `Send + Sync + 'static` to be shared through
/// axum application state as `Arc<dyn ForecastStore>`.
#[async_trait]
pub trait ForecastStore: Send + Sync + 'static {
    /// Persist a new record, returning it together with its assigned id.
    async fn insert(&self, record: ForecastRecord) -> Result<StoredForecast, StorageError>;

    /// Return one page of matching records, ordered most recent first.
    async fn find(
        &self,
        filter: &HistoryFilter,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<StoredForecast>, StorageError>;

    /// Count all records matching the filter, across pages.
    async fn count(&self, filter: &HistoryFilter) -> Result<u64, StorageError>;

    /// Look up one record by its store id.
    async fn find_by_id(&self, id: &str) -> Result<Option<StoredForecast>, StorageError>;
}
