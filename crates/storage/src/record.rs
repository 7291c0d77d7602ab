use serde::{Deserialize, Serialize};

use demandcast_core::ForecastRecord;

/// A persisted forecast: the store-assigned lookup id plus the record.
///
/// Serializes flat, so clients see `{id, filename, uploadedAt, ...}` --
/// the id is the only store-internal field exposed, and only because it
/// is the lookup handle for `GET /api/forecasts/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredForecast {
    pub id: String,
    #[serde(flatten)]
    pub record: ForecastRecord,
}
