//! demandcast-storage: the document-store seam of the relay.
//!
//! [`ForecastStore`] is the narrow interface the HTTP layer talks to
//! (`insert`, `find`, `count`, `find_by_id`); the query and metrics
//! logic never sees a concrete backend. Two backends ship here:
//! [`MemoryStore`] for tests and development, and [`JsonlStore`], an
//! append-only JSON-lines document file.

mod error;
mod id;
mod jsonl;
mod memory;
mod query;
mod record;
mod traits;

pub use error::StorageError;
pub use jsonl::JsonlStore;
pub use memory::MemoryStore;
pub use record::StoredForecast;
pub use traits::ForecastStore;
