//! demandcast-core: domain records and the testable core of the relay.
//!
//! Provides the forecast record model, the post-hoc accuracy metrics
//! calculator, and the history-query filter/pagination semantics. This
//! crate is pure: no I/O, no store, no HTTP.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`ForecastRecord`], [`HistoricalPoint`], [`PredictionPoint`] -- the
//!   stored forecast model
//! - [`compute_metrics()`] / [`ForecastMetrics`] -- MAPE/RMSE over
//!   completed predictions
//! - [`HistoryQuery`], [`HistoryFilter`], [`Pagination`] -- history
//!   retrieval contract

pub mod history;
pub mod metrics;
pub mod record;

pub use history::{paginate, HistoryFilter, HistoryQuery, Pagination};
pub use metrics::{compute_metrics, ForecastMetrics};
pub use record::{ForecastRecord, HistoricalPoint, PredictionPoint};
