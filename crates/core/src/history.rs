//! History-query semantics: eligibility window, search matching, and
//! pagination math.
//!
//! Backends translate [`HistoryFilter`] into whatever query language they
//! speak; the reference backends in `demandcast-storage` evaluate it with
//! [`HistoryFilter::matches`] directly.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::record::ForecastRecord;

/// Default look-back window, in days.
pub const DEFAULT_DAYS: i64 = 7;
/// Ceiling on the look-back window, in days (~100 years). Anything
/// larger is client nonsense and would overflow the duration math.
pub const MAX_DAYS: i64 = 36_500;
/// Default page size.
pub const DEFAULT_LIMIT: usize = 10;

/// Normalized history-query parameters.
///
/// All parameters are optional on the wire; [`HistoryQuery::new`] applies
/// the defaults (`days=7, search="", page=1, limit=10`), clamps `page`
/// and `limit` to at least 1, and clamps `days` to `0..=MAX_DAYS`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    pub days: i64,
    pub search: String,
    pub page: usize,
    pub limit: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        HistoryQuery::new(None, None, None, None)
    }
}

impl HistoryQuery {
    pub fn new(
        days: Option<i64>,
        search: Option<String>,
        page: Option<usize>,
        limit: Option<usize>,
    ) -> Self {
        HistoryQuery {
            days: days.unwrap_or(DEFAULT_DAYS).clamp(0, MAX_DAYS),
            search: search.unwrap_or_default(),
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).max(1),
        }
    }

    /// The store filter for this query, anchored at `now`.
    pub fn filter(&self, now: OffsetDateTime) -> HistoryFilter {
        HistoryFilter {
            since: now - Duration::hours(self.days * 24),
            search: self.search.clone(),
        }
    }

    /// Number of leading records to skip for the requested page.
    pub fn skip(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

/// Store-facing filter: eligibility cutoff plus an optional search needle.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryFilter {
    /// Records with `uploadedAt` at or after this instant are eligible.
    pub since: OffsetDateTime,
    /// Case-insensitive substring to match against `filename` or
    /// `metadata.model`. Empty string matches everything.
    pub search: String,
}

impl HistoryFilter {
    /// Evaluate the filter against one record.
    ///
    /// Records with an unparsable `uploadedAt` are never eligible.
    pub fn matches(&self, record: &ForecastRecord) -> bool {
        let uploaded = match record.uploaded_instant() {
            Some(instant) => instant,
            None => return false,
        };
        if uploaded < self.since {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }

        let needle = self.search.to_lowercase();
        if record.filename.to_lowercase().contains(&needle) {
            return true;
        }
        record
            .metadata
            .get("model")
            .and_then(|m| m.as_str())
            .is_some_and(|m| m.to_lowercase().contains(&needle))
    }
}

/// Pagination metadata returned alongside a history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Total records matching the filter, across all pages.
    pub total: u64,
    /// Total page count, `ceil(total / limit)`.
    pub pages: u64,
    /// The requested page (1-based).
    pub current: usize,
    pub limit: usize,
}

/// Pagination metadata for `total` matching records under `query`.
pub fn paginate(total: u64, query: &HistoryQuery) -> Pagination {
    Pagination {
        total,
        pages: total.div_ceil(query.limit as u64),
        current: query.page,
        limit: query.limit,
    }
}
