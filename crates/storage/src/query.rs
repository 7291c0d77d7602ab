//! Shared filter evaluation for the in-process backends.
//!
//! A real document database would translate [`HistoryFilter`] into its
//! own query language; the shipped backends hold records in memory and
//! evaluate the filter directly.

use demandcast_core::HistoryFilter;

use crate::record::StoredForecast;

/// Matching records, most recent first, with `skip`/`limit` applied.
pub(crate) fn page(
    records: &[StoredForecast],
    filter: &HistoryFilter,
    skip: usize,
    limit: usize,
) -> Vec<StoredForecast> {
    let mut matching: Vec<&StoredForecast> = records
        .iter()
        .filter(|s| filter.matches(&s.record))
        .collect();
    // matches() guarantees uploaded_instant() parses for every survivor.
    matching.sort_by_key(|s| std::cmp::Reverse(s.record.uploaded_instant()));
    matching
        .into_iter()
        .skip(skip)
        .take(limit)
        .cloned()
        .collect()
}

/// Count of matching records across all pages.
pub(crate) fn count(records: &[StoredForecast], filter: &HistoryFilter) -> u64 {
    records
        .iter()
        .filter(|s| filter.matches(&s.record))
        .count() as u64
}
