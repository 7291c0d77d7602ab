//! Post-hoc accuracy metrics over a stored forecast.
//!
//! A prediction is *completed* once its calendar day has started relative
//! to the evaluation instant (midnight UTC strictly before `now`). Each
//! completed prediction is checked against the historical observation for
//! the same calendar day, when one exists.
//!
//! Denominator semantics are inherited from the original service and kept
//! for output compatibility: both averages divide by the count of
//! *completed* predictions, not the count of *matched* pairs, so a
//! completed prediction without a same-day observation dilutes both
//! metrics toward zero. See DESIGN.md before "fixing" this.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::record::{parse_day, ForecastRecord};

/// Accuracy summary for one forecast record at a given evaluation instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Mean absolute percentage error over completed predictions, in
    /// percent. Zero when nothing has completed.
    pub mape: f64,
    /// Root mean squared error over completed predictions. Zero when
    /// nothing has completed.
    pub rmse: f64,
    /// Number of predictions whose day lies strictly before `now`.
    pub completed: usize,
    /// Total number of predictions in the record.
    pub total: usize,
}

/// Compute MAPE/RMSE for `record` as of `now`.
///
/// Never fails: empty series, unparsable dates, and zero-valued actuals
/// all degrade the result toward zeros rather than erroring.
pub fn compute_metrics(record: &ForecastRecord, now: OffsetDateTime) -> ForecastMetrics {
    let total = record.predictions.len();

    let mut completed = 0usize;
    let mut pct_error_sum = 0.0f64;
    let mut sq_error_sum = 0.0f64;

    for prediction in &record.predictions {
        let day = match parse_day(&prediction.date) {
            Some(d) => d,
            None => continue,
        };
        if day.midnight().assume_utc() >= now {
            continue;
        }
        completed += 1;

        // First historical observation on the same calendar day, if any.
        let actual = record
            .historical
            .iter()
            .find(|h| parse_day(&h.date) == Some(day))
            .map(|h| h.value);

        let actual = match actual {
            Some(a) => a,
            None => continue,
        };

        // Zero or non-finite actuals are skipped entirely (inherited
        // policy: they contribute to neither sum).
        if actual == 0.0 || !actual.is_finite() {
            continue;
        }

        pct_error_sum += (actual - prediction.value).abs() / actual;
        sq_error_sum += (actual - prediction.value) * (actual - prediction.value);
    }

    let (mape, rmse) = if completed == 0 {
        (0.0, 0.0)
    } else {
        (
            pct_error_sum / completed as f64 * 100.0,
            (sq_error_sum / completed as f64).sqrt(),
        )
    };

    ForecastMetrics {
        mape,
        rmse,
        completed,
        total,
    }
}
