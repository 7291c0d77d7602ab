//! Forecast record model and upstream wire mapping.
//!
//! Dates are carried as strings: per-point dates as calendar days
//! (`YYYY-MM-DD`, the forecaster's wire format) and `uploadedAt` as an
//! RFC 3339 instant. Parsing happens at the point of comparison.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// One observed point of the uploaded input series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub value: f64,
}

/// One forecasted point with its uncertainty interval.
///
/// `lower <= value <= upper` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    /// Calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// One completed forecasting run, as persisted by the relay.
///
/// Created once when a relay call succeeds; never mutated thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Original upload name.
    pub filename: String,
    /// RFC 3339 creation timestamp, immutable.
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: String,
    /// Observed input series, chronological.
    pub historical: Vec<HistoricalPoint>,
    /// Forecasted series, chronological; conceptually extends beyond the
    /// end of `historical`.
    pub predictions: Vec<PredictionPoint>,
    /// Open auxiliary mapping (model name, requested period/interval).
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ForecastRecord {
    /// Map the forecaster's response body into a record to persist.
    ///
    /// Upstream shape: `{historical: [{date, y}], predictions: [{date,
    /// yhat, yhat_lower, yhat_upper}], model: {...}}`. Points missing a
    /// date or value are dropped rather than failing the whole mapping.
    /// The model *name* lands in `metadata.model` (the searchable field);
    /// the upstream model object is kept under `metadata.model_params`.
    pub fn from_upstream(
        filename: &str,
        body: &serde_json::Value,
        period: &str,
        interval: &str,
        uploaded_at: String,
    ) -> Self {
        let historical = body
            .get("historical")
            .and_then(|h| h.as_array())
            .map(|points| {
                points
                    .iter()
                    .filter_map(|p| {
                        Some(HistoricalPoint {
                            date: p.get("date")?.as_str()?.to_string(),
                            value: p.get("y")?.as_f64()?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let predictions = body
            .get("predictions")
            .and_then(|p| p.as_array())
            .map(|points| {
                points
                    .iter()
                    .filter_map(|p| {
                        Some(PredictionPoint {
                            date: p.get("date")?.as_str()?.to_string(),
                            value: p.get("yhat")?.as_f64()?,
                            lower: p.get("yhat_lower").and_then(|v| v.as_f64()).unwrap_or(0.0),
                            upper: p.get("yhat_upper").and_then(|v| v.as_f64()).unwrap_or(0.0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut metadata = serde_json::Map::new();
        metadata.insert("model".to_string(), serde_json::json!("prophet"));
        if let Some(params) = body.get("model") {
            metadata.insert("model_params".to_string(), params.clone());
        }
        metadata.insert("period".to_string(), serde_json::json!(period));
        metadata.insert("interval".to_string(), serde_json::json!(interval));

        ForecastRecord {
            filename: filename.to_string(),
            uploaded_at,
            historical,
            predictions,
            metadata,
        }
    }

    /// The record's creation instant, if `uploadedAt` parses as RFC 3339.
    pub fn uploaded_instant(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.uploaded_at, &Rfc3339).ok()
    }
}

/// Parse the calendar day from a point's date string.
///
/// Accepts bare `YYYY-MM-DD` as well as longer timestamps that start with
/// one (only the day prefix is compared).
pub fn parse_day(raw: &str) -> Option<Date> {
    let prefix = raw.get(..10)?;
    Date::parse(prefix, format_description!("[year]-[month]-[day]")).ok()
}

/// Format an instant as RFC 3339, matching the stored `uploadedAt` shape.
pub fn format_timestamp(instant: OffsetDateTime) -> String {
    instant
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parse_day_accepts_bare_dates_and_timestamps() {
        let day = parse_day("2023-01-02").unwrap();
        assert_eq!((day.year(), day.month() as u8, day.day()), (2023, 1, 2));
        assert_eq!(parse_day("2023-01-02T09:30:00Z"), parse_day("2023-01-02"));
        assert!(parse_day("n/a").is_none());
        assert!(parse_day("2023-1-2").is_none());
    }

    #[test]
    fn from_upstream_maps_wire_fields() {
        let body = serde_json::json!({
            "historical": [
                {"date": "2023-01-01", "y": 10.0},
                {"date": "2023-01-02", "y": 15.0},
            ],
            "predictions": [
                {"date": "2023-01-03", "yhat": 12.5, "yhat_lower": 9.0, "yhat_upper": 16.0},
            ],
            "model": {"interval_width": 0.9},
        });

        let record = ForecastRecord::from_upstream(
            "sales.csv",
            &body,
            "7",
            "0.9",
            format_timestamp(datetime!(2023-01-02 12:00 UTC)),
        );

        assert_eq!(record.filename, "sales.csv");
        assert_eq!(record.historical.len(), 2);
        assert_eq!(record.historical[1].value, 15.0);
        assert_eq!(record.predictions.len(), 1);
        assert_eq!(record.predictions[0].lower, 9.0);
        assert_eq!(record.metadata["model"], "prophet");
        assert_eq!(record.metadata["model_params"]["interval_width"], 0.9);
        assert_eq!(record.metadata["period"], "7");
        assert!(record.uploaded_instant().is_some());
    }

    #[test]
    fn from_upstream_drops_malformed_points() {
        let body = serde_json::json!({
            "historical": [
                {"date": "2023-01-01", "y": 10.0},
                {"date": "2023-01-02"},
                {"y": 4.0},
            ],
            "predictions": [{"date": "2023-01-03", "yhat": "not-a-number"}],
        });

        let record =
            ForecastRecord::from_upstream("x.csv", &body, "7", "0.9", "2023-01-02T00:00:00Z".into());
        assert_eq!(record.historical.len(), 1);
        assert!(record.predictions.is_empty());
    }

    #[test]
    fn serde_uses_wire_field_names() {
        let record = ForecastRecord {
            filename: "a.csv".into(),
            uploaded_at: "2023-01-01T00:00:00Z".into(),
            historical: vec![],
            predictions: vec![],
            metadata: serde_json::Map::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["uploadedAt"], "2023-01-01T00:00:00Z");
        let back: ForecastRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
