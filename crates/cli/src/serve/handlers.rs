//! HTTP route handlers: health, forecast relay, history, record metrics.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use time::OffsetDateTime;

use demandcast_core::record::format_timestamp;
use demandcast_core::{compute_metrics, paginate, ForecastRecord, HistoryQuery};

use super::client::UpstreamReply;
use super::json_error;
use super::state::AppState;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /api/health
pub(crate) async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"ok": true})))
}

/// Sanitize an upload filename for use in a temp directory.
///
/// Rejects filenames with path separators or `..` components and
/// replaces whitespace runs, returning `upload.csv` for invalid or
/// missing names. Only the temp path uses the sanitized name; the
/// original name is what gets persisted and forwarded.
fn sanitize_filename(raw: Option<&str>) -> String {
    let name = match raw {
        Some(n) if !n.is_empty() => n,
        _ => return "upload.csv".to_string(),
    };

    // Reject path separators and parent directory references
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return "upload.csv".to_string();
    }

    let name = name.split_whitespace().collect::<Vec<_>>().join("_");
    if name.is_empty() {
        return "upload.csv".to_string();
    }
    name
}

/// POST /api/forecast
///
/// Multipart fields: `file` (required CSV), `period` (default "7"),
/// `interval` (default "0.9"). The file and both parameters are
/// forwarded to the external forecaster unchanged. On upstream success
/// the JSON response and status code come back verbatim, with the run
/// persisted as a side effect; any failure becomes the 500 envelope
/// `{error, detail}`.
pub(crate) async fn handle_forecast(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file: Option<(String, axum::body::Bytes)> = None;
    let mut period = "7".to_string();
    let mut interval = "0.9".to_string();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(_) => {
                return json_error(StatusCode::BAD_REQUEST, "invalid multipart payload")
                    .into_response()
            }
        };

        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "upload.csv".to_string());
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, bytes)),
                    Err(_) => {
                        return json_error(StatusCode::BAD_REQUEST, "could not read uploaded file")
                            .into_response()
                    }
                }
            }
            Some("period") => {
                if let Ok(text) = field.text().await {
                    period = text;
                }
            }
            Some("interval") => {
                if let Ok(text) = field.text().await {
                    interval = text;
                }
            }
            _ => {}
        }
    }

    // No upstream call is made for a missing file.
    let (original_name, csv_bytes) = match file {
        Some(f) => f,
        None => {
            return json_error(StatusCode::BAD_REQUEST, "CSV file required (field name: file)")
                .into_response()
        }
    };

    let client = state.forecaster.clone();
    let upstream_name = original_name.clone();
    let tmp_name = sanitize_filename(Some(&original_name));
    let (fwd_period, fwd_interval) = (period.clone(), interval.clone());

    let result = tokio::task::spawn_blocking(move || {
        let tmp_dir = tempfile::tempdir()?;
        let tmp_path = tmp_dir.path().join(&tmp_name);
        std::fs::write(&tmp_path, &csv_bytes)?;
        // tmp_dir drops on every exit path below; cleanup failures are
        // swallowed by TempDir's best-effort Drop.
        client.forecast(&tmp_path, &upstream_name, &fwd_period, &fwd_interval)
    })
    .await;

    let reply: UpstreamReply = match result {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            eprintln!("Error forwarding to forecast service: {}", e);
            let body = serde_json::json!({
                "error": "Forecasting failed",
                "detail": e.to_string(),
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
        Err(e) => {
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("task join error: {}", e),
            )
            .into_response()
        }
    };

    // A forecaster-side failure (non-2xx) becomes the generic failure
    // envelope, with the upstream body as the detail.
    if !reply.is_success() {
        eprintln!(
            "Error forwarding to forecast service: upstream status {}",
            reply.status
        );
        let body = serde_json::json!({
            "error": "Forecasting failed",
            "detail": reply.body,
        });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    }

    let record = ForecastRecord::from_upstream(
        &original_name,
        &reply.body,
        &period,
        &interval,
        format_timestamp(OffsetDateTime::now_utc()),
    );
    if let Err(e) = state.store.insert(record).await {
        eprintln!("Error persisting forecast: {}", e);
        let body = serde_json::json!({
            "error": "Forecasting failed",
            "detail": format!("could not persist forecast: {}", e),
        });
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
    (status, Json(reply.body)).into_response()
}

/// Query parameters for GET /api/forecasts. All optional.
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryParams {
    days: Option<i64>,
    search: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

/// GET /api/forecasts
pub(crate) async fn handle_list_forecasts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let query = HistoryQuery::new(params.days, params.search, params.page, params.limit);
    let filter = query.filter(OffsetDateTime::now_utc());

    let total = match state.store.count(&filter).await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error querying forecast history: {}", e);
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "could not query forecast history",
            )
            .into_response();
        }
    };
    let forecasts = match state.store.find(&filter, query.skip(), query.limit).await {
        Ok(page) => page,
        Err(e) => {
            eprintln!("Error querying forecast history: {}", e);
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "could not query forecast history",
            )
            .into_response();
        }
    };

    let response = serde_json::json!({
        "forecasts": forecasts,
        "pagination": paginate(total, &query),
    });
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /api/forecasts/{id}
///
/// One stored record, augmented with accuracy metrics computed as of now.
pub(crate) async fn handle_get_forecast(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let stored = match state.store.find_by_id(&id).await {
        Ok(Some(s)) => s,
        Ok(None) => {
            return json_error(StatusCode::NOT_FOUND, &format!("forecast '{}' not found", id))
                .into_response()
        }
        Err(e) => {
            eprintln!("Error loading forecast '{}': {}", id, e);
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "could not load forecast")
                .into_response();
        }
    };

    let metrics = compute_metrics(&stored.record, OffsetDateTime::now_utc());

    let mut body = match serde_json::to_value(&stored) {
        Ok(v) => v,
        Err(e) => {
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("could not serialize forecast: {}", e),
            )
            .into_response()
        }
    };
    if let Some(obj) = body.as_object_mut() {
        obj.insert("metrics".to_string(), serde_json::json!(metrics));
    }

    (StatusCode::OK, Json(body)).into_response()
}
