//! `demandcast serve` -- the HTTP relay server.
//!
//! Exposes the forecast relay, history queries, and accuracy metrics as an
//! async HTTP service using `axum` + `tokio`. Supports concurrent request
//! handling; the only shared mutable state is the document store and the
//! rate limiter.
//!
//! Security features:
//! - CORS headers on all responses (permissive for local dev)
//! - Per-IP rate limiting (default: 60 req/min, configurable)
//! - Optional API key authentication via DEMANDCAST_API_KEY env var
//!
//! Endpoints:
//! - GET  /api/health           - Liveness probe (exempt from auth)
//! - POST /api/forecast         - Relay a CSV upload to the forecaster
//! - GET  /api/forecasts        - Paged forecast history
//! - GET  /api/forecasts/{id}   - One record plus accuracy metrics
//!
//! All responses use Content-Type: application/json.

mod client;
mod handlers;
mod middleware;
mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use demandcast_storage::{ForecastStore, JsonlStore};

use self::client::ForecastClient;
use self::handlers::{
    handle_forecast, handle_get_forecast, handle_health, handle_list_forecasts, handle_not_found,
};
use self::middleware::{auth_middleware, rate_limit_middleware};
use self::state::{AppState, RateLimiter};

/// Maximum request body size: 10 MB (covers the CSV upload).
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Fixed ceiling on one upstream forecaster call: 5 minutes.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default rate limit: 60 requests per minute per IP.
const DEFAULT_RATE_LIMIT: u64 = 60;

/// Rate limit window duration in seconds (1 minute).
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

/// Server configuration, resolved by `main` from flags and env vars and
/// passed in explicitly -- handlers never read ambient globals.
pub struct ServeConfig {
    pub port: u16,
    pub forecast_url: String,
    pub data: PathBuf,
}

/// Start the HTTP server with the given configuration.
///
/// Security:
/// - CORS: Permissive (`Any` origin) for local dev; tighten for production.
/// - Rate limit: Per-IP, from DEMANDCAST_RATE_LIMIT (default 60 req/min).
/// - API key: If DEMANDCAST_API_KEY is set, all endpoints except
///   /api/health require auth.
pub async fn start_server(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonlStore::open(&config.data).await?;
    eprintln!("Document store: {}", config.data.display());

    // Rate limit: from DEMANDCAST_RATE_LIMIT env var, or default
    let rate_limit = std::env::var("DEMANDCAST_RATE_LIMIT")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT);

    // API key: from DEMANDCAST_API_KEY env var (None = no auth)
    let api_key = std::env::var("DEMANDCAST_API_KEY")
        .ok()
        .filter(|k| !k.is_empty());

    if api_key.is_some() {
        eprintln!("API key authentication enabled");
    }
    eprintln!("Rate limit: {} requests per minute per IP", rate_limit);
    eprintln!("Upstream forecaster: {}", config.forecast_url);

    let state = Arc::new(AppState {
        store: Arc::new(store) as Arc<dyn ForecastStore>,
        forecaster: ForecastClient::new(config.forecast_url, UPSTREAM_TIMEOUT),
        rate_limiter: RateLimiter::new(rate_limit),
        api_key,
    });

    // CORS: permissive for local dev (the browser client is served elsewhere)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/forecast", post(handle_forecast))
        .route("/api/forecasts", get(handle_list_forecasts))
        .route("/api/forecasts/{id}", get(handle_get_forecast))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    eprintln!("API listening on http://0.0.0.0:{}", config.port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    eprintln!("\nServer shut down.");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    eprintln!("\nReceived shutdown signal...");
}
