//! HTTP middleware: rate limiting and API key authentication.

use std::sync::Arc;

use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::state::AppState;

/// Rate limiting middleware. Checks per-IP request rate before routing.
pub(crate) async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ip = addr.ip();
    match state.rate_limiter.check(ip).await {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            let body = serde_json::json!({
                "error": "rate limit exceeded",
                "retry_after": retry_after,
            });
            (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response()
        }
    }
}

/// API key authentication middleware.
///
/// If DEMANDCAST_API_KEY is set, all requests (except /api/health) must
/// include either `Authorization: Bearer <key>` or `X-API-Key: <key>`.
pub(crate) async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let expected_key = match &state.api_key {
        Some(k) => k,
        None => return next.run(request).await, // No auth configured
    };

    // /api/health is exempt from auth (for load balancer health checks)
    if request.uri().path() == "/api/health" {
        return next.run(request).await;
    }

    // Accept either `Authorization: Bearer <key>` or `X-API-Key: <key>`.
    // The borrow of the request must end here: the request body is not
    // Sync, and holding the borrow across the awaits below would make
    // this future !Send.
    let presented: Option<String> = {
        let header = |name: &str| request.headers().get(name).and_then(|v| v.to_str().ok());
        header("authorization")
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .or_else(|| header("x-api-key"))
            .map(|k| k.to_string())
    };

    match presented.as_deref() {
        Some(key) if key == expected_key.as_str() => next.run(request).await,
        Some(_) => super::json_error(StatusCode::FORBIDDEN, "invalid API key").into_response(),
        None => {
            super::json_error(StatusCode::UNAUTHORIZED, "authentication required").into_response()
        }
    }
}
