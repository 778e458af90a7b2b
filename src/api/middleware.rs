//! Shared-secret gate for everything under `/api`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::Settings;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Missing key is 401, wrong key is 403. The comparison is verbatim.
pub async fn require_api_key(
    State(settings): State<Arc<Settings>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match request.headers().get(API_KEY_HEADER) {
        None => {
            tracing::warn!("Missing {} header", API_KEY_HEADER);
            reject(StatusCode::UNAUTHORIZED, "API key required")
        }
        Some(key) if key.as_bytes() == settings.api_key.as_bytes() => next.run(request).await,
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            reject(StatusCode::FORBIDDEN, "Invalid API key")
        }
    }
}

fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}
