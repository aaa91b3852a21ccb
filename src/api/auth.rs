//! Operator authentication for the control endpoints
//!
//! Clients present the farm key either as `Authorization: Bearer <key>` or
//! in the `X-Api-Key` header printers themselves accept. Rejections use the
//! same JSON error body as the command endpoints.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};

use super::ApiState;
use super::commands::{ApiError, api_error};
use crate::dispatch::API_KEY_HEADER;

/// Key presented by the client, bearer token first
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    bearer.or_else(|| headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()))
}

fn keys_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Reject control requests without the farm key; open when none is set
pub async fn require_api_key(
    State(state): State<Arc<ApiState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    match presented_key(req.headers()) {
        Some(key) if keys_match(expected, key) => Ok(next.run(req).await),
        Some(_) => {
            tracing::warn!(path = %req.uri().path(), "rejected farm request with wrong key");
            Err(api_error(StatusCode::UNAUTHORIZED, "invalid api key"))
        }
        None => {
            tracing::debug!(path = %req.uri().path(), "farm request without key");
            Err(api_error(StatusCode::UNAUTHORIZED, "missing api key"))
        }
    }
}
