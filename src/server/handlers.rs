//! HTTP request handlers for the control API.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::prefetch::{ContentKey, ContentType, PrefetchClient, Priority};

/// Health check endpoint.
pub async fn health() -> &'static str {
    "ok"
}

/// Single prefetch hint.
#[derive(Debug, Deserialize)]
pub struct PrefetchBody {
    pub id: i64,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default)]
    pub priority: Priority,
    /// Enqueue after this many milliseconds instead of immediately.
    pub delay_ms: Option<u64>,
    /// Hover hint: delayed by `delay_ms` or the configured hover delay.
    #[serde(default)]
    pub hover: bool,
}

#[derive(Debug, Serialize)]
pub struct PrefetchResponse {
    pub outcome: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct BatchItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub content_type: ContentType,
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
    pub items: Vec<BatchItem>,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub accepted: usize,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

fn invalid_id(id: i64) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        format!("Invalid id {}: must be positive", id),
    )
        .into_response()
}

/// Enqueue now, or schedule when a delay or hover is requested.
pub async fn prefetch<C: PrefetchClient>(
    State(state): State<AppState<C>>,
    Json(body): Json<PrefetchBody>,
) -> impl IntoResponse {
    if body.id <= 0 {
        return invalid_id(body.id);
    }
    let key = ContentKey::new(body.content_type, body.id);

    let delay = match (body.delay_ms, body.hover) {
        (Some(ms), _) => Some(Duration::from_millis(ms)),
        (None, true) => Some(state.hover_delay),
        (None, false) => None,
    };

    let outcome = match delay {
        Some(delay) => {
            state.queue.schedule(key, body.priority, delay).await;
            "scheduled"
        }
        None => state.queue.enqueue_key(key, body.priority).await.as_str(),
    };

    Json(PrefetchResponse { outcome }).into_response()
}

/// Enqueue several keys at one priority.
pub async fn prefetch_batch<C: PrefetchClient>(
    State(state): State<AppState<C>>,
    Json(body): Json<BatchBody>,
) -> impl IntoResponse {
    if let Some(bad) = body.items.iter().find(|item| item.id <= 0) {
        return invalid_id(bad.id);
    }

    let keys: Vec<ContentKey> = body
        .items
        .iter()
        .map(|item| ContentKey::new(item.content_type, item.id))
        .collect();
    let accepted = state.queue.enqueue_batch(keys, body.priority).await;

    Json(BatchResponse { accepted }).into_response()
}

/// Cancel a scheduled hover prefetch that has not fired.
pub async fn cancel_pending<C: PrefetchClient>(
    State(state): State<AppState<C>>,
    Path((content_type, id)): Path<(ContentType, i64)>,
) -> impl IntoResponse {
    if id <= 0 {
        return invalid_id(id);
    }

    let cancelled = state
        .queue
        .cancel_prefetch(ContentKey::new(content_type, id))
        .await;

    Json(CancelResponse { cancelled }).into_response()
}

/// Forget processed keys and failure counts.
pub async fn clear_cache<C: PrefetchClient>(State(state): State<AppState<C>>) -> StatusCode {
    state.queue.clear_cache().await;
    StatusCode::NO_CONTENT
}

/// Queue bookkeeping snapshot.
pub async fn stats<C: PrefetchClient>(State(state): State<AppState<C>>) -> impl IntoResponse {
    Json(state.queue.get_cache_stats().await)
}
