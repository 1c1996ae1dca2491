//! Router configuration for the control API.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;
use crate::prefetch::PrefetchClient;

/// Create the router with all routes.
pub fn create_router<C: PrefetchClient>(state: AppState<C>) -> Router {
    Router::new()
        // Health check for container orchestration
        .route("/health", get(handlers::health))
        // Hover and batch hints
        .route("/prefetch", post(handlers::prefetch::<C>))
        .route("/prefetch/batch", post(handlers::prefetch_batch::<C>))
        .route(
            "/prefetch/pending/:content_type/:id",
            delete(handlers::cancel_pending::<C>),
        )
        // Bookkeeping
        .route("/prefetch/cache/clear", post(handlers::clear_cache::<C>))
        .route("/prefetch/stats", get(handlers::stats::<C>))
        // Hover callers live in the browser
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
