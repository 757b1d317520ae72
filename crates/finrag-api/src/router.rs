use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Uploaded documents may be large scanned reports
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Document lifecycle
        .route("/api/v1/documents", post(handlers::upload_document))
        .route("/api/v1/analytics", get(handlers::analytics))
        .route("/api/v1/status", get(handlers::status))

        // Question answering
        .route("/api/v1/ask", post(handlers::ask))

        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
