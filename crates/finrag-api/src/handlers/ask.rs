use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::dto::{AnalyticsDto, AskRequest, AskResponse, StatusResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Answer a question against the current ready session.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    tracing::info!(question = %request.question, "Processing question");

    let session = Arc::clone(&state.session);
    let result = tokio::task::spawn_blocking(move || session.ask(&request.question))
        .await
        .map_err(|e| ApiError::internal("Ask task failed").with_details(e.to_string()))??;

    Ok(Json(AskResponse::from(result)))
}

/// Unit counts for the current document.
pub async fn analytics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsDto>, ApiError> {
    let counts = state.session.analytics()?;
    Ok(Json(AnalyticsDto::from(counts)))
}

/// Session lifecycle state.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        state: state.session.state(),
        document_id: state.session.document_id(),
    })
}
