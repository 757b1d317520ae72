use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;

use crate::dto::UploadResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Upload a document and run the full ingestion pipeline.
///
/// Takes the first file field of the multipart body. The session call is
/// blocking (extraction and embedding), so it runs off the async worker.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::bad_request("Invalid multipart body").with_details(e.to_string())
    })? {
        let is_file = field.file_name().is_some() || field.name() == Some("file");
        if is_file && data.is_none() {
            let bytes = field.bytes().await.map_err(|e| {
                ApiError::bad_request("Failed to read uploaded file").with_details(e.to_string())
            })?;
            data = Some(bytes.to_vec());
        }
    }

    let bytes = data.ok_or_else(|| ApiError::bad_request("Missing file field"))?;

    tracing::info!(size = bytes.len(), "Processing document upload");

    let session = Arc::clone(&state.session);
    let receipt = tokio::task::spawn_blocking(move || session.upload(&bytes))
        .await
        .map_err(|e| ApiError::internal("Upload task failed").with_details(e.to_string()))??;

    Ok(Json(UploadResponse::from(receipt)))
}
