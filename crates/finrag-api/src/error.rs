use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use finrag_core::error::FinragError;
use serde::Serialize;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            details: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<FinragError> for ApiError {
    fn from(err: FinragError) -> Self {
        let status = match &err {
            FinragError::DocumentUnreadable { .. }
            | FinragError::DocumentEncrypted
            | FinragError::DocumentEmpty
            | FinragError::EmptyQuestion
            | FinragError::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
            FinragError::IndexNotReady => StatusCode::CONFLICT,
            FinragError::EmbedderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            FinragError::GenerationFailed { .. } => StatusCode::BAD_GATEWAY,
            FinragError::DimensionMismatch { .. } | FinragError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self {
            status,
            message: err.to_string(),
            details: None,
        }
    }
}
