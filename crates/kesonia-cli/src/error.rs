//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kesonia_ai::PipelineError;
use kesonia_core::FinalizeError;
use kesonia_sync::SinkError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// `/predict` failures, rendered as `{"error": msg}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Pipeline(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Pipeline(e) => {
                error!(error = %e, "prediction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `/process-loan` failures, rendered as `{"success": false, "error": msg}`.
#[derive(Debug, Error)]
pub enum LoanProcessingError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    #[error("Failed to save to audit store")]
    Sink(#[source] SinkError),
}

impl IntoResponse for LoanProcessingError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) | Self::Finalize(_) => StatusCode::BAD_REQUEST,
            Self::Sink(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
