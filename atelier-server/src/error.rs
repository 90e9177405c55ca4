//! Unified request error type.
//!
//! Every handler returns `Result<T, ServerError>`; the `IntoResponse` impl
//! maps each variant to a status code. Internal failures are logged with
//! their full cause, while clients only ever see the status and a short
//! generic message.

use atelier_database::StorageError;
use atelier_llm::ProviderError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// No valid session on the request.
    #[error("unauthorized")]
    Unauthorized,

    /// The caller sent malformed input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The hosted model call failed; nothing past the user turn was written.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The backing store is unavailable or rejected the operation.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            ServerError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            ServerError::Provider(err) => {
                error!(error = %err, "model provider call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Failed to process message" })),
                )
                    .into_response()
            }
            ServerError::Storage(err) => {
                error!(error = %err, "storage operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
