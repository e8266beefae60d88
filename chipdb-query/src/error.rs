//! HTTP error responses
//!
//! Every error renders as `{"error": {"code": ..., "message": ...}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Store could not be opened or queried (500)
    #[error("Component store unavailable: {0}")]
    StoreUnavailable(String),

    /// Anything else from the common layer (500)
    #[error(transparent)]
    Internal(chipdb_common::Error),
}

impl From<chipdb_common::Error> for ApiError {
    fn from(err: chipdb_common::Error) -> Self {
        match err {
            chipdb_common::Error::StoreUnavailable { .. } => {
                ApiError::StoreUnavailable(err.to_string())
            }
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::StoreUnavailable(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_UNAVAILABLE", msg)
            }
            ApiError::Internal(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        error!(code, "Request failed: {}", message);

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
