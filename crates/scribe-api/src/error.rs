use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use scribe_db::StoreError;

/// Error kinds returned by the core operations. The `IntoResponse`
/// impl below is the transport mapping: kind to status code, plus the
/// JSON envelope the client expects. The operations themselves only
/// ever deal in kinds.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller-supplied input missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation, e.g. a duplicate email.
    #[error("{0}")]
    Conflict(String),

    /// Credentials or token invalid or expired.
    #[error("{0}")]
    Authentication(String),

    /// Entity missing, or owned by someone else. The two cases are
    /// deliberately indistinguishable.
    #[error("{0}")]
    NotFound(String),

    /// Store unreachable or timed out. Retryable with backoff.
    #[error("{0}")]
    Unavailable(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => ApiError::Unavailable(msg),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Internal detail stays in the logs, never on the wire.
            ApiError::Internal(e) => {
                error!("internal error: {e:#}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let status = self.status();
        (status, Json(json!({ "error": true, "message": message }))).into_response()
    }
}
