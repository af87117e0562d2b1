/// HTTP error mapping
///
/// Converts registry failures into consistent JSON error responses of the
/// form `{"error": "...", "code": "..."}`.

use crate::workflow::error::RegistryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level error type for HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Workflow not found or could not be deleted: {0}")]
    DeleteFailed(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Registry(err) => match err {
                RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
                RegistryError::InvalidWorkflowId(_) | RegistryError::InvalidFileName(_) => {
                    (StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string())
                }
                RegistryError::Execution { message, .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXECUTION_ERROR",
                    format!("Error executing workflow: {}", message),
                ),
                RegistryError::Registration { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REGISTRATION_FAILED",
                    "Failed to register workflow".to_string(),
                ),
            },
            ApiError::DeleteFailed(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}
