//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all API endpoints. It implements
//! `axum::response::IntoResponse` to produce structured JSON error responses
//! of the form `{ "success": false, "error": { "code", "message" } }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dynlang_core::DiagramError;
use dynlang_storage::StorageError;
use serde::Serialize;

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "UNKNOWN_TYPE").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details (e.g., schema violations).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A diagram operation or render was rejected.
    #[error(transparent)]
    Diagram(#[from] DiagramError),

    /// Unknown session, language or model (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A collaborator rejected the connection credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A collaborator failed (502).
    #[error("collaborator error: {0}")]
    Collaborator(String),

    /// A collaborator did not answer in time (504).
    #[error("timed out: {0}")]
    Timeout(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Diagram(err) => (diagram_status(err), err.kind()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Collaborator(_) => (StatusCode::BAD_GATEWAY, "COLLABORATOR_ERROR"),
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }
}

fn diagram_status(err: &DiagramError) -> StatusCode {
    match err {
        DiagramError::NotFound { .. } => StatusCode::NOT_FOUND,
        DiagramError::UnknownType { .. }
        | DiagramError::DanglingReference { .. }
        | DiagramError::BindingNotFound { .. }
        | DiagramError::MalformedClipboard { .. }
        | DiagramError::DuplicateId { .. }
        | DiagramError::SchemaViolation { .. } => StatusCode::BAD_REQUEST,
        DiagramError::TemplateError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DiagramError::NoModelLoaded | DiagramError::NoLanguageLoaded => StatusCode::CONFLICT,
        DiagramError::ConfigurationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        } else {
            tracing::debug!(code, error = %self, "request rejected");
        }

        let details = match &self {
            ApiError::Diagram(DiagramError::SchemaViolation { issues, .. }) => {
                serde_json::to_value(issues).ok()
            }
            _ => None,
        };
        let message = match &self {
            ApiError::Diagram(err) => err.to_string(),
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Collaborator(msg)
            | ApiError::Timeout(msg)
            | ApiError::InternalError(msg) => msg.clone(),
        };

        let body = serde_json::json!({
            "success": false,
            "error": ApiErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::LanguageNotFound(_) | StorageError::ModelNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            StorageError::Unauthorized => ApiError::Unauthorized(err.to_string()),
            StorageError::Provider { .. } => ApiError::Collaborator(err.to_string()),
            StorageError::Serialization(_) | StorageError::Sqlite(_) | StorageError::Migration(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}
