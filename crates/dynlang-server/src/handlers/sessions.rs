//! Session lifecycle and health handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use super::connection_auth;
use crate::error::ApiError;
use crate::schema::sessions::{HealthResponse, OpenSessionRequest, OpenSessionResponse};
use crate::session::SessionId;
use crate::state::AppState;

/// Opens a session for one source model.
///
/// `POST /sessions`
pub async fn open_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OpenSessionRequest>,
) -> Result<Json<OpenSessionResponse>, ApiError> {
    if req.source_id.trim().is_empty() {
        return Err(ApiError::BadRequest("sourceId must not be empty".to_string()));
    }
    let auth = connection_auth(&headers).unwrap_or_default();
    let session_id = state.open_session(req.source_id.clone(), auth);
    Ok(Json(OpenSessionResponse {
        session_id,
        source_id: req.source_id,
    }))
}

/// `DELETE /sessions/{id}`
pub async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.close_session(SessionId(id))?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.len(),
        languages: state.languages.len(),
    })
}
