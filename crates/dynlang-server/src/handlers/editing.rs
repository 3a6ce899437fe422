//! Editing handlers: operations, showcase, render and clipboard.

use axum::extract::{Path, State};
use axum::Json;
use dynlang_core::{ClipboardData, Operation};
use uuid::Uuid;

use crate::error::ApiError;
use crate::schema::render::{ClipboardRequest, OperationResponse, RenderResponse, ShowcaseRequest};
use crate::session::SessionId;
use crate::state::AppState;

/// Applies one operation and returns the new render.
///
/// `POST /sessions/{id}/operations`
pub async fn apply_operation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(operation): Json<Operation>,
) -> Result<Json<OperationResponse>, ApiError> {
    let session = state.session(SessionId(id))?;
    let mut session = session.lock().await;
    let kind = operation.kind();
    let report = session.apply(operation)?;
    Ok(Json(OperationResponse::new(kind, report)))
}

/// Shows a single element of one type.
///
/// `POST /sessions/{id}/showcase`
pub async fn showcase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ShowcaseRequest>,
) -> Result<Json<RenderResponse>, ApiError> {
    let session = state.session(SessionId(id))?;
    let mut session = session.lock().await;
    Ok(Json(session.show(req.element_type_id)?.into()))
}

/// `GET /sessions/{id}/render`
pub async fn render(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderResponse>, ApiError> {
    let session = state.session(SessionId(id))?;
    let mut session = session.lock().await;
    Ok(Json(session.render()?.into()))
}

/// Serializes the selection for the client's clipboard.
///
/// `POST /sessions/{id}/clipboard`
pub async fn clipboard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ClipboardRequest>,
) -> Result<Json<ClipboardData>, ApiError> {
    let session = state.session(SessionId(id))?;
    let session = session.lock().await;
    Ok(Json(session.clipboard(&req.selected_element_ids)?))
}
