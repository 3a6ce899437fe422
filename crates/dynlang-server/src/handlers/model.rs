//! Model load/save handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use super::connection_auth;
use crate::error::ApiError;
use crate::schema::model::{LoadModelResponse, SaveModelRequest, SaveModelResponse};
use crate::session::{SessionId, SessionMode};
use crate::state::AppState;

/// Loads the session's source model through the model provider.
///
/// `POST /sessions/{id}/model/load`
pub async fn load_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<LoadModelResponse>, ApiError> {
    let session = state.session(SessionId(id))?;
    let mut session = session.lock().await;
    if let Some(auth) = connection_auth(&headers) {
        session.set_auth(auth);
    }

    let model = state
        .collaborators
        .load_model(session.source_id(), session.auth(), state.config.collaborator_timeout)
        .await?;
    let (model_id, nodes, edges) = (model.id.clone(), model.nodes.len(), model.edges.len());
    let render = session.install_model(model)?;

    Ok(Json(LoadModelResponse {
        model_id,
        nodes,
        edges,
        render: render.map(Into::into),
    }))
}

/// Hands the session's model to the model saver.
///
/// `POST /sessions/{id}/model/save`
pub async fn save_model(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Option<Json<SaveModelRequest>>,
) -> Result<Json<SaveModelResponse>, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let session = state.session(SessionId(id))?;
    let mut session = session.lock().await;
    if let Some(auth) = connection_auth(&headers) {
        session.set_auth(auth);
    }
    if matches!(session.mode(), SessionMode::Showcase { .. }) {
        return Err(ApiError::BadRequest("a showcase diagram cannot be saved".to_string()));
    }

    let model = session.model()?;
    state
        .collaborators
        .save_model(
            session.source_id(),
            model,
            req.preview.as_deref(),
            session.auth(),
            state.config.collaborator_timeout,
        )
        .await?;
    tracing::info!(session = %session.id(), source_id = session.source_id(), "model saved");

    Ok(Json(SaveModelResponse {
        success: true,
        source_id: session.source_id().to_string(),
        model_id: model.id.clone(),
    }))
}
