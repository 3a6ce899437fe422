//! Language load handler.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use dynlang_core::Language;
use uuid::Uuid;

use super::connection_auth;
use crate::error::ApiError;
use crate::schema::language::{LanguageView, LoadLanguageRequest, LoadLanguageResponse};
use crate::session::SessionId;
use crate::state::AppState;

/// Loads a language into the session, by id or inline.
///
/// `POST /sessions/{id}/language`
///
/// An id goes through the language provider with the session's connection
/// context, then through the shared compile cache. An inline document is
/// compiled for this session only.
pub async fn load_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<LoadLanguageRequest>,
) -> Result<Json<LoadLanguageResponse>, ApiError> {
    let session = state.session(SessionId(id))?;
    let mut session = session.lock().await;
    if let Some(auth) = connection_auth(&headers) {
        session.set_auth(auth);
    }

    let language = match (req.language_id, req.language) {
        (Some(language_id), None) => {
            let document = state
                .collaborators
                .load_language(&language_id, session.auth(), state.config.collaborator_timeout)
                .await?;
            state.languages.get_or_compile(document)?
        }
        (None, Some(document)) => Arc::new(Language::compile(document)?),
        _ => {
            return Err(ApiError::BadRequest(
                "exactly one of languageId or language is required".to_string(),
            ))
        }
    };

    let render = session.install_language(language.clone())?;
    Ok(Json(LoadLanguageResponse {
        language: LanguageView::from(language.as_ref()),
        render: render.map(Into::into),
    }))
}
