//! Router assembly for the dynlang HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::sessions::health))
        // Session lifecycle
        .route("/sessions", post(handlers::sessions::open_session))
        .route("/sessions/{id}", delete(handlers::sessions::close_session))
        // Collaborator-backed loading and saving
        .route("/sessions/{id}/language", post(handlers::language::load_language))
        .route("/sessions/{id}/model/load", post(handlers::model::load_model))
        .route("/sessions/{id}/model/save", post(handlers::model::save_model))
        // Editing
        .route("/sessions/{id}/showcase", post(handlers::editing::showcase))
        .route("/sessions/{id}/operations", post(handlers::editing::apply_operation))
        .route("/sessions/{id}/render", get(handlers::editing::render))
        .route("/sessions/{id}/clipboard", post(handlers::editing::clipboard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
