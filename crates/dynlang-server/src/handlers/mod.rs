//! HTTP handler modules for the dynlang API.
//!
//! Handlers are thin: they parse the request, lock the target session,
//! gather collaborator results and delegate to
//! [`DiagramSession`](crate::session::DiagramSession). No diagram logic
//! lives here.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use dynlang_storage::ConnectionAuth;

pub mod editing;
pub mod language;
pub mod model;
pub mod sessions;

/// The raw `Authorization` header, if the request carries one.
pub(crate) fn connection_auth(headers: &HeaderMap) -> Option<ConnectionAuth> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| ConnectionAuth::new(Some(value.to_string())))
}
