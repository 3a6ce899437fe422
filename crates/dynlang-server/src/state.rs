//! Application state shared by all handlers.
//!
//! Sessions live in a `DashMap`, each behind its own `tokio::sync::Mutex`.
//! The per-session mutex is the serialization point: a handler holds it for
//! the whole request, collaborator calls included, so one operation is fully
//! applied and rendered before the next one on that session starts. Handlers
//! await the lock without blocking the tokio runtime, and sessions never
//! contend with each other.

use std::sync::Arc;

use dashmap::DashMap;
use dynlang_storage::{ConnectionAuth, SqliteStore};
use tokio::sync::Mutex;

use crate::cache::LanguageCache;
use crate::collaborators::Collaborators;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::session::{DiagramSession, SessionId};

pub type SharedSession = Arc<Mutex<DiagramSession>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub collaborators: Collaborators,
    pub languages: Arc<LanguageCache>,
    pub sessions: Arc<DashMap<SessionId, SharedSession>>,
}

impl AppState {
    /// Creates an `AppState` whose collaborators are a SQLite store at
    /// `config.db_path`.
    pub fn new(config: ServerConfig) -> Result<Self, ApiError> {
        let store = Arc::new(SqliteStore::new(&config.db_path)?);
        Ok(Self::with_collaborators(config, Collaborators::from_store(store)))
    }

    pub fn with_collaborators(config: ServerConfig, collaborators: Collaborators) -> Self {
        AppState {
            config: Arc::new(config),
            collaborators,
            languages: Arc::new(LanguageCache::new()),
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn open_session(&self, source_id: String, auth: ConnectionAuth) -> SessionId {
        let session = DiagramSession::new(source_id, auth, self.config.bound_data_policy);
        let id = session.id();
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        tracing::info!(session = %id, "session opened");
        id
    }

    pub fn session(&self, id: SessionId) -> Result<SharedSession, ApiError> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ApiError::NotFound(format!("session '{id}'")))
    }

    pub fn close_session(&self, id: SessionId) -> Result<(), ApiError> {
        self.sessions
            .remove(&id)
            .map(|_| tracing::info!(session = %id, "session closed"))
            .ok_or_else(|| ApiError::NotFound(format!("session '{id}'")))
    }
}
