//! Collaborator traits an editing session depends on.
//!
//! The traits are async and object-safe so a session can hold them as
//! `Arc<dyn ...>` and swap backends (in-memory, SQLite, a remote service)
//! without changing session logic. Lookups return `Ok(None)` for an absent
//! document; the caller decides whether that is an error.

use async_trait::async_trait;
use dynlang_core::{GraphModel, LanguageDocument};

use crate::error::StorageError;
use crate::types::ConnectionAuth;

/// Resolves language ids to language documents.
#[async_trait]
pub trait LanguageProvider: Send + Sync {
    async fn language(
        &self,
        language_id: &str,
        auth: &ConnectionAuth,
    ) -> Result<Option<LanguageDocument>, StorageError>;
}

/// Loads the graph model stored under a source id.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn model(
        &self,
        source_id: &str,
        auth: &ConnectionAuth,
    ) -> Result<Option<GraphModel>, StorageError>;
}

/// Persists an edited graph model, optionally with a rendered preview.
#[async_trait]
pub trait ModelSaver: Send + Sync {
    async fn save_model(
        &self,
        source_id: &str,
        model: &GraphModel,
        preview: Option<&str>,
        auth: &ConnectionAuth,
    ) -> Result<(), StorageError>;
}
