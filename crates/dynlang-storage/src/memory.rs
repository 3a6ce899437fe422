//! In-memory implementation of the collaborator traits.
//!
//! [`InMemoryStore`] is a first-class backend for tests, showcase servers and
//! anywhere persistence isn't needed. It has the same semantics as
//! [`SqliteStore`](crate::sqlite::SqliteStore): documents are keyed by
//! language id and source id, and saving a model overwrites the previous one.

use async_trait::async_trait;
use dashmap::DashMap;
use dynlang_core::{GraphModel, LanguageDocument};

use crate::error::StorageError;
use crate::traits::{LanguageProvider, ModelProvider, ModelSaver};
use crate::types::{ConnectionAuth, LanguageSummary, StoredModel};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    languages: DashMap<String, LanguageDocument>,
    models: DashMap<String, StoredModel>,
    /// When set, every call must present exactly this auth value.
    required_auth: Option<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects calls whose auth token differs from `token`.
    pub fn with_required_auth(token: impl Into<String>) -> Self {
        InMemoryStore {
            required_auth: Some(token.into()),
            ..Self::default()
        }
    }

    fn authorize(&self, auth: &ConnectionAuth) -> Result<(), StorageError> {
        match &self.required_auth {
            Some(required) if auth.token() != Some(required.as_str()) => Err(StorageError::Unauthorized),
            _ => Ok(()),
        }
    }

    /// Stores a language document, replacing one with the same id.
    pub fn put_language(&self, document: LanguageDocument) {
        self.languages.insert(document.id.clone(), document);
    }

    /// Stores a model under `source_id` without going through a saver call.
    pub fn put_model(&self, source_id: impl Into<String>, model: GraphModel) {
        let source_id = source_id.into();
        self.models.insert(
            source_id.clone(),
            StoredModel {
                source_id,
                model,
                preview: None,
            },
        );
    }

    pub fn stored_model(&self, source_id: &str) -> Option<StoredModel> {
        self.models.get(source_id).map(|entry| entry.value().clone())
    }

    pub fn delete_model(&self, source_id: &str) -> Result<(), StorageError> {
        self.models
            .remove(source_id)
            .map(|_| ())
            .ok_or_else(|| StorageError::ModelNotFound(source_id.to_string()))
    }

    pub fn list_languages(&self) -> Vec<LanguageSummary> {
        let mut summaries: Vec<LanguageSummary> = self
            .languages
            .iter()
            .map(|entry| LanguageSummary {
                id: entry.id.clone(),
                name: entry.name.clone(),
                version: entry.version,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}

#[async_trait]
impl LanguageProvider for InMemoryStore {
    async fn language(
        &self,
        language_id: &str,
        auth: &ConnectionAuth,
    ) -> Result<Option<LanguageDocument>, StorageError> {
        self.authorize(auth)?;
        Ok(self.languages.get(language_id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl ModelProvider for InMemoryStore {
    async fn model(
        &self,
        source_id: &str,
        auth: &ConnectionAuth,
    ) -> Result<Option<GraphModel>, StorageError> {
        self.authorize(auth)?;
        Ok(self.models.get(source_id).map(|entry| entry.model.clone()))
    }
}

#[async_trait]
impl ModelSaver for InMemoryStore {
    async fn save_model(
        &self,
        source_id: &str,
        model: &GraphModel,
        preview: Option<&str>,
        auth: &ConnectionAuth,
    ) -> Result<(), StorageError> {
        self.authorize(auth)?;
        tracing::debug!(source_id, nodes = model.nodes.len(), edges = model.edges.len(), "saving model");
        self.models.insert(
            source_id.to_string(),
            StoredModel {
                source_id: source_id.to_string(),
                model: model.clone(),
                preview: preview.map(str::to_string),
            },
        );
        Ok(())
    }
}
