//! The collaborators a server wires into every session, with call timeouts.
//!
//! Each collaborator is optional: a server without a model saver can still
//! render, but a save request fails with `ConfigurationError`. Every call is
//! bounded by the configured timeout and finishes before the session is
//! mutated, so a slow or failing collaborator never leaves a half-applied
//! change behind.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dynlang_core::{DiagramError, GraphModel, LanguageDocument};
use dynlang_storage::{ConnectionAuth, LanguageProvider, ModelProvider, ModelSaver, StorageError};

use crate::error::ApiError;

#[derive(Clone, Default)]
pub struct Collaborators {
    pub languages: Option<Arc<dyn LanguageProvider>>,
    pub models: Option<Arc<dyn ModelProvider>>,
    pub saver: Option<Arc<dyn ModelSaver>>,
}

impl Collaborators {
    /// Wires one store as all three collaborators.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: LanguageProvider + ModelProvider + ModelSaver + 'static,
    {
        Collaborators {
            languages: Some(store.clone()),
            models: Some(store.clone()),
            saver: Some(store),
        }
    }

    pub async fn load_language(
        &self,
        language_id: &str,
        auth: &ConnectionAuth,
        limit: Duration,
    ) -> Result<LanguageDocument, ApiError> {
        let provider = self
            .languages
            .as_ref()
            .ok_or_else(|| missing("no language provider was defined"))?;
        bounded(limit, "language provider", provider.language(language_id, auth))
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("language '{language_id}'")))
    }

    /// Loads the model behind `source_id`; an absent model is a fresh empty
    /// one.
    pub async fn load_model(
        &self,
        source_id: &str,
        auth: &ConnectionAuth,
        limit: Duration,
    ) -> Result<GraphModel, ApiError> {
        let provider = self
            .models
            .as_ref()
            .ok_or_else(|| missing("no model provider was defined"))?;
        let model = bounded(limit, "model provider", provider.model(source_id, auth)).await?;
        Ok(model.unwrap_or_else(|| {
            tracing::info!(source_id, "no stored model, starting empty");
            GraphModel::empty()
        }))
    }

    pub async fn save_model(
        &self,
        source_id: &str,
        model: &GraphModel,
        preview: Option<&str>,
        auth: &ConnectionAuth,
        limit: Duration,
    ) -> Result<(), ApiError> {
        let saver = self
            .saver
            .as_ref()
            .ok_or_else(|| missing("no model saver was defined"))?;
        bounded(limit, "model saver", saver.save_model(source_id, model, preview, auth)).await
    }
}

fn missing(reason: &str) -> ApiError {
    DiagramError::ConfigurationError {
        reason: reason.to_string(),
    }
    .into()
}

async fn bounded<T>(
    limit: Duration,
    what: &str,
    call: impl Future<Output = Result<T, StorageError>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => {
            tracing::warn!(collaborator = what, timeout_ms = limit.as_millis() as u64, "collaborator call timed out");
            Err(ApiError::Timeout(format!("{what} did not answer within {}ms", limit.as_millis())))
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use dynlang_storage::InMemoryStore;

    use super::*;

    struct Stalled;

    #[async_trait]
    impl ModelProvider for Stalled {
        async fn model(&self, _: &str, _: &ConnectionAuth) -> Result<Option<GraphModel>, StorageError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn missing_collaborators_are_configuration_errors() {
        let collaborators = Collaborators::default();
        let err = collaborators
            .load_language("er", &ConnectionAuth::anonymous(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(err, ApiError::Diagram(DiagramError::ConfigurationError { .. })));
    }

    #[tokio::test]
    async fn absent_model_starts_empty() {
        let collaborators = Collaborators::from_store(Arc::new(InMemoryStore::new()));
        let model = collaborators
            .load_model("new.diagram", &ConnectionAuth::anonymous(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(model.is_empty());
        assert!(!model.id.is_empty());
    }

    #[tokio::test]
    async fn absent_language_is_not_found() {
        let collaborators = Collaborators::from_store(Arc::new(InMemoryStore::new()));
        let err = collaborators
            .load_language("er", &ConnectionAuth::anonymous(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn slow_collaborators_time_out() {
        let collaborators = Collaborators {
            models: Some(Arc::new(Stalled)),
            ..Collaborators::default()
        };
        let err = collaborators
            .load_model("m", &ConnectionAuth::anonymous(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
