//! SQLite implementation of the collaborator traits.
//!
//! [`SqliteStore`] keeps language documents and graph models as JSON TEXT
//! columns, one row per language id and per source id. The connection sits
//! behind a mutex; each call holds it only for a single statement or
//! transaction. The async collaborator impls run their queries on the tokio
//! blocking pool.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use dynlang_core::{GraphModel, LanguageDocument};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::traits::{LanguageProvider, ModelProvider, ModelSaver};
use crate::types::{ConnectionAuth, LanguageSummary, StoredModel};

/// SQLite-backed store for languages and models.
///
/// Auth is not checked here; a deployment that needs it wraps the store.
/// Clones share the same connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        tracing::info!(path, "opened sqlite store");
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Provider {
            reason: "sqlite connection lock poisoned".to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Languages
    // -----------------------------------------------------------------------

    /// Inserts or replaces a language document.
    pub fn put_language(&self, document: &LanguageDocument) -> Result<(), StorageError> {
        let json = serde_json::to_string(document)?;
        self.conn()?.execute(
            "INSERT INTO languages (id, name, version, document) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                version = excluded.version,
                document = excluded.document,
                updated_at = datetime('now')",
            params![document.id, document.name, document.version, json],
        )?;
        Ok(())
    }

    pub fn get_language(&self, id: &str) -> Result<Option<LanguageDocument>, StorageError> {
        let json: Option<String> = self
            .conn()?
            .query_row("SELECT document FROM languages WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        json.map(|json| serde_json::from_str(&json).map_err(StorageError::from))
            .transpose()
    }

    pub fn list_languages(&self) -> Result<Vec<LanguageSummary>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, version FROM languages ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(LanguageSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                version: row.get(2)?,
            })
        })?;
        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    pub fn delete_language(&self, id: &str) -> Result<(), StorageError> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM languages WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StorageError::LanguageNotFound(id.to_string()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Models
    // -----------------------------------------------------------------------

    /// Inserts or replaces the model stored under `source_id`.
    pub fn put_model(
        &self,
        source_id: &str,
        model: &GraphModel,
        preview: Option<&str>,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(model)?;
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO models (source_id, model_id, document, preview) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(source_id) DO UPDATE SET
                model_id = excluded.model_id,
                document = excluded.document,
                preview = excluded.preview,
                updated_at = datetime('now')",
            params![source_id, model.id, json, preview],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_model(&self, source_id: &str) -> Result<Option<StoredModel>, StorageError> {
        let row: Option<(String, Option<String>)> = self
            .conn()?
            .query_row(
                "SELECT document, preview FROM models WHERE source_id = ?1",
                params![source_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((json, preview)) = row else {
            return Ok(None);
        };
        Ok(Some(StoredModel {
            source_id: source_id.to_string(),
            model: serde_json::from_str(&json)?,
            preview,
        }))
    }

    pub fn delete_model(&self, source_id: &str) -> Result<(), StorageError> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM models WHERE source_id = ?1", params![source_id])?;
        if deleted == 0 {
            return Err(StorageError::ModelNotFound(source_id.to_string()));
        }
        Ok(())
    }
}

/// Runs a synchronous store call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| StorageError::Provider {
            reason: format!("sqlite task failed: {err}"),
        })?
}

#[async_trait]
impl LanguageProvider for SqliteStore {
    async fn language(
        &self,
        language_id: &str,
        _auth: &ConnectionAuth,
    ) -> Result<Option<LanguageDocument>, StorageError> {
        let store = self.clone();
        let language_id = language_id.to_string();
        blocking(move || store.get_language(&language_id)).await
    }
}

#[async_trait]
impl ModelProvider for SqliteStore {
    async fn model(
        &self,
        source_id: &str,
        _auth: &ConnectionAuth,
    ) -> Result<Option<GraphModel>, StorageError> {
        let store = self.clone();
        let source_id = source_id.to_string();
        let stored = blocking(move || store.get_model(&source_id)).await?;
        Ok(stored.map(|stored| stored.model))
    }
}

#[async_trait]
impl ModelSaver for SqliteStore {
    async fn save_model(
        &self,
        source_id: &str,
        model: &GraphModel,
        preview: Option<&str>,
        _auth: &ConnectionAuth,
    ) -> Result<(), StorageError> {
        tracing::debug!(source_id, model_id = %model.id, "saving model");
        let store = self.clone();
        let source_id = source_id.to_string();
        let model = model.clone();
        let preview = preview.map(str::to_string);
        blocking(move || store.put_model(&source_id, &model, preview.as_deref())).await
    }
}
