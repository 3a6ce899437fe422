//! Collaborator contracts for dynlang editing sessions.
//!
//! An editing session never talks to a database directly. It asks a
//! [`LanguageProvider`] for language documents, a [`ModelProvider`] for the
//! graph model behind a source id and hands edited models to a
//! [`ModelSaver`]. Every call carries the caller's [`ConnectionAuth`]
//! untouched.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: ConnectionAuth, StoredModel, LanguageSummary
//! - [`traits`]: the three collaborator traits
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: migration setup for the SQLite backend
//! - [`sqlite`]: SqliteStore implementation

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{LanguageProvider, ModelProvider, ModelSaver};
pub use types::{ConnectionAuth, LanguageSummary, StoredModel};
