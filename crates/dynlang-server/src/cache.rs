//! Compiled languages shared by all sessions.
//!
//! Entries are keyed by language id and version. A session still asks the
//! language provider for the document on every load (the provider decides
//! whether the caller may see it); only compilation is skipped on a hit.

use std::sync::Arc;

use dashmap::DashMap;
use dynlang_core::{DiagramError, Language, LanguageDocument};

#[derive(Debug, Default)]
pub struct LanguageCache {
    entries: DashMap<String, Arc<Language>>,
}

impl LanguageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&self, document: LanguageDocument) -> Result<Arc<Language>, DiagramError> {
        let key = format!("{}@{}", document.id, document.version);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.value().clone());
        }
        let language = Arc::new(Language::compile(document)?);
        tracing::info!(language = %key, "compiled language");
        // a concurrent compile of the same key may have won; keep the first
        let entry = self.entries.entry(key).or_insert(language);
        Ok(entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(version: u32) -> LanguageDocument {
        serde_json::from_value(json!({
            "id": "er",
            "version": version,
            "nodes": {"entity": {"label": "Entity"}}
        }))
        .unwrap()
    }

    #[test]
    fn same_version_is_compiled_once() {
        let cache = LanguageCache::new();
        let first = cache.get_or_compile(document(1)).unwrap();
        let second = cache.get_or_compile(document(1)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let bumped = cache.get_or_compile(document(2)).unwrap();
        assert!(!Arc::ptr_eq(&first, &bumped));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn broken_documents_are_not_cached() {
        let cache = LanguageCache::new();
        let broken: LanguageDocument = serde_json::from_value(json!({
            "id": "bad",
            "nodes": {"x": {"visualTemplate": {"type": "iteration", "iterand": "i"}}}
        }))
        .unwrap();
        assert!(matches!(
            cache.get_or_compile(broken),
            Err(DiagramError::TemplateError { .. })
        ));
        assert!(cache.is_empty());
    }
}
