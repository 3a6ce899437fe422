//! Identifier newtypes for diagram entities.
//!
//! Element ids and type tags are both strings on the wire, so they are wrapped
//! in distinct newtypes to keep an [`ElementId`] from being passed where a
//! [`TypeTag`] is expected.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a node or edge inside one graph model.
///
/// Generated ids are UUID v4 strings. Ids coming from a model provider are
/// accepted verbatim (showcase elements use a fixed, non-UUID id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    /// Allocates a fresh random id.
    pub fn generate() -> Self {
        ElementId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Tag naming a node or edge type in a language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(pub String);

impl TypeTag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Untyped elements render with default visuals.
    pub fn is_untyped(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        ElementId(s.to_string())
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        ElementId(s)
    }
}

impl From<&str> for TypeTag {
    fn from(s: &str) -> Self {
        TypeTag(s.to_string())
    }
}

impl From<String> for TypeTag {
    fn from(s: String) -> Self {
        TypeTag(s)
    }
}

// Lets `IndexMap<ElementId, _>` / `IndexMap<TypeTag, _>` be queried with `&str`.

impl Borrow<str> for ElementId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = ElementId::generate();
        let b = ElementId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ElementId::from("showcase_element");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"showcase_element\"");
        let tag: TypeTag = serde_json::from_str("\"entity\"").unwrap();
        assert_eq!(tag, TypeTag::from("entity"));
    }

    #[test]
    fn empty_tag_is_untyped() {
        assert!(TypeTag::default().is_untyped());
        assert!(!TypeTag::from("entity").is_untyped());
    }
}
