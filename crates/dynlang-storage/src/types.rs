//! Storage-layer types passed between sessions and collaborators.

use std::fmt;

use dynlang_core::GraphModel;
use serde::{Deserialize, Serialize};

/// Opaque connection context handed to every collaborator call.
///
/// Holds the raw `Authorization` value the client connected with. Sessions
/// never inspect it; only collaborators decide what it means.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionAuth(Option<String>);

impl ConnectionAuth {
    pub fn new(token: Option<String>) -> Self {
        ConnectionAuth(token)
    }

    pub fn anonymous() -> Self {
        ConnectionAuth(None)
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

// Credentials stay out of logs.
impl fmt::Debug for ConnectionAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("ConnectionAuth(<redacted>)"),
            None => f.write_str("ConnectionAuth(anonymous)"),
        }
    }
}

/// A saved graph model plus the preview image sent along with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredModel {
    pub source_id: String,
    pub model: GraphModel,
    pub preview: Option<String>,
}

/// Summary of a stored language (for listing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSummary {
    pub id: String,
    pub name: String,
    pub version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_token() {
        let auth = ConnectionAuth::new(Some("Bearer secret".into()));
        assert_eq!(format!("{auth:?}"), "ConnectionAuth(<redacted>)");
        assert_eq!(auth.token(), Some("Bearer secret"));
        assert_eq!(format!("{:?}", ConnectionAuth::anonymous()), "ConnectionAuth(anonymous)");
    }
}
