//! Language load request/response types.

use dynlang_core::{Language, LanguageDocument};
use serde::{Deserialize, Serialize};

use super::render::RenderResponse;

/// Either a language id resolved through the language provider, or an
/// inline document (showcase preview of an unsaved language).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadLanguageRequest {
    #[serde(default)]
    pub language_id: Option<String>,
    #[serde(default)]
    pub language: Option<LanguageDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElementTypeView {
    #[serde(rename = "type")]
    pub tag: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageView {
    pub id: String,
    pub name: String,
    pub version: u32,
    pub node_types: Vec<ElementTypeView>,
    pub edge_types: Vec<ElementTypeView>,
}

impl From<&Language> for LanguageView {
    fn from(language: &Language) -> Self {
        let view = |element: &dynlang_core::LanguageElement| ElementTypeView {
            tag: element.tag.to_string(),
            label: element.label.clone(),
        };
        LanguageView {
            id: language.id.clone(),
            name: language.name.clone(),
            version: language.version,
            node_types: language.nodes().map(view).collect(),
            edge_types: language.edges().map(view).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadLanguageResponse {
    pub language: LanguageView,
    /// Present when a model was already loaded and got re-rendered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderResponse>,
}
