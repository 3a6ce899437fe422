//! Model load/save request/response types.

use serde::{Deserialize, Serialize};

use super::render::RenderResponse;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadModelResponse {
    pub model_id: String,
    pub nodes: usize,
    pub edges: usize,
    /// Present once a language is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<RenderResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveModelRequest {
    /// Rendered preview image, passed through to the model saver.
    #[serde(default)]
    pub preview: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveModelResponse {
    pub success: bool,
    pub source_id: String,
    pub model_id: String,
}
