//! Render, operation, showcase and clipboard types.

use dynlang_core::{Diagnostic, ElementId, OperationOutcome, Rendered, TypeTag, VisualGraph};
use serde::{Deserialize, Serialize};

use crate::session::OperationReport;

/// The current visual tree plus any resolution diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    pub graph: VisualGraph,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl From<Rendered> for RenderResponse {
    fn from(rendered: Rendered) -> Self {
        RenderResponse {
            graph: rendered.graph,
            diagnostics: rendered.diagnostics,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub kind: &'static str,
    #[serde(flatten)]
    pub outcome: OperationOutcome,
    #[serde(flatten)]
    pub render: RenderResponse,
}

impl OperationResponse {
    pub fn new(kind: &'static str, report: OperationReport) -> Self {
        OperationResponse {
            kind,
            outcome: report.outcome,
            render: report.rendered.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowcaseRequest {
    pub element_type_id: TypeTag,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardRequest {
    pub selected_element_ids: Vec<ElementId>,
}
