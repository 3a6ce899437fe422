//! Core error types for dynlang-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering every
//! way a language load, a render pass or an edit operation can be rejected.

use thiserror::Error;

use crate::id::{ElementId, TypeTag};

/// Errors produced by the dynlang-core crate.
///
/// Operation handlers return these before touching the graph model, so an
/// `Err` always means the model is unchanged.
#[derive(Debug, Error)]
pub enum DiagramError {
    /// A referenced type tag is not declared in the language.
    #[error("unknown type: '{tag}'")]
    UnknownType { tag: TypeTag },

    /// A referenced element id is absent from the graph model.
    #[error("element not found: '{id}'")]
    NotFound { id: ElementId },

    /// An edge endpoint does not resolve to an existing node.
    #[error("dangling reference: edge '{edge}' points to missing node '{node}'")]
    DanglingReference { edge: ElementId, node: ElementId },

    /// Two elements share one id.
    #[error("duplicate element id: '{id}'")]
    DuplicateId { id: ElementId },

    /// A visual template is malformed or a resolution invariant was violated.
    #[error("template error: {reason}")]
    TemplateError { reason: String },

    /// A label has no recorded binding to write an edit back to.
    #[error("binding not found for label '{label}'")]
    BindingNotFound { label: String },

    /// A required collaborator is not wired.
    #[error("configuration error: {reason}")]
    ConfigurationError { reason: String },

    /// A clipboard payload could not be pasted.
    #[error("malformed clipboard: {reason}")]
    MalformedClipboard { reason: String },

    /// Bound data does not conform to the element's attribute schema.
    #[error("schema violation on '{id}': {}", issues.join("; "))]
    SchemaViolation { id: ElementId, issues: Vec<String> },

    /// An operation arrived before a graph model was loaded.
    #[error("no graph model loaded")]
    NoModelLoaded,

    /// An operation arrived before a language was loaded.
    #[error("no language loaded")]
    NoLanguageLoaded,
}

impl DiagramError {
    /// Machine-readable kind, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            DiagramError::UnknownType { .. } => "UNKNOWN_TYPE",
            DiagramError::NotFound { .. } => "NOT_FOUND",
            DiagramError::DanglingReference { .. } => "DANGLING_REFERENCE",
            DiagramError::DuplicateId { .. } => "DUPLICATE_ID",
            DiagramError::TemplateError { .. } => "TEMPLATE_ERROR",
            DiagramError::BindingNotFound { .. } => "BINDING_NOT_FOUND",
            DiagramError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
            DiagramError::MalformedClipboard { .. } => "MALFORMED_CLIPBOARD",
            DiagramError::SchemaViolation { .. } => "SCHEMA_VIOLATION",
            DiagramError::NoModelLoaded => "NO_MODEL_LOADED",
            DiagramError::NoLanguageLoaded => "NO_LANGUAGE_LOADED",
        }
    }

    pub(crate) fn template(reason: impl Into<String>) -> Self {
        DiagramError::TemplateError {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(id: &ElementId) -> Self {
        DiagramError::NotFound { id: id.clone() }
    }
}
