//! DiagramSession: one client's editing session.
//!
//! A session owns its [`DiagramState`] exclusively and shares its compiled
//! [`Language`] with every other session on the same language. All state
//! changes go through clone-and-swap: the change is applied to a copy, the
//! copy is rendered, and only a successful render replaces the live state.
//! A failed operation or render therefore leaves the session untouched.

use std::fmt;
use std::sync::Arc;

use dynlang_core::clipboard::ClipboardPayload;
use dynlang_core::{
    showcase, BoundDataPolicy, ClipboardData, DiagramError, DiagramState, ElementId, GraphModel,
    Language, Operation, OperationContext, OperationOutcome, Rendered, TypeTag,
};
use dynlang_storage::ConnectionAuth;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the session's diagram holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// The model loaded from the session's source.
    Editing,
    /// A single preview element of one type.
    Showcase { element_type: TypeTag },
}

/// Result of one applied operation.
#[derive(Debug, Clone)]
pub struct OperationReport {
    pub outcome: OperationOutcome,
    pub rendered: Rendered,
}

pub struct DiagramSession {
    id: SessionId,
    source_id: String,
    auth: ConnectionAuth,
    policy: BoundDataPolicy,
    language: Option<Arc<Language>>,
    diagram: Option<DiagramState>,
    mode: SessionMode,
    /// Render of the current diagram, dropped on every change.
    rendered: Option<Rendered>,
}

impl DiagramSession {
    pub fn new(source_id: impl Into<String>, auth: ConnectionAuth, policy: BoundDataPolicy) -> Self {
        DiagramSession {
            id: SessionId::generate(),
            source_id: source_id.into(),
            auth,
            policy,
            language: None,
            diagram: None,
            mode: SessionMode::Editing,
            rendered: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn auth(&self) -> &ConnectionAuth {
        &self.auth
    }

    /// Replaces the connection context passed to collaborators.
    pub fn set_auth(&mut self, auth: ConnectionAuth) {
        self.auth = auth;
    }

    pub fn language(&self) -> Option<&Arc<Language>> {
        self.language.as_ref()
    }

    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    pub fn model(&self) -> Result<&GraphModel, DiagramError> {
        self.diagram
            .as_ref()
            .map(DiagramState::model)
            .ok_or(DiagramError::NoModelLoaded)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Swaps in a new language. With a model loaded the model is re-rendered
    /// against it first; if that fails the old language stays.
    pub fn install_language(&mut self, language: Arc<Language>) -> Result<Option<Rendered>, DiagramError> {
        let rendered = match &self.diagram {
            Some(diagram) => {
                let mut next = diagram.clone();
                let rendered = next.render(&language)?;
                self.diagram = Some(next);
                Some(rendered)
            }
            None => None,
        };
        tracing::info!(session = %self.id, language = %language.cache_key(), "language installed");
        self.language = Some(language);
        self.rendered = rendered.clone();
        Ok(rendered)
    }

    /// Installs a freshly loaded model, leaving showcase mode.
    pub fn install_model(&mut self, model: GraphModel) -> Result<Option<Rendered>, DiagramError> {
        let mut next = DiagramState::new(model)?;
        let rendered = match &self.language {
            Some(language) => Some(next.render(language)?),
            None => None,
        };
        tracing::info!(
            session = %self.id,
            nodes = next.model().nodes.len(),
            edges = next.model().edges.len(),
            "model installed"
        );
        self.diagram = Some(next);
        self.mode = SessionMode::Editing;
        self.rendered = rendered.clone();
        Ok(rendered)
    }

    /// Replaces the diagram with a single element of `element_type`.
    pub fn show(&mut self, element_type: TypeTag) -> Result<Rendered, DiagramError> {
        let language = self.language.clone().ok_or(DiagramError::NoLanguageLoaded)?;
        let mut next = showcase(&language, &element_type)?;
        let rendered = next.render(&language)?;
        tracing::info!(session = %self.id, element_type = %element_type, "showcase");
        self.diagram = Some(next);
        self.mode = SessionMode::Showcase { element_type };
        self.rendered = Some(rendered.clone());
        Ok(rendered)
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    pub fn apply(&mut self, operation: Operation) -> Result<OperationReport, DiagramError> {
        let language = self.language.clone().ok_or(DiagramError::NoLanguageLoaded)?;
        let diagram = self.diagram.as_ref().ok_or(DiagramError::NoModelLoaded)?;
        let kind = operation.kind();

        let mut next = diagram.clone();
        let ctx = OperationContext {
            language: &language,
            policy: self.policy,
        };
        let outcome = operation.apply(&mut next, ctx).map_err(|err| {
            tracing::debug!(session = %self.id, operation = kind, error = %err, "operation rejected");
            err
        })?;
        let rendered = next.render(&language)?;

        tracing::debug!(
            session = %self.id,
            operation = kind,
            created = outcome.created.len(),
            removed = outcome.removed.len(),
            "operation applied"
        );
        self.diagram = Some(next);
        self.rendered = Some(rendered.clone());
        Ok(OperationReport { outcome, rendered })
    }

    /// The current render, computed on demand.
    pub fn render(&mut self) -> Result<Rendered, DiagramError> {
        if let Some(rendered) = &self.rendered {
            return Ok(rendered.clone());
        }
        let language = self.language.clone().ok_or(DiagramError::NoLanguageLoaded)?;
        let diagram = self.diagram.as_mut().ok_or(DiagramError::NoModelLoaded)?;
        let rendered = diagram.render(&language)?;
        self.rendered = Some(rendered.clone());
        Ok(rendered)
    }

    /// Serializes the selected sub-graph without removing it.
    pub fn clipboard(&self, selection: &[ElementId]) -> Result<ClipboardData, DiagramError> {
        let diagram = self.diagram.as_ref().ok_or(DiagramError::NoModelLoaded)?;
        ClipboardPayload::from_selection(diagram, selection)?.encode()
    }
}
