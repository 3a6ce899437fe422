//! Graph-editing operations.
//!
//! Operations arrive from the client as JSON tagged by `kind`. Each one is
//! applied to a [`DiagramState`] in two phases: every precondition is checked
//! first, then the model is mutated. A failed operation therefore leaves the
//! model and its index unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::binding::BindingPath;
use crate::clipboard::{ClipboardData, ClipboardPayload};
use crate::diagram::DiagramState;
use crate::error::DiagramError;
use crate::id::{ElementId, TypeTag};
use crate::language::Language;
use crate::model::{Dimension, Edge, ElementKind, Node, Point};
use crate::schema::BoundDataPolicy;

/// Id of the single element shown in showcase mode.
pub const SHOWCASE_ELEMENT: &str = "showcase_element";

/// Label arguments that may carry the binding a label edit writes to.
const LABEL_BIND_ARGS: [&str; 2] = ["textBind", "nameBind"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBounds {
    pub element_id: ElementId,
    #[serde(default)]
    pub new_position: Option<Point>,
    #[serde(default)]
    pub new_size: Option<Dimension>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRoutingPoints {
    pub element_id: ElementId,
    #[serde(default)]
    pub new_routing_points: Vec<Point>,
}

/// How `ChangeBoundData` combines new data with the old.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeMode {
    #[default]
    Replace,
    /// Shallow object merge; non-object data is replaced.
    Merge,
}

/// The fixed set of editing operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Operation {
    #[serde(rename_all = "camelCase")]
    CreateNode {
        element_type_id: TypeTag,
        #[serde(default)]
        location: Option<Point>,
    },
    #[serde(rename_all = "camelCase")]
    CreateEdge {
        element_type_id: TypeTag,
        source_element_id: ElementId,
        target_element_id: ElementId,
    },
    #[serde(rename_all = "camelCase")]
    DeleteElement { element_ids: Vec<ElementId> },
    #[serde(rename_all = "camelCase")]
    ChangeBounds { new_bounds: Vec<ElementBounds> },
    #[serde(rename_all = "camelCase")]
    ChangeRoutingPoints { new_routing_points: Vec<ElementRoutingPoints> },
    #[serde(rename_all = "camelCase")]
    ReconnectEdge {
        edge_element_id: ElementId,
        source_element_id: ElementId,
        target_element_id: ElementId,
    },
    #[serde(rename_all = "camelCase")]
    ApplyLabelEdit { label_id: String, text: String },
    #[serde(rename_all = "camelCase", alias = "modelChange")]
    ChangeBoundData {
        element_id: ElementId,
        #[serde(alias = "newModel")]
        bound_data: Value,
        #[serde(default)]
        mode: ChangeMode,
    },
    #[serde(rename_all = "camelCase")]
    Cut { selected_element_ids: Vec<ElementId> },
    #[serde(rename_all = "camelCase")]
    Paste {
        clipboard: ClipboardData,
        #[serde(default)]
        location: Option<Point>,
    },
    RefreshShowcase,
}

/// What an applied operation did, beyond mutating the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created: Vec<ElementId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<ElementId>,
    /// Set by `Cut`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clipboard: Option<ClipboardData>,
}

/// Collaborators an operation may consult.
#[derive(Debug, Clone, Copy)]
pub struct OperationContext<'a> {
    pub language: &'a Language,
    pub policy: BoundDataPolicy,
}

impl Operation {
    /// The wire `kind` of this operation.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::CreateNode { .. } => "createNode",
            Operation::CreateEdge { .. } => "createEdge",
            Operation::DeleteElement { .. } => "deleteElement",
            Operation::ChangeBounds { .. } => "changeBounds",
            Operation::ChangeRoutingPoints { .. } => "changeRoutingPoints",
            Operation::ReconnectEdge { .. } => "reconnectEdge",
            Operation::ApplyLabelEdit { .. } => "applyLabelEdit",
            Operation::ChangeBoundData { .. } => "changeBoundData",
            Operation::Cut { .. } => "cut",
            Operation::Paste { .. } => "paste",
            Operation::RefreshShowcase => "refreshShowcase",
        }
    }

    /// Validates and applies the operation.
    pub fn apply(
        self,
        state: &mut DiagramState,
        ctx: OperationContext<'_>,
    ) -> Result<OperationOutcome, DiagramError> {
        match self {
            Operation::CreateNode {
                element_type_id,
                location,
            } => create_node(state, ctx.language, element_type_id, location),
            Operation::CreateEdge {
                element_type_id,
                source_element_id,
                target_element_id,
            } => create_edge(state, ctx.language, element_type_id, source_element_id, target_element_id),
            Operation::DeleteElement { element_ids } => delete_elements(state, &element_ids),
            Operation::ChangeBounds { new_bounds } => {
                if let Some(missing) = new_bounds.iter().find(|b| state.node(&b.element_id).is_none()) {
                    return Err(DiagramError::not_found(&missing.element_id));
                }
                for bounds in new_bounds {
                    state.set_bounds(&bounds.element_id, bounds.new_position, bounds.new_size)?;
                }
                Ok(OperationOutcome::default())
            }
            Operation::ChangeRoutingPoints { new_routing_points } => {
                if let Some(missing) = new_routing_points
                    .iter()
                    .find(|r| state.edge(&r.element_id).is_none())
                {
                    return Err(DiagramError::not_found(&missing.element_id));
                }
                for routing in new_routing_points {
                    state.set_routing_points(&routing.element_id, routing.new_routing_points)?;
                }
                Ok(OperationOutcome::default())
            }
            Operation::ReconnectEdge {
                edge_element_id,
                source_element_id,
                target_element_id,
            } => {
                state.reconnect(&edge_element_id, source_element_id, target_element_id)?;
                Ok(OperationOutcome::default())
            }
            Operation::ApplyLabelEdit { label_id, text } => apply_label_edit(state, &label_id, text),
            Operation::ChangeBoundData {
                element_id,
                bound_data,
                mode,
            } => change_bound_data(state, ctx, &element_id, bound_data, mode),
            Operation::Cut {
                selected_element_ids,
            } => {
                let clipboard = ClipboardPayload::from_selection(state, &selected_element_ids)?.encode()?;
                let mut outcome = delete_elements(state, &selected_element_ids)?;
                outcome.clipboard = Some(clipboard);
                Ok(outcome)
            }
            Operation::Paste { clipboard, location } => {
                let payload = ClipboardPayload::decode(&clipboard)?;
                let (nodes, edges) = payload.instantiate(state, location);
                let mut created = Vec::with_capacity(nodes.len() + edges.len());
                for node in nodes {
                    created.push(node.id.clone());
                    state.insert_node(node)?;
                }
                for edge in edges {
                    created.push(edge.id.clone());
                    state.insert_edge(edge)?;
                }
                Ok(OperationOutcome {
                    created,
                    ..OperationOutcome::default()
                })
            }
            Operation::RefreshShowcase => refresh_showcase(state, ctx.language),
        }
    }
}

fn create_node(
    state: &mut DiagramState,
    language: &Language,
    tag: TypeTag,
    location: Option<Point>,
) -> Result<OperationOutcome, DiagramError> {
    let element = language
        .node(&tag)
        .ok_or_else(|| DiagramError::UnknownType { tag: tag.clone() })?;
    let mut node = Node::new(ElementId::generate(), tag, location.unwrap_or(Point::ORIGIN));
    node.size = Some(Dimension::default());
    node.bound_data = element.instantiate_default(state.count_of(ElementKind::Node, &node.tag) + 1);
    let id = node.id.clone();
    state.insert_node(node)?;
    Ok(OperationOutcome {
        created: vec![id],
        ..OperationOutcome::default()
    })
}

fn create_edge(
    state: &mut DiagramState,
    language: &Language,
    tag: TypeTag,
    source: ElementId,
    target: ElementId,
) -> Result<OperationOutcome, DiagramError> {
    let element = language
        .edge(&tag)
        .ok_or_else(|| DiagramError::UnknownType { tag: tag.clone() })?;
    let mut edge = Edge::new(ElementId::generate(), tag, source, target);
    edge.bound_data = element.instantiate_default(state.count_of(ElementKind::Edge, &edge.tag) + 1);
    let id = edge.id.clone();
    // the index rejects endpoints that are not nodes
    state.insert_edge(edge)?;
    Ok(OperationOutcome {
        created: vec![id],
        ..OperationOutcome::default()
    })
}

fn delete_elements(state: &mut DiagramState, ids: &[ElementId]) -> Result<OperationOutcome, DiagramError> {
    if let Some(missing) = ids.iter().find(|id| state.lookup(id).is_none()) {
        return Err(DiagramError::not_found(missing));
    }
    let mut removed = Vec::new();
    for id in ids {
        // an edge may already be gone with a node removed before it
        if state.lookup(id).is_some() {
            removed.extend(state.remove(id)?);
        }
    }
    Ok(OperationOutcome {
        removed,
        ..OperationOutcome::default()
    })
}

fn apply_label_edit(state: &mut DiagramState, label_id: &str, text: String) -> Result<OperationOutcome, DiagramError> {
    let not_bound = || DiagramError::BindingNotFound {
        label: label_id.to_string(),
    };

    let entry = state.lookup_visual(label_id).ok_or_else(not_bound)?;
    let bind = LABEL_BIND_ARGS
        .iter()
        .find_map(|arg| entry.args.get(*arg).and_then(Value::as_str))
        .ok_or_else(not_bound)?;
    let path = BindingPath::parse(bind).map_err(|_| not_bound())?;
    let owner = state.index().nearest_element(label_id).ok_or_else(not_bound)?;

    let mut data = state.lookup(&owner).ok_or_else(not_bound)?.bound_data().clone();
    path.assign(&mut data, Value::String(text)).map_err(|err| {
        tracing::debug!(label = label_id, error = %err, "label edit does not fit bound data");
        not_bound()
    })?;
    *state.bound_data_mut(&owner)? = data;
    Ok(OperationOutcome::default())
}

fn change_bound_data(
    state: &mut DiagramState,
    ctx: OperationContext<'_>,
    id: &ElementId,
    incoming: Value,
    mode: ChangeMode,
) -> Result<OperationOutcome, DiagramError> {
    let element = state.lookup(id).ok_or_else(|| DiagramError::not_found(id))?;

    let next = match (mode, element.bound_data(), incoming) {
        (ChangeMode::Merge, Value::Object(current), Value::Object(patch)) => {
            let mut merged = current.clone();
            merged.extend(patch);
            Value::Object(merged)
        }
        (_, _, incoming) => incoming,
    };

    if ctx.policy == BoundDataPolicy::Validate {
        let schema = ctx
            .language
            .element_of(element.kind(), element.tag())
            .and_then(|e| e.schema.as_ref());
        if let Some(schema) = schema {
            let issues = schema.validate(&next);
            if !issues.is_empty() {
                return Err(DiagramError::SchemaViolation { id: id.clone(), issues });
            }
        }
    }

    *state.bound_data_mut(id)? = next;
    Ok(OperationOutcome::default())
}

fn refresh_showcase(state: &mut DiagramState, language: &Language) -> Result<OperationOutcome, DiagramError> {
    let id = ElementId::from(SHOWCASE_ELEMENT);
    let element = state.lookup(&id).ok_or_else(|| DiagramError::not_found(&id))?;
    let (kind, tag) = (element.kind(), element.tag().clone());
    let spec = language
        .element_of(kind, &tag)
        .ok_or_else(|| DiagramError::UnknownType { tag: tag.clone() })?;
    let data = spec.instantiate_default(state.count_of(kind, &tag).max(1));
    *state.bound_data_mut(&id)? = data;
    Ok(OperationOutcome::default())
}

/// Builds a diagram holding a single element of type `tag`.
///
/// A node type yields one node. An edge type yields the edge between two
/// untyped anchor nodes.
pub fn showcase(language: &Language, tag: &TypeTag) -> Result<DiagramState, DiagramError> {
    let id = ElementId::from(SHOWCASE_ELEMENT);
    let mut state = DiagramState::empty();
    if let Some(element) = language.node(tag) {
        let mut node = Node::new(id, tag.clone(), Point::ORIGIN);
        node.size = Some(Dimension::default());
        node.bound_data = element.instantiate_default(1);
        state.insert_node(node)?;
    } else if let Some(element) = language.edge(tag) {
        let source = Node::new(ElementId::from("showcase_source"), TypeTag::default(), Point::ORIGIN);
        let target = Node::new(ElementId::from("showcase_target"), TypeTag::default(), Point::new(200.0, 0.0));
        let mut edge = Edge::new(id, tag.clone(), source.id.clone(), target.id.clone());
        edge.bound_data = element.instantiate_default(1);
        state.insert_node(source)?;
        state.insert_node(target)?;
        state.insert_edge(edge)?;
    } else {
        return Err(DiagramError::UnknownType { tag: tag.clone() });
    }
    Ok(state)
}
