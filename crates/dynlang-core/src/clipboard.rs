//! Clipboard payloads for copy, cut and paste.
//!
//! The payload is a JSON document `{ "nodes": [...], "edges": [...] }`
//! tagged with the `application/json` format. A selection copies the
//! selected nodes and edges plus every edge incident to a selected node.
//! Pasting re-inserts the payload with fresh ids.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::diagram::DiagramState;
use crate::error::DiagramError;
use crate::id::ElementId;
use crate::model::{Edge, ElementKind, Node, Point};

pub const CLIPBOARD_FORMAT: &str = "application/json";

/// Offset applied to pasted elements when no paste location is given.
pub const PASTE_OFFSET: f64 = 20.0;

/// Clipboard contents as exchanged with the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardData {
    pub format: String,
    pub payload: String,
}

/// Decoded clipboard contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl ClipboardPayload {
    /// Collects the sub-graph spanned by `selection`.
    ///
    /// Fails with `NotFound` if any selected id is absent.
    pub fn from_selection(state: &DiagramState, selection: &[ElementId]) -> Result<Self, DiagramError> {
        let mut nodes = HashSet::new();
        let mut edges = HashSet::new();
        for id in selection {
            match state.index().kind_of(id) {
                Some(ElementKind::Node) => {
                    nodes.insert(id.clone());
                    edges.extend(state.incident_edges(id));
                }
                Some(ElementKind::Edge) => {
                    edges.insert(id.clone());
                }
                None => return Err(DiagramError::not_found(id)),
            }
        }

        // model order keeps the payload deterministic
        let model = state.model();
        Ok(ClipboardPayload {
            nodes: model
                .nodes
                .values()
                .filter(|n| nodes.contains(&n.id))
                .cloned()
                .collect(),
            edges: model
                .edges
                .values()
                .filter(|e| edges.contains(&e.id))
                .cloned()
                .collect(),
        })
    }

    pub fn encode(&self) -> Result<ClipboardData, DiagramError> {
        let payload = serde_json::to_string_pretty(self).map_err(|e| DiagramError::MalformedClipboard {
            reason: e.to_string(),
        })?;
        Ok(ClipboardData {
            format: CLIPBOARD_FORMAT.to_string(),
            payload,
        })
    }

    /// Parses clipboard data, rejecting a foreign format, unparsable JSON
    /// and duplicate ids.
    pub fn decode(data: &ClipboardData) -> Result<Self, DiagramError> {
        if data.format != CLIPBOARD_FORMAT {
            return Err(DiagramError::MalformedClipboard {
                reason: format!("unsupported clipboard format '{}'", data.format),
            });
        }
        let payload: ClipboardPayload =
            serde_json::from_str(&data.payload).map_err(|e| DiagramError::MalformedClipboard {
                reason: e.to_string(),
            })?;

        let mut seen = HashSet::new();
        let ids = payload.nodes.iter().map(|n| &n.id).chain(payload.edges.iter().map(|e| &e.id));
        for id in ids {
            if !seen.insert(id) {
                return Err(DiagramError::MalformedClipboard {
                    reason: format!("duplicate element id '{id}'"),
                });
            }
        }
        Ok(payload)
    }

    /// Produces the elements to insert for a paste into `state`.
    ///
    /// Every element gets a fresh id. Nodes move so their top-left corner
    /// lands on `location`, or by a fixed offset without one. Edge endpoints
    /// inside the payload are remapped; endpoints outside it are kept when
    /// the node exists in the model, otherwise the edge is dropped.
    pub fn instantiate(&self, state: &DiagramState, location: Option<Point>) -> (Vec<Node>, Vec<Edge>) {
        let (dx, dy) = match (location, self.top_left()) {
            (Some(target), Some(origin)) => (target.x - origin.x, target.y - origin.y),
            _ => (PASTE_OFFSET, PASTE_OFFSET),
        };

        let fresh: HashMap<&ElementId, ElementId> = self
            .nodes
            .iter()
            .map(|n| (&n.id, ElementId::generate()))
            .collect();

        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                let mut pasted = node.clone();
                pasted.id = fresh[&node.id].clone();
                pasted.position = node.position.translate(dx, dy);
                pasted
            })
            .collect();

        let remap = |endpoint: &ElementId| -> Option<ElementId> {
            match fresh.get(endpoint) {
                Some(id) => Some(id.clone()),
                None if state.node(endpoint).is_some() => Some(endpoint.clone()),
                None => None,
            }
        };

        let edges = self
            .edges
            .iter()
            .filter_map(|edge| {
                let (Some(source), Some(target)) = (remap(&edge.source_id), remap(&edge.target_id)) else {
                    tracing::debug!(edge = %edge.id, "dropping pasted edge with unresolvable endpoint");
                    return None;
                };
                let mut pasted = edge.clone();
                pasted.id = ElementId::generate();
                pasted.source_id = source;
                pasted.target_id = target;
                pasted.routing_points = edge.routing_points.iter().map(|p| p.translate(dx, dy)).collect();
                Some(pasted)
            })
            .collect();

        (nodes, edges)
    }

    fn top_left(&self) -> Option<Point> {
        self.nodes.iter().map(|n| n.position).reduce(|a, b| Point::new(a.x.min(b.x), a.y.min(b.y)))
    }
}
