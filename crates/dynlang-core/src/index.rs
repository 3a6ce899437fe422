//! ModelIndex: id lookups over the graph model and the rendered tree.
//!
//! The index never owns element data. It records which ids exist and of
//! which kind, keeps the node/edge topology in a petgraph `StableGraph` so a
//! node's incident edges are found without scanning, and maps every rendered
//! visual id to its parent and owning model element.
//!
//! The index is rebuilt wholesale on load and updated incrementally by
//! [`DiagramState`](crate::diagram::DiagramState) on every structural change.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde_json::Value;

use crate::error::DiagramError;
use crate::id::ElementId;
use crate::model::{Edge, ElementKind, GraphModel, Node};
use crate::visual::{VisualElement, VisualGraph};

/// Index entry for one rendered visual element.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualEntry {
    pub kind: String,
    pub parent: Option<String>,
    /// Node or edge the element was rendered for.
    pub owner: ElementId,
    pub args: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelIndex {
    kinds: HashMap<ElementId, ElementKind>,
    topology: StableGraph<ElementId, ElementId, Directed, u32>,
    node_slots: HashMap<ElementId, NodeIndex<u32>>,
    edge_slots: HashMap<ElementId, EdgeIndex<u32>>,
    visuals: HashMap<String, VisualEntry>,
}

impl ModelIndex {
    /// Indexes every element of `model`. Fails on duplicate ids or dangling
    /// edge endpoints.
    pub fn build(model: &GraphModel) -> Result<Self, DiagramError> {
        let mut index = ModelIndex::default();
        for node in model.nodes.values() {
            index.insert_node(node)?;
        }
        for edge in model.edges.values() {
            index.insert_edge(edge)?;
        }
        Ok(index)
    }

    pub fn insert_node(&mut self, node: &Node) -> Result<(), DiagramError> {
        if self.kinds.contains_key(&node.id) {
            return Err(DiagramError::DuplicateId { id: node.id.clone() });
        }
        let slot = self.topology.add_node(node.id.clone());
        self.node_slots.insert(node.id.clone(), slot);
        self.kinds.insert(node.id.clone(), ElementKind::Node);
        Ok(())
    }

    pub fn insert_edge(&mut self, edge: &Edge) -> Result<(), DiagramError> {
        if self.kinds.contains_key(&edge.id) {
            return Err(DiagramError::DuplicateId { id: edge.id.clone() });
        }
        let (source, target) = self.endpoints(edge)?;
        let slot = self.topology.add_edge(source, target, edge.id.clone());
        self.edge_slots.insert(edge.id.clone(), slot);
        self.kinds.insert(edge.id.clone(), ElementKind::Edge);
        Ok(())
    }

    /// Re-links an already indexed edge to its current endpoints.
    pub fn reconnect_edge(&mut self, edge: &Edge) -> Result<(), DiagramError> {
        let (source, target) = self.endpoints(edge)?;
        let slot = self
            .edge_slots
            .get(&edge.id)
            .copied()
            .ok_or_else(|| DiagramError::not_found(&edge.id))?;
        self.topology.remove_edge(slot);
        let slot = self.topology.add_edge(source, target, edge.id.clone());
        self.edge_slots.insert(edge.id.clone(), slot);
        Ok(())
    }

    fn endpoints(&self, edge: &Edge) -> Result<(NodeIndex<u32>, NodeIndex<u32>), DiagramError> {
        let slot = |id: &ElementId| {
            self.node_slots
                .get(id)
                .copied()
                .ok_or_else(|| DiagramError::DanglingReference {
                    edge: edge.id.clone(),
                    node: id.clone(),
                })
        };
        Ok((slot(&edge.source_id)?, slot(&edge.target_id)?))
    }

    /// Removes an edge. Returns `false` when the id is not an indexed edge.
    pub fn remove_edge(&mut self, id: &ElementId) -> bool {
        match self.edge_slots.remove(id) {
            Some(slot) => {
                self.topology.remove_edge(slot);
                self.kinds.remove(id);
                self.forget_visuals_of(id);
                true
            }
            None => false,
        }
    }

    /// Removes a node together with its incident edges and returns the ids
    /// of the edges dropped with it.
    pub fn remove_node(&mut self, id: &ElementId) -> Vec<ElementId> {
        let incident = self.incident_edges(id);
        for edge in &incident {
            self.remove_edge(edge);
        }
        if let Some(slot) = self.node_slots.remove(id) {
            self.topology.remove_node(slot);
            self.kinds.remove(id);
            self.forget_visuals_of(id);
        }
        incident
    }

    fn forget_visuals_of(&mut self, owner: &ElementId) {
        self.visuals.retain(|_, entry| &entry.owner != owner);
    }

    /// Ids of all edges touching `node`, each listed once.
    pub fn incident_edges(&self, node: &ElementId) -> Vec<ElementId> {
        let Some(&slot) = self.node_slots.get(node) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        [Direction::Outgoing, Direction::Incoming]
            .into_iter()
            .flat_map(|dir| self.topology.edges_directed(slot, dir))
            .map(|edge| edge.weight().clone())
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    pub fn kind_of(&self, id: &ElementId) -> Option<ElementKind> {
        self.kinds.get(id).copied()
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.kinds.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // -----------------------------------------------------------------------
    // Visual lookups
    // -----------------------------------------------------------------------

    /// Replaces the visual index with the elements of `graph`.
    pub fn index_visuals(&mut self, graph: &VisualGraph) {
        self.visuals.clear();
        for root in &graph.children {
            let owner = ElementId::from(root.id.as_str());
            root.walk(&mut |element: &VisualElement, parent: Option<&VisualElement>| {
                self.visuals.insert(
                    element.id.clone(),
                    VisualEntry {
                        kind: element.kind.clone(),
                        parent: parent.map(|p| p.id.clone()),
                        owner: owner.clone(),
                        args: element.args.clone(),
                    },
                );
            });
        }
    }

    pub fn lookup_visual(&self, id: &str) -> Option<&VisualEntry> {
        self.visuals.get(id)
    }

    /// The node or edge a visual element was rendered for.
    ///
    /// Rendered ids resolve through their recorded owner, so a model id that
    /// happens to equal a generated child id never captures the lookup. An id
    /// with no rendered entry resolves only if it is itself a model element.
    pub fn nearest_element(&self, visual_id: &str) -> Option<ElementId> {
        let owner = match self.visuals.get(visual_id) {
            Some(entry) => entry.owner.clone(),
            None => ElementId::from(visual_id),
        };
        self.kinds.contains_key(&owner).then_some(owner)
    }

    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Verifies the index against `model`. Returns a description of the
    /// first mismatch found.
    pub fn check_against(&self, model: &GraphModel) -> Result<(), String> {
        if self.kinds.len() != model.len() {
            return Err(format!(
                "index holds {} ids, model holds {} elements",
                self.kinds.len(),
                model.len()
            ));
        }
        for id in model.nodes.keys() {
            if self.kind_of(id) != Some(ElementKind::Node) || !self.node_slots.contains_key(id) {
                return Err(format!("node '{id}' is not indexed as a node"));
            }
        }
        for (id, edge) in &model.edges {
            let Some(&slot) = self.edge_slots.get(id) else {
                return Err(format!("edge '{id}' is not indexed as an edge"));
            };
            let Some((source, target)) = self.topology.edge_endpoints(slot) else {
                return Err(format!("edge '{id}' has no topology entry"));
            };
            if self.topology[source] != edge.source_id || self.topology[target] != edge.target_id {
                return Err(format!("edge '{id}' endpoints differ from the model"));
            }
        }
        if self.topology.node_count() != model.nodes.len() || self.topology.edge_count() != model.edges.len() {
            return Err("topology size differs from the model".to_string());
        }
        if let Some((visual, entry)) = self.visuals.iter().find(|(_, entry)| !model.contains(&entry.owner)) {
            return Err(format!("visual '{visual}' refers to absent element '{}'", entry.owner));
        }
        Ok(())
    }
}
