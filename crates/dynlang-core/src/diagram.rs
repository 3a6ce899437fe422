//! DiagramState: the graph model and its index, kept in lockstep.
//!
//! [`DiagramState`] is the single entry point for mutating a graph model.
//! Every structural mutation updates the [`ModelIndex`] in the same call, so
//! lookups are never stale across an operation boundary. Mutators validate
//! before touching anything: an `Err` leaves both model and index unchanged.

use serde_json::Value;

use crate::error::DiagramError;
use crate::id::{ElementId, TypeTag};
use crate::index::{ModelIndex, VisualEntry};
use crate::language::Language;
use crate::model::{Dimension, Edge, ElementKind, ElementRef, GraphModel, Node, Point};
use crate::resolver::Resolver;
use crate::visual::Rendered;

#[derive(Debug, Clone)]
pub struct DiagramState {
    model: GraphModel,
    index: ModelIndex,
}

impl DiagramState {
    /// Installs `model`, rejecting duplicate ids and dangling edges.
    pub fn new(model: GraphModel) -> Result<Self, DiagramError> {
        model.check()?;
        let index = ModelIndex::build(&model)?;
        let state = DiagramState { model, index };
        state.assert_consistency();
        Ok(state)
    }

    pub fn empty() -> Self {
        DiagramState {
            model: GraphModel::empty(),
            index: ModelIndex::default(),
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn index(&self) -> &ModelIndex {
        &self.index
    }

    /// Consumes the state, returning the model.
    pub fn into_model(self) -> GraphModel {
        self.model
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn lookup(&self, id: &ElementId) -> Option<ElementRef<'_>> {
        match self.index.kind_of(id)? {
            ElementKind::Node => self.model.nodes.get(id).map(ElementRef::Node),
            ElementKind::Edge => self.model.edges.get(id).map(ElementRef::Edge),
        }
    }

    pub fn node(&self, id: &ElementId) -> Option<&Node> {
        self.model.nodes.get(id)
    }

    pub fn edge(&self, id: &ElementId) -> Option<&Edge> {
        self.model.edges.get(id)
    }

    pub fn lookup_visual(&self, id: &str) -> Option<&VisualEntry> {
        self.index.lookup_visual(id)
    }

    pub fn incident_edges(&self, node: &ElementId) -> Vec<ElementId> {
        self.index.incident_edges(node)
    }

    /// Existing elements of `kind` carrying `tag`; drives `${autoincrement}`.
    pub fn count_of(&self, kind: ElementKind, tag: &TypeTag) -> usize {
        self.model.count_of(kind, tag)
    }

    // -----------------------------------------------------------------------
    // Structural mutations
    // -----------------------------------------------------------------------

    pub fn insert_node(&mut self, node: Node) -> Result<(), DiagramError> {
        if self.model.contains(&node.id) {
            return Err(DiagramError::DuplicateId { id: node.id });
        }
        self.index.insert_node(&node)?;
        self.model.nodes.insert(node.id.clone(), node);
        self.assert_consistency();
        Ok(())
    }

    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), DiagramError> {
        if self.model.contains(&edge.id) {
            return Err(DiagramError::DuplicateId { id: edge.id });
        }
        self.index.insert_edge(&edge)?;
        self.model.edges.insert(edge.id.clone(), edge);
        self.assert_consistency();
        Ok(())
    }

    /// Removes a node or edge. Removing a node also removes its incident
    /// edges. Returns every removed id, the requested one first.
    pub fn remove(&mut self, id: &ElementId) -> Result<Vec<ElementId>, DiagramError> {
        let removed = match self.index.kind_of(id) {
            Some(ElementKind::Node) => {
                let incident = self.index.remove_node(id);
                self.model.nodes.shift_remove(id);
                for edge in &incident {
                    self.model.edges.shift_remove(edge);
                }
                std::iter::once(id.clone()).chain(incident).collect()
            }
            Some(ElementKind::Edge) => {
                self.index.remove_edge(id);
                self.model.edges.shift_remove(id);
                vec![id.clone()]
            }
            None => return Err(DiagramError::not_found(id)),
        };
        self.assert_consistency();
        Ok(removed)
    }

    pub fn set_bounds(
        &mut self,
        id: &ElementId,
        position: Option<Point>,
        size: Option<Dimension>,
    ) -> Result<(), DiagramError> {
        let node = self.model.nodes.get_mut(id).ok_or_else(|| DiagramError::not_found(id))?;
        if let Some(position) = position {
            node.position = position;
        }
        if let Some(size) = size {
            node.size = Some(size);
        }
        Ok(())
    }

    pub fn set_routing_points(&mut self, id: &ElementId, points: Vec<Point>) -> Result<(), DiagramError> {
        let edge = self.model.edges.get_mut(id).ok_or_else(|| DiagramError::not_found(id))?;
        edge.routing_points = points;
        Ok(())
    }

    /// Points an edge at new endpoints, both of which must be nodes.
    pub fn reconnect(
        &mut self,
        id: &ElementId,
        source: ElementId,
        target: ElementId,
    ) -> Result<(), DiagramError> {
        if !self.model.edges.contains_key(id) {
            return Err(DiagramError::not_found(id));
        }
        for endpoint in [&source, &target] {
            if self.index.kind_of(endpoint) != Some(ElementKind::Node) {
                return Err(DiagramError::DanglingReference {
                    edge: id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
        let edge = self.model.edges.get_mut(id).ok_or_else(|| DiagramError::not_found(id))?;
        edge.source_id = source;
        edge.target_id = target;
        self.index.reconnect_edge(edge)?;
        self.assert_consistency();
        Ok(())
    }

    /// Mutable access to an element's bound data.
    pub fn bound_data_mut(&mut self, id: &ElementId) -> Result<&mut Value, DiagramError> {
        let data = match self.index.kind_of(id) {
            Some(ElementKind::Node) => self.model.nodes.get_mut(id).map(|n| &mut n.bound_data),
            Some(ElementKind::Edge) => self.model.edges.get_mut(id).map(|e| &mut e.bound_data),
            None => None,
        };
        data.ok_or_else(|| DiagramError::not_found(id))
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Resolves the whole model and refreshes the visual index.
    pub fn render(&mut self, language: &Language) -> Result<Rendered, DiagramError> {
        let rendered = Resolver::new(language).resolve_model(&self.model)?;
        self.index.index_visuals(&rendered.graph);
        self.assert_consistency();
        Ok(rendered)
    }

    // -----------------------------------------------------------------------
    // Consistency
    // -----------------------------------------------------------------------

    /// Verifies that the index matches the model.
    pub fn check_consistency(&self) -> Result<(), String> {
        self.index.check_against(&self.model)
    }

    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        if let Err(mismatch) = self.check_consistency() {
            panic!("diagram index out of sync: {mismatch}");
        }
    }

    #[cfg(not(debug_assertions))]
    fn assert_consistency(&self) {}
}
