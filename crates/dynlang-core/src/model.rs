//! The graph model: plain data describing one edited diagram.
//!
//! Nodes and edges are kept in insertion-ordered maps keyed by id so lookups
//! are O(1) while the wire form stays a JSON array. Deserialization rejects
//! duplicate ids; [`GraphModel::check`] additionally rejects ids shared
//! between a node and an edge and edges whose endpoints are missing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DiagramError;
use crate::id::{ElementId, TypeTag};

/// Default node width used when a node carries no size.
pub const DEFAULT_WIDTH: f64 = 50.0;
/// Default node height used when a node carries no size.
pub const DEFAULT_HEIGHT: f64 = 25.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

impl Default for Dimension {
    fn default() -> Self {
        Dimension {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: ElementId,
    #[serde(rename = "type", default)]
    pub tag: TypeTag,
    #[serde(default)]
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Dimension>,
    #[serde(default = "empty_object", alias = "model")]
    pub bound_data: Value,
}

impl Node {
    pub fn new(id: ElementId, tag: TypeTag, position: Point) -> Self {
        Node {
            id,
            tag,
            position,
            size: None,
            bound_data: empty_object(),
        }
    }

    /// Size used for rendering.
    pub fn effective_size(&self) -> Dimension {
        self.size.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: ElementId,
    #[serde(rename = "type", default)]
    pub tag: TypeTag,
    pub source_id: ElementId,
    pub target_id: ElementId,
    #[serde(default)]
    pub routing_points: Vec<Point>,
    #[serde(default = "empty_object", alias = "model")]
    pub bound_data: Value,
}

impl Edge {
    pub fn new(id: ElementId, tag: TypeTag, source_id: ElementId, target_id: ElementId) -> Self {
        Edge {
            id,
            tag,
            source_id,
            target_id,
            routing_points: Vec::new(),
            bound_data: empty_object(),
        }
    }
}

/// Whether an id names a node or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Edge,
}

/// Borrowed view of a model element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementRef<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
}

impl<'a> ElementRef<'a> {
    pub fn id(&self) -> &'a ElementId {
        match self {
            ElementRef::Node(n) => &n.id,
            ElementRef::Edge(e) => &e.id,
        }
    }

    pub fn tag(&self) -> &'a TypeTag {
        match self {
            ElementRef::Node(n) => &n.tag,
            ElementRef::Edge(e) => &e.tag,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ElementRef::Node(_) => ElementKind::Node,
            ElementRef::Edge(_) => ElementKind::Edge,
        }
    }

    pub fn bound_data(&self) -> &'a Value {
        match self {
            ElementRef::Node(n) => &n.bound_data,
            ElementRef::Edge(e) => &e.bound_data,
        }
    }
}

/// Plain data representation of one diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    pub id: String,
    #[serde(default, with = "keyed_seq")]
    pub nodes: IndexMap<ElementId, Node>,
    #[serde(default, with = "keyed_seq")]
    pub edges: IndexMap<ElementId, Edge>,
}

impl GraphModel {
    /// An empty model with a fresh UUID.
    pub fn empty() -> Self {
        GraphModel {
            id: ElementId::generate().0,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    /// Builds a model from element lists, rejecting duplicate ids.
    pub fn from_parts(
        id: impl Into<String>,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Result<Self, DiagramError> {
        let mut model = GraphModel {
            id: id.into(),
            nodes: IndexMap::with_capacity(nodes.len()),
            edges: IndexMap::with_capacity(edges.len()),
        };
        for node in nodes {
            if model.nodes.contains_key(&node.id) {
                return Err(DiagramError::DuplicateId { id: node.id });
            }
            model.nodes.insert(node.id.clone(), node);
        }
        for edge in edges {
            if model.edges.contains_key(&edge.id) {
                return Err(DiagramError::DuplicateId { id: edge.id });
            }
            model.edges.insert(edge.id.clone(), edge);
        }
        model.check()?;
        Ok(model)
    }

    /// Verifies cross-element consistency: ids unique across nodes and
    /// edges, every edge endpoint an existing node.
    pub fn check(&self) -> Result<(), DiagramError> {
        if let Some(id) = self.edges.keys().find(|id| self.nodes.contains_key(*id)) {
            return Err(DiagramError::DuplicateId { id: id.clone() });
        }
        for edge in self.edges.values() {
            for endpoint in [&edge.source_id, &edge.target_id] {
                if !self.nodes.contains_key(endpoint) {
                    return Err(DiagramError::DanglingReference {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn contains(&self, id: &ElementId) -> bool {
        self.nodes.contains_key(id) || self.edges.contains_key(id)
    }

    pub fn element(&self, id: &ElementId) -> Option<ElementRef<'_>> {
        self.nodes
            .get(id)
            .map(ElementRef::Node)
            .or_else(|| self.edges.get(id).map(ElementRef::Edge))
    }

    /// Number of elements of `kind` carrying `tag`. Node and edge types are
    /// separate namespaces, so a node type never counts toward an edge type.
    pub fn count_of(&self, kind: ElementKind, tag: &TypeTag) -> usize {
        match kind {
            ElementKind::Node => self.nodes.values().filter(|n| &n.tag == tag).count(),
            ElementKind::Edge => self.edges.values().filter(|e| &e.tag == tag).count(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Anything stored in a [`GraphModel`] map under its own id.
pub trait Keyed {
    fn key(&self) -> &ElementId;
}

impl Keyed for Node {
    fn key(&self) -> &ElementId {
        &self.id
    }
}

impl Keyed for Edge {
    fn key(&self) -> &ElementId {
        &self.id
    }
}

/// Serializes an id-keyed map as a plain JSON array of its values.
mod keyed_seq {
    use indexmap::IndexMap;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Keyed;
    use crate::id::ElementId;

    pub fn serialize<T, S>(map: &IndexMap<ElementId, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<IndexMap<ElementId, T>, D::Error>
    where
        T: Deserialize<'de> + Keyed,
        D: Deserializer<'de>,
    {
        let items = Vec::<T>::deserialize(deserializer)?;
        let mut map = IndexMap::with_capacity(items.len());
        for item in items {
            let id = item.key().clone();
            if map.insert(id.clone(), item).is_some() {
                return Err(D::Error::custom(format!("duplicate element id: '{id}'")));
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node(id: &str) -> Node {
        Node::new(ElementId::from(id), TypeTag::from("entity"), Point::ORIGIN)
    }

    fn edge(id: &str, s: &str, t: &str) -> Edge {
        Edge::new(ElementId::from(id), TypeTag::from("link"), ElementId::from(s), ElementId::from(t))
    }

    #[test]
    fn wire_form_uses_arrays_and_camel_case() {
        let model = GraphModel::from_parts("m1", vec![node("a"), node("b")], vec![edge("e", "a", "b")]).unwrap();
        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["nodes"][0]["id"], json!("a"));
        assert_eq!(value["nodes"][0]["type"], json!("entity"));
        assert_eq!(value["nodes"][0]["boundData"], json!({}));
        assert_eq!(value["edges"][0]["sourceId"], json!("a"));
        assert_eq!(value["edges"][0]["routingPoints"], json!([]));
        assert!(value["nodes"][0].get("size").is_none());
    }

    #[test]
    fn accepts_model_alias_and_missing_fields() {
        let model: GraphModel = serde_json::from_value(json!({
            "id": "m",
            "nodes": [{"id": "n", "type": "entity", "position": {"x": 1, "y": 2}, "model": {"name": "A"}}]
        }))
        .unwrap();
        let n = &model.nodes["n"];
        assert_eq!(n.bound_data, json!({"name": "A"}));
        assert_eq!(n.position, Point::new(1.0, 2.0));
        assert_eq!(n.effective_size(), Dimension { width: 50.0, height: 25.0 });
        assert!(model.edges.is_empty());
    }

    #[test]
    fn duplicate_ids_fail_deserialization() {
        let result: Result<GraphModel, _> = serde_json::from_value(json!({
            "id": "m",
            "nodes": [{"id": "n"}, {"id": "n"}]
        }));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate element id"), "{err}");
    }

    #[test]
    fn check_rejects_dangling_and_shared_ids() {
        let err = GraphModel::from_parts("m", vec![node("a")], vec![edge("e", "a", "zz")]).unwrap_err();
        assert!(matches!(err, DiagramError::DanglingReference { ref node, .. } if node.as_str() == "zz"));

        let err = GraphModel::from_parts("m", vec![node("a"), node("x")], vec![edge("a", "a", "x")]).unwrap_err();
        assert!(matches!(err, DiagramError::DuplicateId { .. }));
    }

    #[test]
    fn count_of_separates_nodes_and_edges() {
        let model = GraphModel::from_parts("m", vec![node("a"), node("b")], vec![edge("e", "a", "b")]).unwrap();
        assert_eq!(model.count_of(ElementKind::Node, &TypeTag::from("entity")), 2);
        assert_eq!(model.count_of(ElementKind::Edge, &TypeTag::from("entity")), 0);
        assert_eq!(model.count_of(ElementKind::Edge, &TypeTag::from("link")), 1);
        assert_eq!(model.count_of(ElementKind::Node, &TypeTag::from("link")), 0);
        assert_eq!(model.count_of(ElementKind::Node, &TypeTag::from("other")), 0);
        assert_eq!(model.element(&ElementId::from("e")).map(|e| e.kind()), Some(ElementKind::Edge));
    }

    #[test]
    fn empty_model_has_uuid_id() {
        let model = GraphModel::empty();
        assert!(uuid::Uuid::parse_str(&model.id).is_ok());
        assert!(model.is_empty());
    }
}
