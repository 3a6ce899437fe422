//! Rendered visual tree handed to the client.
//!
//! Visual elements are produced, never persisted: every resolution pass
//! rebuilds the whole tree from the graph model and the language.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::ElementId;

/// One rendered element. `kind` is the template's declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<VisualElement>,
}

impl VisualElement {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        VisualElement {
            id: id.into(),
            kind: kind.into(),
            properties: Map::new(),
            args: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Depth-first walk over this element and its descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a VisualElement, Option<&'a VisualElement>)) {
        fn go<'a>(
            element: &'a VisualElement,
            parent: Option<&'a VisualElement>,
            visit: &mut impl FnMut(&'a VisualElement, Option<&'a VisualElement>),
        ) {
            visit(element, parent);
            for child in &element.children {
                go(child, Some(element), visit);
            }
        }
        go(self, None, visit);
    }

    /// Finds a descendant (or self) by id.
    pub fn find(&self, id: &str) -> Option<&VisualElement> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// A condition that failed to evaluate during resolution and was treated
/// as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub element_id: ElementId,
    /// Visual id the decision would have produced.
    pub template_id: String,
    pub reason: String,
}

/// The root of a rendered diagram: one child per model node and edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualGraph {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub children: Vec<VisualElement>,
}

impl VisualGraph {
    pub fn new(id: impl Into<String>, children: Vec<VisualElement>) -> Self {
        VisualGraph {
            id: id.into(),
            kind: "graph".to_string(),
            children,
        }
    }

    pub fn find(&self, id: &str) -> Option<&VisualElement> {
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Output of one full resolution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendered {
    pub graph: VisualGraph,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn properties_flatten_into_the_element() {
        let mut label = VisualElement::new("n_child0", "label");
        label.properties.insert("text".into(), json!("Order"));
        label.args.insert("textBind".into(), json!("name"));
        let mut node = VisualElement::new("n", "node");
        node.children.push(label);

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "n",
                "type": "node",
                "children": [{
                    "id": "n_child0",
                    "type": "label",
                    "text": "Order",
                    "args": {"textBind": "name"}
                }]
            })
        );
    }

    #[test]
    fn walk_reports_parents() {
        let mut node = VisualElement::new("n", "node");
        node.children.push(VisualElement::new("n_child0", "comp"));
        node.children[0].children.push(VisualElement::new("n_child0_child0", "label"));

        let mut seen = Vec::new();
        node.walk(&mut |element, parent| seen.push((element.id.clone(), parent.map(|p| p.id.clone()))));
        assert_eq!(
            seen,
            vec![
                ("n".to_string(), None),
                ("n_child0".to_string(), Some("n".to_string())),
                ("n_child0_child0".to_string(), Some("n_child0".to_string())),
            ]
        );
        assert!(node.find("n_child0_child0").is_some());
        assert!(node.find("missing").is_none());
    }
}
