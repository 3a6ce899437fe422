//! The visual binding resolver: interprets compiled templates against each
//! element's bound data to produce the visual tree.
//!
//! Resolution is a pure function of the graph model and the language, so
//! resolving the same inputs twice yields identical trees. Child ids are
//! derived from the parent id and the template slot:
//!
//! - plain child at slot `i`: `<parent>_child<i>`
//! - iteration item `k` at slot `i`: `<parent>_child<i>_<iterand><k>`
//! - decision branch at slot `i`: takes the decision's own slot id
//!
//! Binding misses degrade to `undefined` (the property is omitted). Failed
//! conditions degrade to `false` and are reported as [`Diagnostic`]s.

use std::borrow::Cow;

use serde_json::{json, Value};

use crate::binding::Scope;
use crate::error::DiagramError;
use crate::id::{ElementId, TypeTag};
use crate::language::{default_template, Language};
use crate::model::{Edge, ElementKind, GraphModel, Node};
use crate::template::{PlainTemplate, PropertyTemplate, Template};
use crate::visual::{Diagnostic, Rendered, VisualElement, VisualGraph};

/// Resolves graph model elements against one language.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'l> {
    language: &'l Language,
}

impl<'l> Resolver<'l> {
    pub fn new(language: &'l Language) -> Self {
        Resolver { language }
    }

    /// Resolves every node, then every edge, in model order.
    pub fn resolve_model(&self, model: &GraphModel) -> Result<Rendered, DiagramError> {
        let mut diagnostics = Vec::new();
        let mut children = Vec::with_capacity(model.len());
        for node in model.nodes.values() {
            children.push(self.resolve_node(node, &mut diagnostics)?);
        }
        for edge in model.edges.values() {
            children.push(self.resolve_edge(edge, &mut diagnostics)?);
        }
        Ok(Rendered {
            graph: VisualGraph::new(model.id.clone(), children),
            diagnostics,
        })
    }

    pub fn resolve_node(
        &self,
        node: &Node,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<VisualElement, DiagramError> {
        let template = self.template_for(ElementKind::Node, &node.id, &node.tag, diagnostics);
        let mut pass = Pass {
            element: &node.id,
            diagnostics,
        };
        let mut root = pass.render_plain(&template, node.id.to_string(), &Scope::new(&node.bound_data))?;
        let size = node.effective_size();
        root.properties.insert("position".into(), json!({"x": node.position.x, "y": node.position.y}));
        root.properties.insert("size".into(), json!({"width": size.width, "height": size.height}));
        Ok(root)
    }

    pub fn resolve_edge(
        &self,
        edge: &Edge,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<VisualElement, DiagramError> {
        let template = self.template_for(ElementKind::Edge, &edge.id, &edge.tag, diagnostics);
        let mut pass = Pass {
            element: &edge.id,
            diagnostics,
        };
        let mut root = pass.render_plain(&template, edge.id.to_string(), &Scope::new(&edge.bound_data))?;
        root.properties.insert("sourceId".into(), Value::String(edge.source_id.to_string()));
        root.properties.insert("targetId".into(), Value::String(edge.target_id.to_string()));
        root.properties.insert(
            "routingPoints".into(),
            Value::Array(
                edge.routing_points
                    .iter()
                    .map(|p| json!({"x": p.x, "y": p.y}))
                    .collect(),
            ),
        );
        Ok(root)
    }

    /// The element type's template, or default visuals for untyped and
    /// unknown types. Unknown types are reported.
    fn template_for(
        &self,
        kind: ElementKind,
        id: &ElementId,
        tag: &TypeTag,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Cow<'l, PlainTemplate> {
        let bare = match kind {
            ElementKind::Node => "node",
            ElementKind::Edge => "edge",
        };
        if tag.is_untyped() {
            return Cow::Owned(PlainTemplate::bare(bare));
        }
        match self.language.element_of(kind, tag) {
            Some(element) => Cow::Borrowed(&element.template),
            None => {
                tracing::warn!(element = %id, tag = %tag, "unknown type; rendering fallback visuals");
                diagnostics.push(Diagnostic {
                    element_id: id.clone(),
                    template_id: id.to_string(),
                    reason: format!("unknown type: '{tag}'"),
                });
                Cow::Owned(default_template(kind, tag.as_str()))
            }
        }
    }
}

/// State of one element's resolution.
struct Pass<'p> {
    element: &'p ElementId,
    diagnostics: &'p mut Vec<Diagnostic>,
}

impl Pass<'_> {
    fn render_plain(
        &mut self,
        template: &PlainTemplate,
        id: String,
        scope: &Scope<'_>,
    ) -> Result<VisualElement, DiagramError> {
        let mut element = VisualElement::new(id, template.kind.clone());
        for (name, value) in &template.args {
            element.args.insert(name.clone(), value.clone());
        }

        for (name, property) in &template.properties {
            match property {
                PropertyTemplate::Literal(value) => {
                    element.properties.insert(name.clone(), value.clone());
                }
                PropertyTemplate::Bound(text) => {
                    if let Some(value) = scope.render(text) {
                        element.properties.insert(name.clone(), value);
                    }
                    let bound_path = scope.concrete(text.primary_path());
                    element
                        .args
                        .insert(format!("{name}Bind"), Value::String(bound_path.to_string()));
                }
            }
        }

        let mut children = Vec::with_capacity(template.children.len());
        for (slot, child) in template.children.iter().enumerate() {
            self.expand(child, &element.id, format!("child{slot}"), scope, &mut children)?;
        }
        element.children = children;
        Ok(element)
    }

    fn expand(
        &mut self,
        template: &Template,
        parent_id: &str,
        slot: String,
        scope: &Scope<'_>,
        out: &mut Vec<VisualElement>,
    ) -> Result<(), DiagramError> {
        match template {
            Template::Plain(plain) => {
                out.push(self.render_plain(plain, format!("{parent_id}_{slot}"), scope)?);
            }
            Template::Iteration {
                iterable,
                iterand,
                template,
            } => {
                let (path, value) = scope.lookup(iterable);
                let count = match value {
                    None | Some(Value::Null) => 0,
                    Some(Value::Array(items)) => items.len(),
                    Some(_) => return Err(DiagramError::template("iteration iterable must be an array")),
                };
                for i in 0..count {
                    let inner = scope.with_iterand(iterand, path.indexed(i));
                    self.expand(template, parent_id, format!("{slot}_{iterand}{i}"), &inner, out)?;
                }
            }
            Template::Decision {
                condition,
                then,
                otherwise,
            } => {
                let (holds, failure) = condition.holds(scope);
                if let Some(err) = failure {
                    let template_id = format!("{parent_id}_{slot}");
                    tracing::warn!(
                        element = %self.element,
                        template = %template_id,
                        error = %err,
                        "condition evaluation failed; treating as false"
                    );
                    self.diagnostics.push(Diagnostic {
                        element_id: self.element.clone(),
                        template_id,
                        reason: err.to_string(),
                    });
                }
                let branch = if holds { Some(then) } else { otherwise.as_ref() };
                if let Some(branch) = branch {
                    self.expand(branch, parent_id, slot, scope, out)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::Point;

    fn language(node_template: Value) -> Language {
        Language::from_json(json!({
            "id": "lang",
            "nodes": {"class": {"label": "Class", "visualTemplate": node_template}},
            "edges": {"assoc": {"label": "Association"}}
        }))
        .unwrap()
    }

    fn node(data: Value) -> Node {
        let mut node = Node::new(ElementId::from("n1"), TypeTag::from("class"), Point::new(10.0, 20.0));
        node.bound_data = data;
        node
    }

    fn render(language: &Language, node: &Node) -> (VisualElement, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let element = Resolver::new(language).resolve_node(node, &mut diagnostics).unwrap();
        (element, diagnostics)
    }

    #[test]
    fn binds_properties_and_records_paths() {
        let lang = language(json!({
            "type": "node",
            "children": [
                {"type": "label", "text": "${name}"},
                {"type": "label", "text": "<<${stereotype}>> ${name}"},
                {"type": "label", "text": "${missing}"},
                {"type": "label", "text": "static"}
            ]
        }));
        let (root, diagnostics) = render(&lang, &node(json!({"name": "Order", "stereotype": "entity"})));
        assert!(diagnostics.is_empty());
        assert_eq!(root.id, "n1");
        assert_eq!(root.properties["position"], json!({"x": 10.0, "y": 20.0}));
        assert_eq!(root.properties["size"], json!({"width": 50.0, "height": 25.0}));

        let labels = &root.children;
        assert_eq!(labels[0].id, "n1_child0");
        assert_eq!(labels[0].properties["text"], json!("Order"));
        assert_eq!(labels[0].args["textBind"], json!("name"));
        assert_eq!(labels[1].properties["text"], json!("<<entity>> Order"));
        assert_eq!(labels[1].args["textBind"], json!("stereotype"));
        assert!(labels[2].properties.get("text").is_none());
        assert_eq!(labels[2].args["textBind"], json!("missing"));
        assert_eq!(labels[3].properties["text"], json!("static"));
        assert!(labels[3].args.is_empty());
    }

    #[test]
    fn iteration_substitutes_concrete_paths() {
        let lang = language(json!({
            "type": "node",
            "children": [{
                "type": "iteration",
                "iterable": "${attributes}",
                "iterand": "attribute",
                "template": {"type": "label", "text": "${attribute.name}"}
            }]
        }));
        let data = json!({"attributes": [{"name": "id"}, {"name": "total"}, {"name": "date"}]});
        let (root, _) = render(&lang, &node(data));

        assert_eq!(root.children.len(), 3);
        for (i, (child, name)) in root.children.iter().zip(["id", "total", "date"]).enumerate() {
            assert_eq!(child.id, format!("n1_child0_attribute{i}"));
            assert_eq!(child.properties["text"], json!(name));
            assert_eq!(child.args["textBind"], json!(format!("attributes[{i}].name")));
        }
    }

    #[test]
    fn nested_iterations_see_outer_iterand() {
        let lang = language(json!({
            "type": "node",
            "children": [{
                "type": "iteration",
                "iterable": "${groups}",
                "iterand": "group",
                "template": {
                    "type": "comp",
                    "children": [{
                        "type": "iteration",
                        "iterable": "${group.items}",
                        "iterand": "item",
                        "template": {"type": "label", "text": "${group.title}/${item}"}
                    }]
                }
            }]
        }));
        let data = json!({"groups": [{"title": "a", "items": ["x", "y"]}, {"title": "b", "items": ["z"]}]});
        let (root, _) = render(&lang, &node(data));

        assert_eq!(root.children.len(), 2);
        let second = &root.children[1];
        assert_eq!(second.id, "n1_child0_group1");
        assert_eq!(second.children[0].id, "n1_child0_group1_child0_item0");
        assert_eq!(second.children[0].properties["text"], json!("b/z"));
        assert_eq!(second.children[0].args["textBind"], json!("groups[1].title"));
        assert_eq!(root.children[0].children.len(), 2);
    }

    #[test]
    fn missing_or_null_iterable_yields_no_children() {
        let lang = language(json!({
            "type": "node",
            "children": [{"type": "iteration", "iterable": "${xs}", "iterand": "x", "template": {"type": "label"}}]
        }));
        assert!(render(&lang, &node(json!({}))).0.children.is_empty());
        assert!(render(&lang, &node(json!({"xs": null}))).0.children.is_empty());
    }

    #[test]
    fn non_array_iterable_is_template_error() {
        let lang = language(json!({
            "type": "node",
            "children": [{"type": "iteration", "iterable": "${xs}", "iterand": "x", "template": {"type": "label"}}]
        }));
        let err = Resolver::new(&lang)
            .resolve_node(&node(json!({"xs": "nope"})), &mut Vec::new())
            .unwrap_err();
        let DiagramError::TemplateError { reason } = err else {
            panic!("expected template error");
        };
        assert_eq!(reason, "iteration iterable must be an array");
    }

    #[test]
    fn decision_picks_branch_or_nothing() {
        let with_else = language(json!({
            "type": "node",
            "children": [{
                "type": "decision",
                "condition": {"eq": {"left": "${abstract}", "right": true}},
                "then": {"type": "label", "text": "abstract"},
                "else": {"type": "label", "text": "concrete"}
            }]
        }));
        let (root, _) = render(&with_else, &node(json!({"abstract": false})));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id, "n1_child0");
        assert_eq!(root.children[0].properties["text"], json!("concrete"));

        let without_else = language(json!({
            "type": "node",
            "children": [{
                "type": "decision",
                "condition": {"eq": {"left": "${abstract}", "right": true}},
                "then": {"type": "label", "text": "abstract"}
            }]
        }));
        assert!(render(&without_else, &node(json!({"abstract": false}))).0.children.is_empty());
        assert_eq!(render(&without_else, &node(json!({"abstract": true}))).0.children.len(), 1);
    }

    #[test]
    fn failing_condition_is_false_with_diagnostic() {
        let lang = language(json!({
            "type": "node",
            "children": [{
                "type": "decision",
                "condition": {"between": {"left": "${age}", "right": "adult"}},
                "then": {"type": "label", "text": "in range"}
            }]
        }));
        let (root, diagnostics) = render(&lang, &node(json!({"age": 30})));
        assert!(root.children.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].element_id, ElementId::from("n1"));
        assert_eq!(diagnostics[0].template_id, "n1_child0");
    }

    #[test]
    fn unknown_and_untyped_elements_fall_back() {
        let lang = language(json!({"type": "node"}));
        let mut stale = node(json!({}));
        stale.tag = TypeTag::from("removed");
        let (root, diagnostics) = render(&lang, &stale);
        assert_eq!(root.kind, "node");
        assert_eq!(root.children[0].properties["text"], json!("removed"));
        assert_eq!(diagnostics.len(), 1);

        let mut anchor = node(json!({}));
        anchor.tag = TypeTag::default();
        let (root, diagnostics) = render(&lang, &anchor);
        assert!(root.children.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn edges_carry_endpoints_and_routing() {
        let lang = language(json!({"type": "node"}));
        let mut edge = Edge::new(
            ElementId::from("e1"),
            TypeTag::from("assoc"),
            ElementId::from("a"),
            ElementId::from("b"),
        );
        edge.routing_points.push(Point::new(1.0, 2.0));
        let root = Resolver::new(&lang).resolve_edge(&edge, &mut Vec::new()).unwrap();
        assert_eq!(root.kind, "edge");
        assert_eq!(root.properties["sourceId"], json!("a"));
        assert_eq!(root.properties["targetId"], json!("b"));
        assert_eq!(root.properties["routingPoints"], json!([{"x": 1.0, "y": 2.0}]));
        assert_eq!(root.children[0].id, "e1_child0");
        assert_eq!(root.children[0].properties["text"], json!("Association"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let lang = language(json!({
            "type": "node",
            "children": [{"type": "iteration", "iterable": "${xs}", "iterand": "x", "template": {"type": "label", "text": "${x}"}}]
        }));
        let model = GraphModel::from_parts("m", vec![node(json!({"xs": [1, 2]}))], vec![]).unwrap();
        let resolver = Resolver::new(&lang);
        assert_eq!(resolver.resolve_model(&model).unwrap(), resolver.resolve_model(&model).unwrap());
    }
}
