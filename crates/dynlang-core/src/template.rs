//! Visual templates compiled from a language's JSON visual schema.
//!
//! A template tree is a closed union of three shapes:
//!
//! - [`PlainTemplate`]: a visual element of some declared `type` (`node`,
//!   `label`, `comp`, ...) with properties, literal args and children.
//! - `Iteration`: repeats its `template` once per element of the array bound
//!   by `iterable`, exposing the element under the `iterand` name.
//! - `Decision`: renders `then` or `else` depending on a [`Condition`].
//!
//! Iterations and decisions are elided from the rendered tree; their output
//! is spliced into the enclosing plain element's children. Every binding
//! string and condition is parsed here, once, so rendering never re-parses.

use serde_json::{Map, Value};

use crate::binding::{BindingPath, BoundText};
use crate::condition::Condition;
use crate::error::DiagramError;

/// Template `type` value marking an iteration.
pub const ITERATION: &str = "iteration";
/// Template `type` value marking a decision.
pub const DECISION: &str = "decision";

/// Keys of a plain template that are structure, not properties.
const RESERVED: [&str; 4] = ["type", "children", "args", "id"];

/// A property of a plain template.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyTemplate {
    /// Copied verbatim into the rendered element.
    Literal(Value),
    /// Resolved against bound data; the path is recorded as `<name>Bind`.
    Bound(BoundText),
}

/// A visual element template that renders to exactly one element.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainTemplate {
    pub kind: String,
    pub properties: Vec<(String, PropertyTemplate)>,
    pub args: Map<String, Value>,
    pub children: Vec<Template>,
}

/// Any node of a template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    Plain(PlainTemplate),
    Iteration {
        iterable: BindingPath,
        iterand: String,
        template: Box<Template>,
    },
    Decision {
        condition: Condition,
        then: Box<Template>,
        otherwise: Option<Box<Template>>,
    },
}

impl Template {
    /// Compiles one template node and its subtree.
    pub fn compile(value: &Value) -> Result<Template, DiagramError> {
        let map = value
            .as_object()
            .ok_or_else(|| DiagramError::template(format!("template must be an object, got {value}")))?;
        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DiagramError::template("template is missing a string 'type'"))?;

        match kind {
            ITERATION => compile_iteration(map),
            DECISION => compile_decision(map),
            _ => PlainTemplate::compile_fields(kind, map).map(Template::Plain),
        }
    }
}

impl PlainTemplate {
    /// Compiles a root template, which must be a plain element.
    pub fn compile_root(value: &Value) -> Result<PlainTemplate, DiagramError> {
        match Template::compile(value)? {
            Template::Plain(plain) => Ok(plain),
            Template::Iteration { .. } => Err(DiagramError::template("template root cannot be an iteration")),
            Template::Decision { .. } => Err(DiagramError::template("template root cannot be a decision")),
        }
    }

    /// A childless template of the given kind.
    pub fn bare(kind: impl Into<String>) -> Self {
        PlainTemplate {
            kind: kind.into(),
            properties: Vec::new(),
            args: Map::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style: appends a literal property.
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.push((name.into(), PropertyTemplate::Literal(value)));
        self
    }

    /// Builder-style: appends a child.
    pub fn with_child(mut self, child: PlainTemplate) -> Self {
        self.children.push(Template::Plain(child));
        self
    }

    /// Literal text of the `text` property, if any.
    pub fn literal_text(&self) -> Option<&str> {
        self.properties.iter().find_map(|(name, property)| match property {
            PropertyTemplate::Literal(Value::String(s)) if name == "text" => Some(s.as_str()),
            _ => None,
        })
    }

    fn compile_fields(kind: &str, map: &Map<String, Value>) -> Result<PlainTemplate, DiagramError> {
        let mut properties = Vec::new();
        for (name, value) in map {
            if RESERVED.contains(&name.as_str()) {
                continue;
            }
            let property = match value {
                Value::String(s) => match BoundText::parse(s)? {
                    Some(text) => PropertyTemplate::Bound(text),
                    None => PropertyTemplate::Literal(value.clone()),
                },
                other => PropertyTemplate::Literal(other.clone()),
            };
            properties.push((name.clone(), property));
        }

        let args = match map.get("args") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(args)) => args.clone(),
            Some(other) => return Err(DiagramError::template(format!("'args' must be an object, got {other}"))),
        };

        let children = match map.get("children") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(Template::compile).collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(DiagramError::template(format!("'children' must be an array, got {other}")))
            }
        };

        Ok(PlainTemplate {
            kind: kind.to_string(),
            properties,
            args,
            children,
        })
    }
}

fn compile_iteration(map: &Map<String, Value>) -> Result<Template, DiagramError> {
    let iterable = map
        .get("iterable")
        .and_then(Value::as_str)
        .ok_or_else(|| DiagramError::template("iteration is missing 'iterable'"))?;
    let iterable = match BoundText::parse(iterable)? {
        Some(BoundText::Single(path)) => path,
        Some(BoundText::Interpolated { .. }) => {
            return Err(DiagramError::template(format!(
                "iteration iterable '{iterable}' must be a single binding"
            )))
        }
        // a bare path without `${}` is accepted as-is
        None => BindingPath::parse(iterable)?,
    };

    let iterand = map
        .get("iterand")
        .and_then(Value::as_str)
        .ok_or_else(|| DiagramError::template("iteration is missing 'iterand'"))?;
    if iterand.is_empty() || iterand.contains(|c: char| matches!(c, '.' | '[' | ']' | '$' | '{' | '}')) {
        return Err(DiagramError::template(format!("invalid iterand name '{iterand}'")));
    }

    let template = map
        .get("template")
        .ok_or_else(|| DiagramError::template("iteration is missing 'template'"))?;

    Ok(Template::Iteration {
        iterable,
        iterand: iterand.to_string(),
        template: Box::new(Template::compile(template)?),
    })
}

fn compile_decision(map: &Map<String, Value>) -> Result<Template, DiagramError> {
    let condition = map
        .get("condition")
        .ok_or_else(|| DiagramError::template("decision is missing 'condition'"))?;
    let then = map
        .get("then")
        .ok_or_else(|| DiagramError::template("decision is missing 'then'"))?;
    let otherwise = match map.get("else") {
        None | Some(Value::Null) => None,
        Some(branch) => Some(Box::new(Template::compile(branch)?)),
    };

    Ok(Template::Decision {
        condition: Condition::compile(condition),
        then: Box::new(Template::compile(then)?),
        otherwise,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_template_splits_properties_and_structure() {
        let root = PlainTemplate::compile_root(&json!({
            "type": "node",
            "id": "ignored",
            "layout": "vbox",
            "args": {"radius": 5},
            "children": [{"type": "label", "text": "${name}"}]
        }))
        .unwrap();

        assert_eq!(root.kind, "node");
        assert_eq!(
            root.properties,
            vec![("layout".to_string(), PropertyTemplate::Literal(json!("vbox")))]
        );
        assert_eq!(root.args.get("radius"), Some(&json!(5)));
        let Template::Plain(label) = &root.children[0] else {
            panic!("expected plain child");
        };
        assert!(matches!(
            &label.properties[0],
            (name, PropertyTemplate::Bound(BoundText::Single(_))) if name == "text"
        ));
    }

    #[test]
    fn iteration_and_decision_compile() {
        let template = Template::compile(&json!({
            "type": "iteration",
            "iterable": "${attributes}",
            "iterand": "attribute",
            "template": {
                "type": "decision",
                "condition": "${attribute.visible}",
                "then": {"type": "label", "text": "${attribute.name}"}
            }
        }))
        .unwrap();

        let Template::Iteration { iterable, iterand, template } = template else {
            panic!("expected iteration");
        };
        assert_eq!(iterable.to_string(), "attributes");
        assert_eq!(iterand, "attribute");
        assert!(matches!(*template, Template::Decision { otherwise: None, .. }));
    }

    #[test]
    fn root_must_be_plain() {
        let err = PlainTemplate::compile_root(&json!({
            "type": "decision",
            "condition": true,
            "then": {"type": "node"}
        }))
        .unwrap_err();
        assert!(matches!(err, DiagramError::TemplateError { .. }));
    }

    #[test]
    fn incomplete_iteration_is_rejected() {
        for broken in [
            json!({"type": "iteration", "iterand": "x", "template": {"type": "label"}}),
            json!({"type": "iteration", "iterable": "${xs}", "template": {"type": "label"}}),
            json!({"type": "iteration", "iterable": "${xs}", "iterand": "x"}),
            json!({"type": "iteration", "iterable": "n: ${xs}", "iterand": "x", "template": {"type": "label"}}),
            json!({"type": "iteration", "iterable": "${xs}", "iterand": "x.y", "template": {"type": "label"}}),
        ] {
            assert!(
                matches!(Template::compile(&broken), Err(DiagramError::TemplateError { .. })),
                "expected {broken} to be rejected"
            );
        }
    }

    #[test]
    fn invalid_binding_path_fails_at_compile() {
        let err = Template::compile(&json!({"type": "label", "text": "${a..b}"})).unwrap_err();
        assert!(matches!(err, DiagramError::TemplateError { .. }));
    }

    #[test]
    fn missing_type_is_rejected() {
        assert!(Template::compile(&json!({"text": "x"})).is_err());
        assert!(Template::compile(&json!("node")).is_err());
    }
}
