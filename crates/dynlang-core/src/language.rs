//! Languages: the catalog of node and edge types.
//!
//! A [`LanguageDocument`] is the wire form a language provider returns. It
//! is compiled once into a [`Language`], which owns parsed templates and is
//! shared read-only (behind an `Arc`) by every session editing a model of
//! that language.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DiagramError;
use crate::id::TypeTag;
use crate::model::ElementKind;
use crate::schema::AttributeSchema;
use crate::template::PlainTemplate;

/// Placeholder replaced by a per-type counter when defaults are instantiated.
pub const AUTOINCREMENT: &str = "${autoincrement}";

fn default_version() -> u32 {
    1
}

/// One node or edge type as written by a language author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDocument {
    #[serde(default)]
    pub label: String,
    #[serde(default, alias = "gModel", skip_serializing_if = "Option::is_none")]
    pub visual_template: Option<Value>,
    #[serde(default, alias = "aModel", skip_serializing_if = "Option::is_none")]
    pub attribute_schema: Option<AttributeSchema>,
    #[serde(default, alias = "default", skip_serializing_if = "Option::is_none")]
    pub default_model: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

/// Wire form of a language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDocument {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub nodes: IndexMap<TypeTag, ElementDocument>,
    #[serde(default)]
    pub edges: IndexMap<TypeTag, ElementDocument>,
}

/// A compiled node or edge type.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageElement {
    pub tag: TypeTag,
    pub kind: ElementKind,
    pub label: String,
    pub template: PlainTemplate,
    pub schema: Option<AttributeSchema>,
    pub default_model: Option<Value>,
    pub constraints: Vec<Value>,
    pub preview: Option<String>,
}

impl LanguageElement {
    fn compile(tag: &TypeTag, kind: ElementKind, doc: &ElementDocument) -> Result<Self, DiagramError> {
        let template = match &doc.visual_template {
            Some(value) => PlainTemplate::compile_root(value).map_err(|err| match err {
                DiagramError::TemplateError { reason } => {
                    DiagramError::template(format!("type '{tag}': {reason}"))
                }
                other => other,
            })?,
            None => default_template(kind, &doc.label),
        };
        Ok(LanguageElement {
            tag: tag.clone(),
            kind,
            label: doc.label.clone(),
            template,
            schema: doc.attribute_schema.clone(),
            default_model: doc.default_model.clone(),
            constraints: doc.constraints.clone(),
            preview: doc.preview.clone(),
        })
    }

    /// Instantiates the default bound data for a new element.
    ///
    /// Every `${autoincrement}` inside string values is replaced by
    /// `autoincrement`. A type without a default model yields `{}`.
    pub fn instantiate_default(&self, autoincrement: usize) -> Value {
        match &self.default_model {
            Some(value) => expand_autoincrement(value, &autoincrement.to_string()),
            None => Value::Object(Map::new()),
        }
    }
}

fn expand_autoincrement(value: &Value, counter: &str) -> Value {
    match value {
        Value::String(s) if s.contains(AUTOINCREMENT) => Value::String(s.replace(AUTOINCREMENT, counter)),
        Value::Array(items) => Value::Array(items.iter().map(|v| expand_autoincrement(v, counter)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), expand_autoincrement(v, counter)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Visuals for a type declared without a visual template: the element kind
/// with a single label showing the type's label.
pub(crate) fn default_template(kind: ElementKind, text: &str) -> PlainTemplate {
    let root = match kind {
        ElementKind::Node => PlainTemplate::bare("node"),
        ElementKind::Edge => PlainTemplate::bare("edge"),
    };
    root.with_child(PlainTemplate::bare("label").with_property("text", Value::String(text.to_string())))
}

/// A compiled, immutable language.
#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub id: String,
    pub name: String,
    pub version: u32,
    nodes: IndexMap<TypeTag, LanguageElement>,
    edges: IndexMap<TypeTag, LanguageElement>,
    document: LanguageDocument,
}

impl Language {
    /// Compiles every element template; any malformed template fails the
    /// whole language with `TemplateError`.
    pub fn compile(document: LanguageDocument) -> Result<Self, DiagramError> {
        let nodes = document
            .nodes
            .iter()
            .map(|(tag, doc)| Ok((tag.clone(), LanguageElement::compile(tag, ElementKind::Node, doc)?)))
            .collect::<Result<IndexMap<_, _>, DiagramError>>()?;
        let edges = document
            .edges
            .iter()
            .map(|(tag, doc)| Ok((tag.clone(), LanguageElement::compile(tag, ElementKind::Edge, doc)?)))
            .collect::<Result<IndexMap<_, _>, DiagramError>>()?;

        tracing::debug!(
            language = %document.id,
            nodes = nodes.len(),
            edges = edges.len(),
            "compiled language"
        );

        Ok(Language {
            id: document.id.clone(),
            name: document.name.clone(),
            version: document.version,
            nodes,
            edges,
            document,
        })
    }

    /// Parses and compiles a JSON language document.
    pub fn from_json(value: Value) -> Result<Self, DiagramError> {
        let document: LanguageDocument = serde_json::from_value(value)
            .map_err(|e| DiagramError::template(format!("invalid language document: {e}")))?;
        Language::compile(document)
    }

    pub fn node(&self, tag: &TypeTag) -> Option<&LanguageElement> {
        self.nodes.get(tag)
    }

    pub fn edge(&self, tag: &TypeTag) -> Option<&LanguageElement> {
        self.edges.get(tag)
    }

    /// Looks up a type among nodes first, then edges.
    pub fn element(&self, tag: &TypeTag) -> Option<&LanguageElement> {
        self.node(tag).or_else(|| self.edge(tag))
    }

    pub fn element_of(&self, kind: ElementKind, tag: &TypeTag) -> Option<&LanguageElement> {
        match kind {
            ElementKind::Node => self.node(tag),
            ElementKind::Edge => self.edge(tag),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &LanguageElement> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &LanguageElement> {
        self.edges.values()
    }

    /// The document this language was compiled from.
    pub fn document(&self) -> &LanguageDocument {
        &self.document
    }

    /// Cache key combining id and version.
    pub fn cache_key(&self) -> String {
        format!("{}@{}", self.id, self.version)
    }
}
