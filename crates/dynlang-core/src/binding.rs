//! Binding paths: the `${a.b[0].c}` micro-language embedded in templates.
//!
//! A [`BindingPath`] is parsed once when a language is compiled and then
//! walked against an element's bound data on every render pass. Missing keys
//! resolve to `None` (the renderer's `undefined`) instead of failing.
//!
//! [`BoundText`] is the parsed form of a template string property that
//! contains one or more `${...}` placeholders.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use smallvec::SmallVec;
use thiserror::Error;

use crate::error::DiagramError;

/// One step of a binding path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member access (`.name`).
    Field(String),
    /// Array element access (`[3]`).
    Index(usize),
}

/// A parsed dot/bracket path into a JSON value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BindingPath {
    segments: SmallVec<[Segment; 4]>,
}

/// Why a write through a binding path was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    #[error("cannot assign through an empty path")]
    EmptyPath,
    #[error("index {index} out of range at '{at}'")]
    IndexOutOfRange { at: String, index: usize },
    #[error("'{at}' is {found}, not a container")]
    NotAContainer { at: String, found: &'static str },
}

impl BindingPath {
    /// The empty path, addressing the bound data object itself.
    pub fn root() -> Self {
        BindingPath::default()
    }

    /// Parses `a.b[0][1].c`. Whitespace around the whole path is ignored.
    pub fn parse(src: &str) -> Result<Self, DiagramError> {
        let trimmed = src.trim();
        let invalid = |why: &str| DiagramError::template(format!("invalid binding path '{src}': {why}"));
        if trimmed.is_empty() {
            return Err(invalid("empty path"));
        }

        let mut segments = SmallVec::new();
        for (n, raw) in trimmed.split('.').enumerate() {
            let (name, mut rest) = match raw.find('[') {
                Some(pos) => (&raw[..pos], &raw[pos..]),
                None => (raw, ""),
            };
            if name.contains(']') {
                return Err(invalid("unbalanced ']'"));
            }
            if name.is_empty() && (n > 0 || rest.is_empty()) {
                return Err(invalid("empty segment"));
            }
            if !name.is_empty() {
                segments.push(Segment::Field(name.to_string()));
            }
            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
                let index = rest[1..close]
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| invalid("array index must be a non-negative integer"))?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid("unexpected text after ']'"));
                }
            }
        }
        Ok(BindingPath { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns this path extended with an array index.
    pub fn indexed(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        BindingPath { segments }
    }

    /// Replaces a leading `iterand` field with `concrete`.
    ///
    /// `attribute.name` with iterand `attribute` and concrete path
    /// `attributes[0]` becomes `attributes[0].name`. Returns `None` when the
    /// path does not start with the iterand.
    pub fn substitute(&self, iterand: &str, concrete: &BindingPath) -> Option<Self> {
        match self.segments.first() {
            Some(Segment::Field(head)) if head == iterand => {
                let mut segments = concrete.segments.clone();
                segments.extend(self.segments[1..].iter().cloned());
                Some(BindingPath { segments })
            }
            _ => None,
        }
    }

    /// Walks the path through `data`. Any missing step yields `None`.
    pub fn resolve<'v>(&self, data: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(data, |current, segment| match (segment, current) {
                (Segment::Field(name), Value::Object(map)) => map.get(name),
                (Segment::Index(i), Value::Array(items)) => items.get(*i),
                _ => None,
            })
    }

    /// Writes `value` at this path inside `data`.
    ///
    /// Missing or null objects along the way are created; array indices must
    /// already be in range.
    pub fn assign(&self, data: &mut Value, value: Value) -> Result<(), AssignError> {
        let (last, parents) = self.segments.split_last().ok_or(AssignError::EmptyPath)?;

        let mut current = data;
        for (depth, segment) in parents.iter().enumerate() {
            let next_is_index = matches!(self.segments[depth + 1], Segment::Index(_));
            current = self.step_mut(current, segment, depth, next_is_index)?;
        }

        match last {
            Segment::Field(name) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                match current {
                    Value::Object(map) => {
                        map.insert(name.clone(), value);
                        Ok(())
                    }
                    other => Err(AssignError::NotAContainer {
                        at: self.prefix(parents.len()),
                        found: kind_name(other),
                    }),
                }
            }
            Segment::Index(index) => match current {
                Value::Array(items) if *index < items.len() => {
                    items[*index] = value;
                    Ok(())
                }
                Value::Array(_) => Err(AssignError::IndexOutOfRange {
                    at: self.prefix(parents.len()),
                    index: *index,
                }),
                other => Err(AssignError::NotAContainer {
                    at: self.prefix(parents.len()),
                    found: kind_name(other),
                }),
            },
        }
    }

    fn step_mut<'v>(
        &self,
        current: &'v mut Value,
        segment: &Segment,
        depth: usize,
        next_is_index: bool,
    ) -> Result<&'v mut Value, AssignError> {
        match segment {
            Segment::Field(name) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                let found = kind_name(current);
                let map = current.as_object_mut().ok_or_else(|| AssignError::NotAContainer {
                    at: self.prefix(depth),
                    found,
                })?;
                let slot = map.entry(name.clone()).or_insert(Value::Null);
                if slot.is_null() && !next_is_index {
                    *slot = Value::Object(Map::new());
                }
                Ok(slot)
            }
            Segment::Index(index) => {
                let found = kind_name(current);
                let items = current.as_array_mut().ok_or_else(|| AssignError::NotAContainer {
                    at: self.prefix(depth),
                    found,
                })?;
                let len = items.len();
                items.get_mut(*index).ok_or(AssignError::IndexOutOfRange {
                    at: format!("{} (len {len})", self.prefix(depth)),
                    index: *index,
                })
            }
        }
    }

    /// Renders the first `len` segments.
    fn prefix(&self, len: usize) -> String {
        BindingPath {
            segments: self.segments[..len].iter().cloned().collect(),
        }
        .to_string()
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl fmt::Display for BindingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if n == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for BindingPath {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BindingPath::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Bound text
// ---------------------------------------------------------------------------

/// A piece of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum TextPart {
    Literal(String),
    Binding(BindingPath),
}

/// A template string property containing `${...}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundText {
    /// The whole string is one placeholder; resolves to the raw bound value.
    Single(BindingPath),
    /// Literal text mixed with placeholders; resolves to a string.
    /// `primary` is the first placeholder's path.
    Interpolated {
        parts: Vec<TextPart>,
        primary: BindingPath,
    },
}

impl BoundText {
    /// Parses a template string. Returns `Ok(None)` for plain literals.
    pub fn parse(src: &str) -> Result<Option<Self>, DiagramError> {
        if !src.contains("${") {
            return Ok(None);
        }

        let mut parts = Vec::new();
        let mut primary = None;
        let mut rest = src;
        while let Some(open) = rest.find("${") {
            if open > 0 {
                parts.push(TextPart::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 2..];
            let close = after.find('}').ok_or_else(|| {
                DiagramError::template(format!("unclosed placeholder in '{src}'"))
            })?;
            let path = BindingPath::parse(&after[..close])?;
            primary.get_or_insert_with(|| path.clone());
            parts.push(TextPart::Binding(path));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            parts.push(TextPart::Literal(rest.to_string()));
        }

        match (parts.as_slice(), primary) {
            ([TextPart::Binding(path)], _) => Ok(Some(BoundText::Single(path.clone()))),
            (_, Some(primary)) => Ok(Some(BoundText::Interpolated { parts, primary })),
            (_, None) => Ok(None),
        }
    }

    /// The path recorded as the property's `<prop>Bind` argument.
    pub fn primary_path(&self) -> &BindingPath {
        match self {
            BoundText::Single(path) => path,
            BoundText::Interpolated { primary, .. } => primary,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution scope
// ---------------------------------------------------------------------------

/// Bound data plus the stack of active iteration variables.
///
/// Each frame maps an iterand name to the concrete path of the array element
/// it currently stands for. Lookups substitute the innermost matching frame.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    data: &'a Value,
    frames: Vec<(String, BindingPath)>,
}

impl<'a> Scope<'a> {
    pub fn new(data: &'a Value) -> Self {
        Scope {
            data,
            frames: Vec::new(),
        }
    }

    pub fn data(&self) -> &'a Value {
        self.data
    }

    /// Returns a child scope with `iterand` bound to `concrete`.
    pub fn with_iterand(&self, iterand: &str, concrete: BindingPath) -> Scope<'a> {
        let mut frames = self.frames.clone();
        frames.push((iterand.to_string(), concrete));
        Scope {
            data: self.data,
            frames,
        }
    }

    /// Rewrites `path` into a path rooted at the bound data object.
    pub fn concrete(&self, path: &BindingPath) -> BindingPath {
        self.frames
            .iter()
            .rev()
            .find_map(|(iterand, concrete)| path.substitute(iterand, concrete))
            .unwrap_or_else(|| path.clone())
    }

    /// Resolves `path` in this scope, returning the concrete path too.
    pub fn lookup(&self, path: &BindingPath) -> (BindingPath, Option<&'a Value>) {
        let concrete = self.concrete(path);
        let value = concrete.resolve(self.data);
        (concrete, value)
    }

    /// Resolves bound text: the raw value for a single placeholder, a string
    /// for interpolated text. `None` only when a single placeholder misses.
    pub fn render(&self, text: &BoundText) -> Option<Value> {
        match text {
            BoundText::Single(path) => self.lookup(path).1.cloned(),
            BoundText::Interpolated { parts, .. } => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TextPart::Literal(s) => out.push_str(s),
                        TextPart::Binding(path) => out.push_str(&display_value(self.lookup(path).1)),
                    }
                }
                Some(Value::String(out))
            }
        }
    }
}

/// Renders a resolved value as interpolation text.
pub(crate) fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(s: &str) -> BindingPath {
        BindingPath::parse(s).unwrap()
    }

    #[test]
    fn parses_fields_and_indices() {
        let p = path("class.attributes[2].tags[0][1]");
        assert_eq!(
            p.segments(),
            &[
                Segment::Field("class".into()),
                Segment::Field("attributes".into()),
                Segment::Index(2),
                Segment::Field("tags".into()),
                Segment::Index(0),
                Segment::Index(1),
            ]
        );
        assert_eq!(p.to_string(), "class.attributes[2].tags[0][1]");
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["", "a..b", "a[x]", "a[1", "a]b", "a[1]b", ".a"] {
            assert!(
                matches!(BindingPath::parse(bad), Err(DiagramError::TemplateError { .. })),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn resolve_walks_objects_and_arrays() {
        let data = json!({"persona": {"nombres": ["ana", "luz"]}});
        assert_eq!(path("persona.nombres[1]").resolve(&data), Some(&json!("luz")));
        assert_eq!(path("persona").resolve(&data), Some(&json!({"nombres": ["ana", "luz"]})));
    }

    #[test]
    fn resolve_missing_intermediate_is_none() {
        let data = json!({"a": {"b": 1}});
        assert_eq!(path("a.x.y").resolve(&data), None);
        assert_eq!(path("a.b.c").resolve(&data), None);
        assert_eq!(path("a[0]").resolve(&data), None);
    }

    #[test]
    fn substitute_replaces_leading_iterand_only() {
        let concrete = path("class.attributes[0]");
        assert_eq!(
            path("attribute.name").substitute("attribute", &concrete),
            Some(path("class.attributes[0].name"))
        );
        assert_eq!(
            path("attribute").substitute("attribute", &concrete),
            Some(concrete.clone())
        );
        assert_eq!(path("attributes.name").substitute("attribute", &concrete), None);
        assert_eq!(path("name").substitute("attribute", &concrete), None);
    }

    #[test]
    fn assign_creates_missing_objects() {
        let mut data = Value::Null;
        path("meta.title").assign(&mut data, json!("Order")).unwrap();
        assert_eq!(data, json!({"meta": {"title": "Order"}}));
    }

    #[test]
    fn assign_into_array_element() {
        let mut data = json!({"attributes": [{"name": "a"}, {"name": "b"}]});
        path("attributes[1].name").assign(&mut data, json!("z")).unwrap();
        assert_eq!(data, json!({"attributes": [{"name": "a"}, {"name": "z"}]}));
    }

    #[test]
    fn assign_out_of_range_index_fails() {
        let mut data = json!({"attributes": []});
        let err = path("attributes[3].name").assign(&mut data, json!("z")).unwrap_err();
        assert!(matches!(err, AssignError::IndexOutOfRange { index: 3, .. }));
        assert_eq!(data, json!({"attributes": []}));
    }

    #[test]
    fn assign_through_scalar_fails() {
        let mut data = json!({"name": "x"});
        let err = path("name.first").assign(&mut data, json!("y")).unwrap_err();
        assert_eq!(
            err,
            AssignError::NotAContainer {
                at: "name".into(),
                found: "a string"
            }
        );
    }

    #[test]
    fn bound_text_single_and_interpolated() {
        assert_eq!(BoundText::parse("plain").unwrap(), None);
        assert_eq!(
            BoundText::parse("${name}").unwrap(),
            Some(BoundText::Single(path("name")))
        );
        let text = BoundText::parse("<<${kind}>> ${name}").unwrap().unwrap();
        assert_eq!(
            text,
            BoundText::Interpolated {
                parts: vec![
                    TextPart::Literal("<<".into()),
                    TextPart::Binding(path("kind")),
                    TextPart::Literal(">> ".into()),
                    TextPart::Binding(path("name")),
                ],
                primary: path("kind"),
            }
        );
        assert_eq!(text.primary_path(), &path("kind"));
    }

    #[test]
    fn bound_text_unclosed_placeholder_is_template_error() {
        assert!(matches!(
            BoundText::parse("${name"),
            Err(DiagramError::TemplateError { .. })
        ));
    }

    #[test]
    fn scope_substitutes_innermost_iterand() {
        let data = json!({
            "classes": [{"name": "A", "attributes": [{"name": "a0"}, {"name": "a1"}]}]
        });
        let outer = Scope::new(&data).with_iterand("class", path("classes[0]"));
        let inner = outer.with_iterand("attribute", path("classes[0].attributes[1]"));

        let (concrete, value) = inner.lookup(&path("attribute.name"));
        assert_eq!(concrete.to_string(), "classes[0].attributes[1].name");
        assert_eq!(value, Some(&json!("a1")));

        let (concrete, value) = inner.lookup(&path("class.name"));
        assert_eq!(concrete.to_string(), "classes[0].name");
        assert_eq!(value, Some(&json!("A")));
    }

    #[test]
    fn scope_render_interpolates_missing_as_empty() {
        let data = json!({"kind": "entity"});
        let scope = Scope::new(&data);
        let text = BoundText::parse("<<${kind}>> ${name}").unwrap().unwrap();
        assert_eq!(scope.render(&text), Some(json!("<<entity>> ")));
        let single = BoundText::parse("${name}").unwrap().unwrap();
        assert_eq!(scope.render(&single), None);
    }

    #[test]
    fn display_value_formats_scalars() {
        assert_eq!(display_value(None), "");
        assert_eq!(display_value(Some(&json!("x"))), "x");
        assert_eq!(display_value(Some(&json!(3))), "3");
        assert_eq!(display_value(Some(&json!(true))), "true");
    }
}
