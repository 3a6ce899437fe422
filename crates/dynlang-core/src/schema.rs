//! Attribute schemas describing the shape of an element's bound data.
//!
//! Schemas are advisory by default: the editor renders whatever data an
//! element carries. [`BoundDataPolicy::Validate`] opts into checking data
//! written through `ChangeBoundData` against the element type's schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `{const, title}` choice of an enumerated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumOption {
    #[serde(rename = "const")]
    pub value: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// Recursive typed field description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeSchema {
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
        choices: Option<Vec<String>>,
        #[serde(default, rename = "oneOf", skip_serializing_if = "Option::is_none")]
        one_of: Option<Vec<EnumOption>>,
    },
    Enum {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        #[serde(rename = "enum")]
        choices: Vec<String>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
    Boolean {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
    Array {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        items: Box<AttributeSchema>,
    },
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
        #[serde(default)]
        properties: IndexMap<String, AttributeSchema>,
    },
}

/// Whether `ChangeBoundData` checks data against the attribute schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundDataPolicy {
    #[default]
    Permissive,
    Validate,
}

impl AttributeSchema {
    pub fn label(&self) -> Option<&str> {
        match self {
            AttributeSchema::String { label, .. }
            | AttributeSchema::Enum { label, .. }
            | AttributeSchema::Number { label, .. }
            | AttributeSchema::Integer { label, .. }
            | AttributeSchema::Boolean { label, .. }
            | AttributeSchema::Array { label, .. }
            | AttributeSchema::Object { label, .. } => label.as_deref(),
        }
    }

    /// Checks `value` against this schema and lists every mismatch.
    ///
    /// Missing object members and `null` values are accepted: bound data is
    /// routinely partial while an element is being filled in.
    pub fn validate(&self, value: &Value) -> Vec<String> {
        let mut issues = Vec::new();
        self.check(value, "$", &mut issues);
        issues
    }

    fn check(&self, value: &Value, at: &str, issues: &mut Vec<String>) {
        if value.is_null() {
            return;
        }
        match self {
            AttributeSchema::String { choices, one_of, .. } => {
                let Some(s) = value.as_str() else {
                    return issues.push(mismatch(at, "a string", value));
                };
                let allowed: Option<Vec<&str>> = match (choices, one_of) {
                    (Some(choices), _) => Some(choices.iter().map(String::as_str).collect()),
                    (None, Some(options)) => Some(options.iter().map(|o| o.value.as_str()).collect()),
                    (None, None) => None,
                };
                if let Some(allowed) = allowed {
                    if !allowed.contains(&s) {
                        issues.push(format!("{at}: '{s}' is not one of {allowed:?}"));
                    }
                }
            }
            AttributeSchema::Enum { choices, .. } => match value.as_str() {
                Some(s) if choices.iter().any(|c| c == s) => {}
                Some(s) => issues.push(format!("{at}: '{s}' is not one of {choices:?}")),
                None => issues.push(mismatch(at, "a string", value)),
            },
            AttributeSchema::Number { .. } => {
                if !value.is_number() {
                    issues.push(mismatch(at, "a number", value));
                }
            }
            AttributeSchema::Integer { .. } => {
                let integral = value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|f| f.fract() == 0.0);
                if !integral {
                    issues.push(mismatch(at, "an integer", value));
                }
            }
            AttributeSchema::Boolean { .. } => {
                if !value.is_boolean() {
                    issues.push(mismatch(at, "a boolean", value));
                }
            }
            AttributeSchema::Array { items, .. } => {
                let Some(elements) = value.as_array() else {
                    return issues.push(mismatch(at, "an array", value));
                };
                for (i, element) in elements.iter().enumerate() {
                    items.check(element, &format!("{at}[{i}]"), issues);
                }
            }
            AttributeSchema::Object { properties, .. } => {
                let Some(members) = value.as_object() else {
                    return issues.push(mismatch(at, "an object", value));
                };
                for (name, schema) in properties {
                    if let Some(member) = members.get(name) {
                        schema.check(member, &format!("{at}.{name}"), issues);
                    }
                }
            }
        }
    }
}

fn mismatch(at: &str, expected: &str, found: &Value) -> String {
    format!("{at}: expected {expected}, found {found}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn person() -> AttributeSchema {
        serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "label": "Name"},
                "age": {"type": "integer"},
                "kind": {"type": "string", "enum": ["abstract", "concrete"]},
                "tags": {"type": "array", "items": {"type": "string"}},
                "active": {"type": "boolean", "default": true}
            }
        }))
        .unwrap()
    }

    #[test]
    fn conforming_data_has_no_issues() {
        let data = json!({"name": "Order", "age": 3, "kind": "abstract", "tags": ["a"], "extra": 1});
        assert!(person().validate(&data).is_empty());
    }

    #[test]
    fn partial_data_is_accepted() {
        assert!(person().validate(&json!({})).is_empty());
        assert!(person().validate(&json!({"name": null})).is_empty());
    }

    #[test]
    fn mismatches_are_reported_with_paths() {
        let data = json!({"name": 1, "age": 2.5, "kind": "other", "tags": ["a", 3], "active": "yes"});
        let issues = person().validate(&data);
        assert_eq!(issues.len(), 5, "{issues:?}");
        assert!(issues.iter().any(|i| i.starts_with("$.name: expected a string")));
        assert!(issues.iter().any(|i| i.starts_with("$.age: expected an integer")));
        assert!(issues.iter().any(|i| i.starts_with("$.kind: 'other'")));
        assert!(issues.iter().any(|i| i.starts_with("$.tags[1]: expected a string")));
        assert!(issues.iter().any(|i| i.starts_with("$.active: expected a boolean")));
    }

    #[test]
    fn one_of_restricts_values() {
        let schema: AttributeSchema = serde_json::from_value(json!({
            "type": "string",
            "oneOf": [{"const": "pk", "title": "Primary key"}]
        }))
        .unwrap();
        assert!(schema.validate(&json!("pk")).is_empty());
        assert_eq!(schema.validate(&json!("fk")).len(), 1);
    }

    #[test]
    fn labels_are_exposed() {
        let schema: AttributeSchema =
            serde_json::from_value(json!({"type": "number", "label": "Weight"})).unwrap();
        assert_eq!(schema.label(), Some("Weight"));
    }

    #[test]
    fn policy_defaults_to_permissive() {
        assert_eq!(BoundDataPolicy::default(), BoundDataPolicy::Permissive);
    }
}
