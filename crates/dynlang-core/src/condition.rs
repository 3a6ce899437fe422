//! Boolean expression trees guarding decision templates.
//!
//! Conditions are compiled once with the language. Compilation never fails:
//! a malformed expression compiles to [`Condition::Invalid`], which evaluates
//! to an error. Callers that must stay renderable use [`Condition::holds`],
//! which maps every evaluation error to `false` and hands the error back for
//! reporting.
//!
//! Accepted JSON forms:
//!
//! ```text
//! true | false
//! "${flag}"                                  truthiness of a binding
//! { "eq":  { "left": <operand>, "right": <operand> } }   (also ne gt gte lt lte in any between)
//! { "and": [<condition>, ...] }
//! { "or":  [<condition>, ...] }
//! { "not": <condition> }
//! ```
//!
//! An operand is any JSON value; strings containing `${...}` are bindings.

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;

use crate::binding::{BoundText, Scope};

/// Comparison operators for leaf expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `left` is a member of the `right` array.
    In,
    /// The `left` array contains `right`, or shares an element with it when
    /// `right` is an array too.
    Any,
    /// `left` lies within the inclusive `[lo, hi]` range given by `right`.
    Between,
}

impl CompareOp {
    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "eq" => CompareOp::Eq,
            "ne" => CompareOp::Ne,
            "gt" => CompareOp::Gt,
            "gte" => CompareOp::Gte,
            "lt" => CompareOp::Lt,
            "lte" => CompareOp::Lte,
            "in" => CompareOp::In,
            "any" => CompareOp::Any,
            "between" => CompareOp::Between,
            _ => return None,
        })
    }
}

/// A literal value or a binding resolved against the element's data.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Bound(BoundText),
}

impl Operand {
    fn compile(value: &Value) -> Result<Self, String> {
        if let Value::String(s) = value {
            if let Some(text) = BoundText::parse(s).map_err(|e| e.to_string())? {
                return Ok(Operand::Bound(text));
            }
        }
        Ok(Operand::Literal(value.clone()))
    }

    fn resolve(&self, scope: &Scope<'_>) -> Option<Value> {
        match self {
            Operand::Literal(v) => Some(v.clone()),
            Operand::Bound(text) => scope.render(text),
        }
    }
}

/// Compiled boolean expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Constant(bool),
    Truthy(Operand),
    Compare {
        op: CompareOp,
        left: Operand,
        right: Operand,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    /// A malformed expression; always fails evaluation with `reason`.
    Invalid { reason: String },
}

/// Why a condition could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConditionError(pub String);

impl Condition {
    /// Compiles a JSON expression.
    pub fn compile(expr: &Value) -> Condition {
        match expr {
            Value::Bool(b) => Condition::Constant(*b),
            Value::String(_) => match Operand::compile(expr) {
                Ok(operand @ Operand::Bound(_)) => Condition::Truthy(operand),
                Ok(Operand::Literal(_)) => invalid(format!("condition string {expr} has no binding")),
                Err(reason) => invalid(reason),
            },
            Value::Object(map) if map.len() == 1 => {
                let Some((key, body)) = map.iter().next() else {
                    return invalid("empty condition object");
                };
                match key.as_str() {
                    "and" | "or" => {
                        let Some(items) = body.as_array() else {
                            return invalid(format!("'{key}' expects an array of conditions"));
                        };
                        let compiled = items.iter().map(Condition::compile).collect();
                        if key == "and" {
                            Condition::And(compiled)
                        } else {
                            Condition::Or(compiled)
                        }
                    }
                    "not" => Condition::Not(Box::new(Condition::compile(body))),
                    other => match CompareOp::from_key(other) {
                        Some(op) => compile_compare(op, body),
                        None => invalid(format!("unknown condition operator '{other}'")),
                    },
                }
            }
            other => invalid(format!("unsupported condition {other}")),
        }
    }

    /// Evaluates the expression; any misuse is an error.
    ///
    /// `and`/`or` evaluate items left to right and stop at the first item
    /// that decides the result. An error in any item reached before that
    /// point fails the whole expression, so `or[<error>, true]` is an error
    /// while `or[true, <error>]` is `true`.
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<bool, ConditionError> {
        match self {
            Condition::Constant(b) => Ok(*b),
            Condition::Truthy(operand) => Ok(truthy(operand.resolve(scope).as_ref())),
            Condition::Compare { op, left, right } => {
                compare(*op, left.resolve(scope), right.resolve(scope))
            }
            Condition::And(items) => {
                for item in items {
                    if !item.evaluate(scope)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Or(items) => {
                for item in items {
                    if item.evaluate(scope)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Not(inner) => Ok(!inner.evaluate(scope)?),
            Condition::Invalid { reason } => Err(ConditionError(reason.clone())),
        }
    }

    /// Evaluates the expression, treating any error as `false`. The error is
    /// returned alongside the result.
    pub fn holds(&self, scope: &Scope<'_>) -> (bool, Option<ConditionError>) {
        match self.evaluate(scope) {
            Ok(value) => (value, None),
            Err(err) => (false, Some(err)),
        }
    }
}

fn invalid(reason: impl Into<String>) -> Condition {
    Condition::Invalid {
        reason: reason.into(),
    }
}

fn compile_compare(op: CompareOp, body: &Value) -> Condition {
    let Some(map) = body.as_object() else {
        return invalid(format!("comparison {op:?} expects {{left, right}}"));
    };
    let operand = |name: &str| -> Result<Operand, String> {
        map.get(name)
            .map(Operand::compile)
            .unwrap_or_else(|| Err(format!("comparison {op:?} is missing '{name}'")))
    };
    match (operand("left"), operand("right")) {
        (Ok(left), Ok(right)) => Condition::Compare { op, left, right },
        (Err(reason), _) | (_, Err(reason)) => invalid(reason),
    }
}

fn compare(op: CompareOp, left: Option<Value>, right: Option<Value>) -> Result<bool, ConditionError> {
    let left = left.unwrap_or(Value::Null);
    let right = right.unwrap_or(Value::Null);
    match op {
        CompareOp::Eq => Ok(loosely_equal(&left, &right)),
        CompareOp::Ne => Ok(!loosely_equal(&left, &right)),
        CompareOp::Gt => order(&left, &right).map(|o| o == Ordering::Greater),
        CompareOp::Gte => order(&left, &right).map(|o| o != Ordering::Less),
        CompareOp::Lt => order(&left, &right).map(|o| o == Ordering::Less),
        CompareOp::Lte => order(&left, &right).map(|o| o != Ordering::Greater),
        CompareOp::In => {
            let items = right
                .as_array()
                .ok_or_else(|| ConditionError(format!("'in' expects an array on the right, got {right}")))?;
            Ok(items.iter().any(|item| loosely_equal(&left, item)))
        }
        CompareOp::Any => {
            let items = left
                .as_array()
                .ok_or_else(|| ConditionError(format!("'any' expects an array on the left, got {left}")))?;
            Ok(match right.as_array() {
                Some(wanted) => items
                    .iter()
                    .any(|item| wanted.iter().any(|w| loosely_equal(item, w))),
                None => items.iter().any(|item| loosely_equal(item, &right)),
            })
        }
        CompareOp::Between => {
            let value = left
                .as_f64()
                .ok_or_else(|| ConditionError(format!("'between' expects a number on the left, got {left}")))?;
            let bounds = match right.as_array().map(Vec::as_slice) {
                Some([lo, hi]) => lo.as_f64().zip(hi.as_f64()),
                _ => None,
            };
            let (lo, hi) = bounds.ok_or_else(|| {
                ConditionError(format!("'between' expects a [lo, hi] numeric pair, got {right}"))
            })?;
            Ok(lo <= value && value <= hi)
        }
    }
}

/// Equality with numbers compared by value (`1 == 1.0`).
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn order(a: &Value, b: &Value) -> Result<Ordering, ConditionError> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x
            .partial_cmp(&y)
            .ok_or_else(|| ConditionError("cannot order NaN".to_string()));
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Ok(x.cmp(y));
    }
    Err(ConditionError(format!("cannot order {a} and {b}")))
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn eval(expr: Value, data: Value) -> Result<bool, ConditionError> {
        Condition::compile(&expr).evaluate(&Scope::new(&data))
    }

    fn holds(expr: Value, data: Value) -> bool {
        Condition::compile(&expr).holds(&Scope::new(&data)).0
    }

    #[test]
    fn between_is_inclusive_numeric_range() {
        let expr = json!({"between": {"left": "${age}", "right": [18, 65]}});
        assert!(!holds(expr.clone(), json!({"age": 70})));
        assert!(holds(expr.clone(), json!({"age": 40})));
        assert!(holds(expr.clone(), json!({"age": 18})));
        assert!(holds(expr, json!({"age": 65})));
    }

    #[test]
    fn between_with_bad_range_is_false() {
        let expr = json!({"between": {"left": "${age}", "right": [18]}});
        assert!(eval(expr.clone(), json!({"age": 20})).is_err());
        assert!(!holds(expr, json!({"age": 20})));
    }

    #[test]
    fn equality_and_ordering() {
        let data = json!({"kind": "abstract", "count": 3});
        assert!(holds(json!({"eq": {"left": "${kind}", "right": "abstract"}}), data.clone()));
        assert!(holds(json!({"ne": {"left": "${kind}", "right": "final"}}), data.clone()));
        assert!(holds(json!({"gt": {"left": "${count}", "right": 2}}), data.clone()));
        assert!(holds(json!({"gte": {"left": "${count}", "right": 3.0}}), data.clone()));
        assert!(holds(json!({"lt": {"left": "${count}", "right": 10}}), data.clone()));
        assert!(!holds(json!({"lte": {"left": "${count}", "right": 2}}), data.clone()));
        assert!(holds(json!({"eq": {"left": "${count}", "right": 3.0}}), data));
    }

    #[test]
    fn ordering_mismatched_types_fails_silently() {
        let data = json!({"name": "x"});
        let expr = json!({"gt": {"left": "${name}", "right": 1}});
        assert!(eval(expr.clone(), data.clone()).is_err());
        assert!(!holds(expr, data));
    }

    #[test]
    fn membership_operators() {
        let data = json!({"visibility": "public", "tags": ["a", "b"]});
        assert!(holds(
            json!({"in": {"left": "${visibility}", "right": ["public", "protected"]}}),
            data.clone()
        ));
        assert!(holds(json!({"any": {"left": "${tags}", "right": "b"}}), data.clone()));
        assert!(holds(json!({"any": {"left": "${tags}", "right": ["x", "a"]}}), data.clone()));
        assert!(!holds(json!({"any": {"left": "${tags}", "right": ["x"]}}), data.clone()));
        // non-array right operand for `in` is misuse
        assert!(!holds(json!({"in": {"left": "${visibility}", "right": "public"}}), data));
    }

    #[test]
    fn combinators() {
        let data = json!({"a": 1, "b": 2});
        let a_is_1 = json!({"eq": {"left": "${a}", "right": 1}});
        let b_is_3 = json!({"eq": {"left": "${b}", "right": 3}});
        assert!(!holds(json!({"and": [a_is_1.clone(), b_is_3.clone()]}), data.clone()));
        assert!(holds(json!({"or": [a_is_1.clone(), b_is_3.clone()]}), data.clone()));
        assert!(holds(json!({"not": b_is_3}), data.clone()));
        assert!(holds(json!({"and": []}), data.clone()));
        assert!(!holds(json!({"or": []}), data));
    }

    #[test]
    fn or_fails_on_error_before_a_true_item() {
        let data = json!({"a": 1});
        let broken = json!({"in": {"left": 1, "right": 2}});
        let a_is_1 = json!({"eq": {"left": "${a}", "right": 1}});

        let expr = Condition::compile(&json!({"or": [broken.clone(), a_is_1.clone()]}));
        let (value, failure) = expr.holds(&Scope::new(&data));
        assert!(!value);
        assert!(failure.is_some());

        let expr = Condition::compile(&json!({"or": [a_is_1, broken]}));
        assert_eq!(expr.holds(&Scope::new(&data)), (true, None));
    }

    #[test]
    fn errors_propagate_through_not() {
        let data = json!({});
        let broken = json!({"in": {"left": 1, "right": 2}});
        assert!(!holds(json!({"not": broken}), data));
    }

    #[test]
    fn truthiness_of_bare_binding() {
        assert!(holds(json!("${abstract}"), json!({"abstract": true})));
        assert!(!holds(json!("${abstract}"), json!({"abstract": false})));
        assert!(!holds(json!("${abstract}"), json!({})));
        assert!(holds(json!("${items}"), json!({"items": []})));
        assert!(!holds(json!("${label}"), json!({"label": ""})));
    }

    #[test]
    fn malformed_expressions_compile_to_invalid() {
        assert!(matches!(Condition::compile(&json!({"xor": []})), Condition::Invalid { .. }));
        assert!(matches!(Condition::compile(&json!({"eq": {"left": 1}})), Condition::Invalid { .. }));
        assert!(matches!(Condition::compile(&json!({"and": {}})), Condition::Invalid { .. }));
        assert!(matches!(Condition::compile(&json!(42)), Condition::Invalid { .. }));
        assert!(matches!(Condition::compile(&json!("literal")), Condition::Invalid { .. }));
        assert!(matches!(
            Condition::compile(&json!({"eq": {"left": "${a[", "right": 1}})),
            Condition::Invalid { .. }
        ));
        assert!(!holds(json!({"xor": []}), json!({})));
    }

    #[test]
    fn missing_binding_equals_null() {
        assert!(holds(json!({"eq": {"left": "${missing}", "right": null}}), json!({})));
    }
}
