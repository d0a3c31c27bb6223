//! Condition evaluation against projected documents.
//!
//! This module is the query matching engine: it decides whether one document
//! satisfies a condition tree. Evaluation never errors — malformed inputs
//! (a non-array `$in` value, a pattern that does not compile, an unsupported
//! comparison) fail closed and the document simply does not match.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

use docvault_core::{
    document::{Document, Id},
    query::{ConditionNode, Operator, SimpleCondition},
};

/// Structural equality with all JSON numbers normalized to f64, so `30` and
/// `30.0` compare equal regardless of how serde parsed them.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(v, w)| values_equal(v, w))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Partial ordering over JSON values. Only numbers, strings, and booleans are
/// ordered; mixed-type comparisons are undefined.
pub(crate) fn values_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compile_regex(pattern: &str, flags: &str) -> Option<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'u' => {
                builder.unicode(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            _ => {}
        }
    }
    match builder.build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            log::debug!("regex condition will not match, pattern failed to compile: {err}");
            None
        }
    }
}

/// One evaluation pass over a condition tree.
///
/// The evaluator carries per-pass state: compiled regexes keyed by
/// (pattern, flags), so a `$regex` leaf is compiled once no matter how many
/// documents the pass touches. Create one per query pass and drop it with
/// the pass.
pub(crate) struct Evaluator {
    regexes: HashMap<(String, String), Option<Regex>>,
}

impl Evaluator {
    pub(crate) fn new() -> Self {
        Self {
            regexes: HashMap::new(),
        }
    }

    /// Evaluates a condition tree against one projected document.
    pub(crate) fn matches(&mut self, fields: &Map<String, Value>, node: &ConditionNode) -> bool {
        match node {
            ConditionNode::And { nodes } => nodes.iter().all(|n| self.matches(fields, n)),
            ConditionNode::Or { nodes } => nodes.iter().any(|n| self.matches(fields, n)),
            ConditionNode::Simple(condition) => self.matches_simple(fields, condition),
        }
    }

    fn matches_simple(&mut self, fields: &Map<String, Value>, condition: &SimpleCondition) -> bool {
        let field_value = fields.get(&condition.field);

        if let Some(custom) = &condition.custom {
            return custom.matches(field_value, &condition.value);
        }

        match condition.operator {
            Operator::Eq => field_value.is_some_and(|v| values_equal(v, &condition.value)),
            Operator::Ne => !field_value.is_some_and(|v| values_equal(v, &condition.value)),
            Operator::Gt => self.ordered(field_value, &condition.value, |o| o == Ordering::Greater),
            Operator::Gte => self.ordered(field_value, &condition.value, |o| o != Ordering::Less),
            Operator::Lt => self.ordered(field_value, &condition.value, |o| o == Ordering::Less),
            Operator::Lte => self.ordered(field_value, &condition.value, |o| o != Ordering::Greater),
            Operator::In => condition
                .value
                .as_array()
                .is_some_and(|values| {
                    field_value.is_some_and(|v| values.iter().any(|c| values_equal(c, v)))
                }),
            Operator::Nin => condition
                .value
                .as_array()
                .is_some_and(|values| {
                    !field_value.is_some_and(|v| values.iter().any(|c| values_equal(c, v)))
                }),
            Operator::Regex => self.matches_regex(field_value, &condition.value),
            // A `custom` operator without a comparator has nothing to dispatch to.
            Operator::Custom => false,
        }
    }

    fn ordered(
        &self,
        field_value: Option<&Value>,
        condition_value: &Value,
        accept: impl Fn(Ordering) -> bool,
    ) -> bool {
        field_value
            .and_then(|v| values_cmp(v, condition_value))
            .is_some_and(accept)
    }

    fn matches_regex(&mut self, field_value: Option<&Value>, condition_value: &Value) -> bool {
        let Some(text) = field_value.and_then(Value::as_str) else {
            return false;
        };
        let (pattern, flags) = match condition_value {
            Value::String(pattern) => (pattern.clone(), String::new()),
            Value::Object(object) => {
                let Some(pattern) = object.get("$regex").and_then(Value::as_str) else {
                    return false;
                };
                let flags = object
                    .get("$options")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                (pattern.to_owned(), flags.to_owned())
            }
            _ => return false,
        };
        self.regexes
            .entry((pattern.clone(), flags.clone()))
            .or_insert_with(|| compile_regex(&pattern, &flags))
            .as_ref()
            .is_some_and(|regex| regex.is_match(text))
    }
}

/// Pass-scoped projection cache.
///
/// Each document is projected to its JSON object at most once per query pass,
/// keyed by id. The cache is owned by the pass and dropped with it, so it
/// cannot outlive the documents it describes.
pub(crate) struct Projections {
    cache: HashMap<Id, Map<String, Value>>,
}

impl Projections {
    pub(crate) fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Returns the projected fields for a document, projecting on first use.
    /// A document whose payload fails to serialize yields `None` and is
    /// treated as matching nothing.
    pub(crate) fn get<T: Serialize>(&mut self, doc: &Document<T>) -> Option<&Map<String, Value>> {
        if !self.cache.contains_key(&doc.id) {
            let fields = doc.fields().ok()?;
            self.cache.insert(doc.id.clone(), fields);
        }
        self.cache.get(&doc.id)
    }
}
