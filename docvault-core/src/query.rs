//! Condition-tree construction and serialization.
//!
//! Queries are recursive boolean trees over three node kinds: `$and` (all
//! children match), `$or` (at least one child matches), and simple
//! field/operator/value conditions. Trees are plain data — they serialize to
//! and from JSON, and their canonical serialization doubles as the query
//! cache key.
//!
//! # Building conditions
//!
//! The [`Condition`] struct provides a collection of constructors for the
//! common cases, and [`ConditionNode::and`]/[`ConditionNode::or`] combine
//! nodes fluently:
//!
//! ```ignore
//! use docvault::Condition;
//!
//! let query = Condition::eq("name", "milad").and(Condition::gte("age", 18));
//! ```
//!
//! # Operators
//!
//! - Comparison: `$eq`, `$neq`, `$gt`, `$gte`, `$lt`, `$lte`
//! - Set membership: `$in`, `$nin` (the condition value must be an array)
//! - Pattern: `$regex`, with an optional `$options` flag string
//! - Escape hatch: `custom`, a user-supplied comparator that overrides
//!   operator dispatch entirely

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};

/// Cache key under which an unfiltered "all documents" result is stored.
pub const ALL_DOCUMENTS_KEY: &str = "*";

/// Comparison operators for simple conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Equal to.
    #[serde(rename = "$eq")]
    Eq,
    /// Not equal to. A missing field satisfies this operator.
    #[serde(rename = "$neq")]
    Ne,
    /// Greater than.
    #[serde(rename = "$gt")]
    Gt,
    /// Greater than or equal to.
    #[serde(rename = "$gte")]
    Gte,
    /// Less than.
    #[serde(rename = "$lt")]
    Lt,
    /// Less than or equal to.
    #[serde(rename = "$lte")]
    Lte,
    /// Field value is a member of the condition's array value.
    #[serde(rename = "$in")]
    In,
    /// Field value is not a member of the condition's array value.
    #[serde(rename = "$nin")]
    Nin,
    /// Field value matches the condition's regex pattern.
    #[serde(rename = "$regex")]
    Regex,
    /// Dispatch is delegated to the condition's custom comparator.
    #[serde(rename = "custom")]
    Custom,
}

/// A user-supplied comparator that overrides operator dispatch.
///
/// The comparator receives the document's field value (`None` when the field
/// is absent) and the condition value; its boolean result is authoritative.
#[derive(Clone)]
pub struct CustomCompare(Arc<dyn Fn(Option<&Value>, &Value) -> bool + Send + Sync>);

impl CustomCompare {
    /// Wraps a comparison function.
    pub fn new(compare: impl Fn(Option<&Value>, &Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(compare))
    }

    /// Applies the comparator to a field value and the condition value.
    pub fn matches(&self, field_value: Option<&Value>, condition_value: &Value) -> bool {
        (self.0)(field_value, condition_value)
    }
}

impl fmt::Debug for CustomCompare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCompare(..)")
    }
}

/// A leaf condition: one field, one operator, one value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleCondition {
    /// The document field to evaluate, by name.
    pub field: String,
    /// The comparison operator.
    pub operator: Operator,
    /// The value to compare against.
    pub value: Value,
    /// Optional comparator overriding operator dispatch. Not serialized:
    /// queries carrying one are evaluated but never cached.
    #[serde(skip)]
    pub custom: Option<CustomCompare>,
}

/// A recursive boolean condition tree.
///
/// Serializes as `{"$and": [...]}`, `{"$or": [...]}`, or a flat simple
/// condition object, and round-trips through serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    /// All child conditions must match. An empty conjunction matches.
    And {
        /// The child conditions.
        #[serde(rename = "$and")]
        nodes: Vec<ConditionNode>,
    },
    /// At least one child condition must match. An empty disjunction does not.
    Or {
        /// The child conditions.
        #[serde(rename = "$or")]
        nodes: Vec<ConditionNode>,
    },
    /// A leaf condition.
    Simple(SimpleCondition),
}

impl ConditionNode {
    /// Combines this node with another under `$and`. If this node is already
    /// an `$and`, the other node is appended to its children.
    pub fn and(self, other: ConditionNode) -> Self {
        match self {
            ConditionNode::And { mut nodes } => {
                nodes.push(other);
                ConditionNode::And { nodes }
            }
            _ => ConditionNode::And {
                nodes: vec![self, other],
            },
        }
    }

    /// Combines this node with another under `$or`. If this node is already
    /// an `$or`, the other node is appended to its children.
    pub fn or(self, other: ConditionNode) -> Self {
        match self {
            ConditionNode::Or { mut nodes } => {
                nodes.push(other);
                ConditionNode::Or { nodes }
            }
            _ => ConditionNode::Or {
                nodes: vec![self, other],
            },
        }
    }

    /// Validates the tree before use: every leaf must name a field.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for an empty field name.
    pub fn validate(&self) -> StoreResult<()> {
        match self {
            ConditionNode::And { nodes } | ConditionNode::Or { nodes } => {
                for node in nodes {
                    node.validate()?;
                }
                Ok(())
            }
            ConditionNode::Simple(condition) => {
                if condition.field.is_empty() {
                    Err(StoreError::Validation(
                        "the query condition must name a field".to_owned(),
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// True when any leaf carries a custom comparator. Such trees cannot be
    /// canonically serialized, so they are evaluated but never cached.
    pub fn has_custom(&self) -> bool {
        match self {
            ConditionNode::And { nodes } | ConditionNode::Or { nodes } => {
                nodes.iter().any(ConditionNode::has_custom)
            }
            ConditionNode::Simple(condition) => condition.custom.is_some(),
        }
    }

    /// The canonical serialization used as the query cache key, or `None`
    /// when the tree is uncacheable.
    pub fn cache_key(&self) -> Option<String> {
        if self.has_custom() {
            return None;
        }
        serde_json::to_string(self).ok()
    }

    /// Interprets the tree as a single equality conjunction: either one `$eq`
    /// leaf, or an `$and` whose children are all `$eq` leaves, none carrying
    /// a custom comparator. Returns the field → value map, or `None` when the
    /// tree has any other shape — the signal to fall back to a full scan.
    pub fn as_equality_conjunction(&self) -> Option<BTreeMap<&str, &Value>> {
        fn leaf(condition: &SimpleCondition) -> Option<(&str, &Value)> {
            match condition.operator {
                Operator::Eq if condition.custom.is_none() => {
                    Some((condition.field.as_str(), &condition.value))
                }
                _ => None,
            }
        }

        match self {
            ConditionNode::Simple(condition) => {
                let (field, value) = leaf(condition)?;
                Some(BTreeMap::from([(field, value)]))
            }
            ConditionNode::And { nodes } if !nodes.is_empty() => {
                let mut map = BTreeMap::new();
                for node in nodes {
                    let ConditionNode::Simple(condition) = node else {
                        return None;
                    };
                    let (field, value) = leaf(condition)?;
                    map.insert(field, value);
                }
                Some(map)
            }
            _ => None,
        }
    }
}

/// Constructors for common condition shapes.
///
/// All constructors accept field names as `Into<String>` and values as
/// `Into<Value>` for ergonomics.
pub struct Condition;

impl Condition {
    fn simple(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> ConditionNode {
        ConditionNode::Simple(SimpleCondition {
            field: field.into(),
            operator,
            value: value.into(),
            custom: None,
        })
    }

    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> ConditionNode {
        Self::simple(field, Operator::Eq, value)
    }

    /// Matches documents where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> ConditionNode {
        Self::simple(field, Operator::Ne, value)
    }

    /// Matches documents where the field is greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> ConditionNode {
        Self::simple(field, Operator::Gt, value)
    }

    /// Matches documents where the field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> ConditionNode {
        Self::simple(field, Operator::Gte, value)
    }

    /// Matches documents where the field is less than the value.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> ConditionNode {
        Self::simple(field, Operator::Lt, value)
    }

    /// Matches documents where the field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> ConditionNode {
        Self::simple(field, Operator::Lte, value)
    }

    /// Matches documents where the field value is one of the given values.
    pub fn is_in(
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> ConditionNode {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::simple(field, Operator::In, Value::Array(values))
    }

    /// Matches documents where the field value is none of the given values.
    pub fn not_in(
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> ConditionNode {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::simple(field, Operator::Nin, Value::Array(values))
    }

    /// Matches documents where the string field matches the regex pattern.
    pub fn regex(field: impl Into<String>, pattern: impl Into<String>) -> ConditionNode {
        Self::simple(field, Operator::Regex, Value::String(pattern.into()))
    }

    /// Matches documents where the string field matches the regex pattern,
    /// compiled with the given flag string (`i`, `m`, `s`, `u`, `x`; unknown
    /// flags are ignored).
    pub fn regex_with_flags(
        field: impl Into<String>,
        pattern: impl Into<String>,
        flags: impl Into<String>,
    ) -> ConditionNode {
        let value = serde_json::json!({
            "$regex": pattern.into(),
            "$options": flags.into(),
        });
        Self::simple(field, Operator::Regex, value)
    }

    /// Matches documents according to a user-supplied comparator. The
    /// comparator receives the field value (or `None` when absent) and the
    /// condition value.
    pub fn custom(
        field: impl Into<String>,
        value: impl Into<Value>,
        compare: impl Fn(Option<&Value>, &Value) -> bool + Send + Sync + 'static,
    ) -> ConditionNode {
        ConditionNode::Simple(SimpleCondition {
            field: field.into(),
            operator: Operator::Custom,
            value: value.into(),
            custom: Some(CustomCompare::new(compare)),
        })
    }

    /// Combines conditions so that all must match.
    pub fn and(nodes: impl IntoIterator<Item = ConditionNode>) -> ConditionNode {
        ConditionNode::And {
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Combines conditions so that at least one must match.
    pub fn or(nodes: impl IntoIterator<Item = ConditionNode>) -> ConditionNode {
        ConditionNode::Or {
            nodes: nodes.into_iter().collect(),
        }
    }
}

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}
