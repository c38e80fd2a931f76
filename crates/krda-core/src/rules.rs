//! Filter rule trees.
//!
//! A rule set is a disjunction of conjunctions: the outer list is OR, each
//! inner list is AND. An empty outer list matches every row; an empty inner
//! list is a vacuously true branch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleOp {
    Equal,
    NotEqual,
    MoreThan,
    LessThan,
    Contains,
}

/// Leaf operand as it travels in messages: a JSON string or number. How it
/// is interpreted depends on the referenced column's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Num(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleLeaf {
    pub name: String,
    pub operation: RuleOp,
    pub value: RuleValue,
}

impl RuleLeaf {
    pub fn new(name: impl Into<String>, operation: RuleOp, value: impl Into<RuleValue>) -> Self {
        Self {
            name: name.into(),
            operation,
            value: value.into(),
        }
    }
}

/// One conjunction branch; all leaves must hold.
pub type RuleGroup = Vec<RuleLeaf>;

/// The full disjunction; any group must hold.
pub type RuleSet = Vec<RuleGroup>;

impl From<&str> for RuleValue {
    fn from(v: &str) -> Self {
        RuleValue::Str(v.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(v: String) -> Self {
        RuleValue::Str(v)
    }
}

impl From<i64> for RuleValue {
    fn from(v: i64) -> Self {
        RuleValue::Num(v as f64)
    }
}

impl From<f64> for RuleValue {
    fn from(v: f64) -> Self {
        RuleValue::Num(v)
    }
}
