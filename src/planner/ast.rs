//! Filter structures accepted by the range planner
//!
//! A `Filter` is a disjunction of conjunctions of column predicates. JSON
//! form:
//!
//! ```text
//! [
//!   [{"field": "a", "op": "gte", "value": 1}, {"field": "b", "op": "is_null"}],
//!   [{"field": "a", "op": "in", "values": [7, 9]}]
//! ]
//! ```

use serde::{Deserialize, Serialize};

use super::errors::PlannerError;

/// Filter operation types
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Equality: field = value
    Eq(serde_json::Value),
    /// Greater than or equal: field >= value
    Gte(serde_json::Value),
    /// Greater than: field > value
    Gt(serde_json::Value),
    /// Less than or equal: field <= value
    Lte(serde_json::Value),
    /// Less than: field < value
    Lt(serde_json::Value),
    /// field IS NULL
    IsNull,
    /// field IS NOT NULL
    IsNotNull,
    /// field IN (values)
    In(Vec<serde_json::Value>),
}

impl FilterOp {
    /// Returns the operation name used in JSON and explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "eq",
            FilterOp::Gte(_) => "gte",
            FilterOp::Gt(_) => "gt",
            FilterOp::Lte(_) => "lte",
            FilterOp::Lt(_) => "lt",
            FilterOp::IsNull => "is_null",
            FilterOp::IsNotNull => "is_not_null",
            FilterOp::In(_) => "in",
        }
    }

    /// Operand rendered for explain output
    fn operand(&self) -> Option<String> {
        match self {
            FilterOp::Eq(v) | FilterOp::Gte(v) | FilterOp::Gt(v) | FilterOp::Lte(v) | FilterOp::Lt(v) => {
                Some(v.to_string())
            }
            FilterOp::In(values) => Some(serde_json::Value::Array(values.clone()).to_string()),
            FilterOp::IsNull | FilterOp::IsNotNull => None,
        }
    }
}

/// A single predicate (field + operation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PredicateWire", into = "PredicateWire")]
pub struct Predicate {
    /// Field name
    pub field: String,
    /// Filter operation
    pub op: FilterOp,
}

impl Predicate {
    fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }

    /// Create an equality predicate
    pub fn eq(field: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(field, FilterOp::Eq(value))
    }

    /// Create a range predicate (gte)
    pub fn gte(field: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(field, FilterOp::Gte(value))
    }

    /// Create a range predicate (lte)
    pub fn lte(field: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(field, FilterOp::Lte(value))
    }

    /// Create a range predicate (gt)
    pub fn gt(field: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(field, FilterOp::Gt(value))
    }

    /// Create a range predicate (lt)
    pub fn lt(field: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(field, FilterOp::Lt(value))
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOp::IsNull)
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOp::IsNotNull)
    }

    pub fn in_list(field: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        Self::new(field, FilterOp::In(values))
    }

    /// Renders as `field op operand`, e.g. `a gte 5`
    pub fn describe(&self) -> String {
        match self.op.operand() {
            Some(operand) => format!("{} {} {}", self.field, self.op.op_name(), operand),
            None => format!("{} {}", self.field, self.op.op_name()),
        }
    }
}

/// Wire form of a predicate
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PredicateWire {
    field: String,
    op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<serde_json::Value>>,
}

impl TryFrom<PredicateWire> for Predicate {
    type Error = PlannerError;

    fn try_from(wire: PredicateWire) -> Result<Self, Self::Error> {
        let PredicateWire {
            field,
            op,
            value,
            values,
        } = wire;

        let require_value = |value: Option<serde_json::Value>| {
            value.ok_or_else(|| {
                PlannerError::invalid_value(&field, format!("operator '{}' requires a value", op))
            })
        };

        let op = match op.as_str() {
            "eq" => FilterOp::Eq(require_value(value)?),
            "gte" => FilterOp::Gte(require_value(value)?),
            "gt" => FilterOp::Gt(require_value(value)?),
            "lte" => FilterOp::Lte(require_value(value)?),
            "lt" => FilterOp::Lt(require_value(value)?),
            "is_null" => FilterOp::IsNull,
            "is_not_null" => FilterOp::IsNotNull,
            "in" => FilterOp::In(values.ok_or_else(|| {
                PlannerError::invalid_value(&field, "operator 'in' requires values")
            })?),
            other => {
                return Err(PlannerError::invalid_value(
                    &field,
                    format!("unknown operator '{}'", other),
                ))
            }
        };
        Ok(Predicate { field, op })
    }
}

impl From<Predicate> for PredicateWire {
    fn from(predicate: Predicate) -> Self {
        let op = predicate.op.op_name().to_string();
        let (value, values) = match predicate.op {
            FilterOp::Eq(v) | FilterOp::Gte(v) | FilterOp::Gt(v) | FilterOp::Lte(v) | FilterOp::Lt(v) => {
                (Some(v), None)
            }
            FilterOp::In(vs) => (None, Some(vs)),
            FilterOp::IsNull | FilterOp::IsNotNull => (None, None),
        };
        PredicateWire {
            field: predicate.field,
            op,
            value,
            values,
        }
    }
}

/// Disjunction of conjunctions
///
/// An empty conjunction matches every key; a filter with no conjunctions
/// is rejected by the planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    pub disjuncts: Vec<Vec<Predicate>>,
}

impl Filter {
    pub fn new(disjuncts: Vec<Vec<Predicate>>) -> Self {
        Self { disjuncts }
    }

    /// A filter with a single conjunction
    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self {
            disjuncts: vec![predicates],
        }
    }

    /// Adds another conjunction
    pub fn or(mut self, predicates: Vec<Predicate>) -> Self {
        self.disjuncts.push(predicates);
        self
    }

    /// All predicates across conjunctions
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.disjuncts.iter().flatten()
    }
}
