//! Index range planner
//!
//! Translates a filter into the disjoint set of key ranges an index scan
//! must visit:
//!
//! 1. Each conjunction becomes one box per combination of `IN` values;
//!    predicates on the same column intersect, unconstrained columns span
//!    everything including NULL.
//! 2. All boxes of all conjunctions are merged with
//!    `remove_overlapping_ranges`.
//! 3. The merged set is optionally re-checked for overlap.
//!
//! Planning is deterministic: the same filter yields the same ranges in the
//! same order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::observability::{Event, Logger, MetricsRegistry};
use crate::range::{
    validate_range_collection, MergePolicy, Range, RangeColumnExpr, RangeMerger, SqlType, Value,
};

use super::ast::{Filter, FilterOp, Predicate};
use super::errors::{PlannerError, PlannerResult};

/// Default upper bound on the ranges a single filter may expand into
pub const DEFAULT_MAX_RANGES: u64 = 4096;

/// One indexed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: SqlType,
}

impl IndexColumn {
    pub fn new(name: impl Into<String>, typ: SqlType) -> Self {
        Self {
            name: name.into(),
            typ,
        }
    }
}

/// Ordered columns of a composite index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSchema {
    columns: Vec<IndexColumn>,
}

impl IndexSchema {
    /// Creates a schema. Column names must be unique and the list non-empty.
    pub fn new(columns: Vec<IndexColumn>) -> PlannerResult<Self> {
        if columns.is_empty() {
            return Err(PlannerError::query_invalid("index must have at least one column"));
        }
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(PlannerError::invalid_value(
                    &column.name,
                    "column appears twice in the index",
                ));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    /// Position of a column in the index
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn types(&self) -> Vec<SqlType> {
        self.columns.iter().map(|c| c.typ).collect()
    }
}

/// Immutable planning result
#[derive(Debug, Clone, Serialize)]
pub struct RangePlan {
    /// Index columns the ranges are expressed over
    pub columns: Vec<IndexColumn>,
    /// Filter as planned
    pub filter: Filter,
    /// Boxes produced before merging
    pub expanded: usize,
    /// Disjoint ranges in key order
    pub ranges: Vec<Range>,
    #[serde(serialize_with = "serialize_policy")]
    pub policy: MergePolicy,
}

fn serialize_policy<S: serde::Serializer>(policy: &MergePolicy, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(policy.as_str())
}

/// Filter to index range planner
pub struct IndexRangePlanner {
    schema: IndexSchema,
    policy: MergePolicy,
    max_ranges: u64,
    validate_output: bool,
    metrics: MetricsRegistry,
}

impl IndexRangePlanner {
    /// Creates a planner with the connected merge policy, the default range
    /// limit and output validation on.
    pub fn new(schema: IndexSchema) -> Self {
        Self {
            schema,
            policy: MergePolicy::Connected,
            max_ranges: DEFAULT_MAX_RANGES,
            validate_output: true,
            metrics: MetricsRegistry::new(),
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_ranges(mut self, max_ranges: u64) -> Self {
        self.max_ranges = max_ranges;
        self
    }

    pub fn with_validation(mut self, validate_output: bool) -> Self {
        self.validate_output = validate_output;
        self
    }

    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Plans a filter, returning an immutable plan or error.
    pub fn plan(&self, filter: &Filter) -> PlannerResult<RangePlan> {
        match self.plan_inner(filter) {
            Ok(plan) => {
                self.metrics.increment_plans_completed();
                let count = plan.ranges.len().to_string();
                let expanded = plan.expanded.to_string();
                Logger::info(
                    Event::PlanComplete.as_str(),
                    &[("expanded", expanded.as_str()), ("ranges", count.as_str())],
                );
                Ok(plan)
            }
            Err(err) => {
                self.metrics.increment_plans_rejected();
                Logger::warn(
                    Event::PlanRejected.as_str(),
                    &[("code", err.code().code()), ("message", err.message())],
                );
                Err(err)
            }
        }
    }

    fn plan_inner(&self, filter: &Filter) -> PlannerResult<RangePlan> {
        if filter.disjuncts.is_empty() {
            return Err(PlannerError::query_invalid("filter has no conjunctions"));
        }

        let mut boxes = Vec::new();
        for conjunction in &filter.disjuncts {
            let expanded = self.conjunction_ranges(conjunction)?;
            boxes.extend(expanded);
            if boxes.len() as u64 > self.max_ranges {
                return Err(PlannerError::too_many_ranges(boxes.len(), self.max_ranges));
            }
        }

        let ranges = RangeMerger::new(self.policy)
            .with_metrics(&self.metrics)
            .merge(&boxes)?;
        if self.validate_output {
            validate_range_collection(&ranges)?;
        }

        Ok(RangePlan {
            columns: self.schema.columns.clone(),
            filter: filter.clone(),
            expanded: boxes.len(),
            ranges,
            policy: self.policy,
        })
    }

    /// Expands one conjunction into boxes.
    fn conjunction_ranges(&self, conjunction: &[Predicate]) -> PlannerResult<Vec<Range>> {
        // per column, the alternatives a key may fall into
        let mut alternatives: Vec<Vec<RangeColumnExpr>> = self
            .schema
            .columns
            .iter()
            .map(|c| vec![RangeColumnExpr::all(c.typ)])
            .collect();

        for predicate in conjunction {
            let position = self
                .schema
                .position(&predicate.field)
                .ok_or_else(|| PlannerError::unindexed_field(&predicate.field))?;
            let typ = self.schema.columns[position].typ;
            let exprs = predicate_exprs(predicate, typ)?;

            let mut narrowed = Vec::new();
            for current in &alternatives[position] {
                for expr in &exprs {
                    let piece = current.intersect(expr)?;
                    if !piece.is_empty()? {
                        narrowed.push(piece);
                    }
                }
            }
            // an unsatisfiable column still needs one alternative
            if narrowed.is_empty() {
                narrowed.push(RangeColumnExpr::empty(typ));
            }
            alternatives[position] = narrowed;

            let count = alternatives
                .iter()
                .fold(1usize, |acc, alts| acc.saturating_mul(alts.len()));
            if count as u64 > self.max_ranges {
                return Err(PlannerError::too_many_ranges(count, self.max_ranges));
            }
        }

        let mut boxes: Vec<Vec<RangeColumnExpr>> = vec![Vec::with_capacity(alternatives.len())];
        for alts in &alternatives {
            let mut next = Vec::with_capacity(boxes.len() * alts.len());
            for prefix in &boxes {
                for alt in alts {
                    let mut columns = prefix.clone();
                    columns.push(alt.clone());
                    next.push(columns);
                }
            }
            boxes = next;
        }
        Ok(boxes.into_iter().map(Range::new).collect())
    }
}

/// Column ranges matching a predicate; more than one only for `IN`.
fn predicate_exprs(predicate: &Predicate, typ: SqlType) -> PlannerResult<Vec<RangeColumnExpr>> {
    let key = |json: &serde_json::Value| key_for(&predicate.field, json, typ);
    let exprs = match &predicate.op {
        FilterOp::Eq(v) => vec![RangeColumnExpr::eq(key(v)?, typ)],
        FilterOp::Gt(v) => vec![RangeColumnExpr::gt(key(v)?, typ)],
        FilterOp::Gte(v) => vec![RangeColumnExpr::gte(key(v)?, typ)],
        FilterOp::Lt(v) => vec![RangeColumnExpr::lt(key(v)?, typ)],
        FilterOp::Lte(v) => vec![RangeColumnExpr::lte(key(v)?, typ)],
        FilterOp::IsNull => vec![RangeColumnExpr::null(typ)],
        FilterOp::IsNotNull => vec![RangeColumnExpr::not_null(typ)],
        FilterOp::In(values) if values.is_empty() => vec![RangeColumnExpr::empty(typ)],
        FilterOp::In(values) => values
            .iter()
            .map(|v| -> PlannerResult<RangeColumnExpr> { Ok(RangeColumnExpr::eq(key(v)?, typ)) })
            .collect::<PlannerResult<Vec<_>>>()?,
    };
    Ok(exprs)
}

fn key_for(field: &str, json: &serde_json::Value, typ: SqlType) -> PlannerResult<Value> {
    if json.is_null() {
        return Err(PlannerError::invalid_value(
            field,
            "null is not a key, use is_null",
        ));
    }
    let value = Value::from_json(json).ok_or_else(|| {
        PlannerError::invalid_value(field, format!("{} is not a scalar key", json))
    })?;
    typ.validate(&value)
        .map_err(|e| PlannerError::invalid_value(field, e.message()))?;
    Ok(value)
}
