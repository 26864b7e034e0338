//! Index range planner
//!
//! Turns column predicates into the disjoint key ranges of a composite
//! index.
//!
//! # Design Principles
//!
//! - Deterministic: same filter, same ranges, same order
//! - Indexed: predicates only on index columns
//! - Explicit: values must match the column type, no coercion beyond
//!   integer literals on float columns

mod ast;
mod errors;
mod explain;
#[allow(clippy::module_inception)]
mod planner;

pub use ast::{Filter, FilterOp, Predicate};
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult, Severity};
pub use explain::ExplainPlan;
pub use planner::{IndexColumn, IndexRangePlanner, IndexSchema, RangePlan, DEFAULT_MAX_RANGES};
