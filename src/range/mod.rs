//! Index range representation and merging
//!
//! Ranges over a composite index are boxes: one interval per index column.
//! This module provides:
//!
//! - `Cut`: a boundary point between keys, with explicit NULL and infinity
//!   positions
//! - `RangeColumnExpr` and `Range`: single- and multi-column intervals with
//!   their set algebra
//! - `RangeColumnExprTree`: a red-black interval tree per column, nested
//!   per remaining column, augmented with the largest upper cut of each
//!   subtree for connection queries
//! - `remove_overlapping_ranges`: collapses arbitrary ranges into a
//!   disjoint, sorted set
//!
//! Cut order within a column:
//!
//! ```text
//! BelowNull < AboveNull < Below(k) < Above(k) < AboveAll
//! ```
//!
//! so NULL sorts before every non-NULL key.
//!
//! # Errors
//!
//! Every comparison goes through the column's `SqlType`; a key of the
//! wrong kind is `AERO_RANGE_TYPE_MISMATCH`. Trees validate a range in full
//! before changing anything, so a rejected call leaves the tree untouched.

mod column_expr;
mod cut;
mod errors;
mod explain;
mod merge;
#[allow(clippy::module_inception)]
mod range;
mod tree;
mod types;

pub use column_expr::{MergePolicy, RangeColumnExpr};
pub use cut::{max_cut, min_cut, BoundType, Cut};
pub use errors::{RangeError, RangeErrorCode, RangeResult, Severity};
pub use explain::{NodeExplain, TreeExplain};
pub use merge::{remove_overlapping_ranges, validate_range_collection, RangeMerger};
pub use range::Range;
pub use tree::{Color, Iter, NodeRef, RangeColumnExprTree};
pub use types::{SqlType, Value};
