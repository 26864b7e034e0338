//! Single-column ranges

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::cut::{max_cut, min_cut, Cut};
use super::errors::RangeResult;
use super::types::{SqlType, Value};

/// Rule deciding when two column ranges may be fused into one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Merge only when the cuts touch or overlap
    #[default]
    Connected,
    /// Also merge closed bounds whose keys are adjacent under the type,
    /// so integer `[1, 5]` and `[6, 10]` become `[1, 10]`
    AdjacentValues,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Connected => "connected",
            MergePolicy::AdjacentValues => "adjacent_values",
        }
    }
}

/// One column's range: a lower cut, an upper cut and the column type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeColumnExpr {
    /// Lower boundary
    pub lower_bound: Cut,
    /// Upper boundary
    pub upper_bound: Cut,
    /// Column type used for every comparison
    #[serde(rename = "type")]
    pub typ: SqlType,
}

impl RangeColumnExpr {
    /// Creates a column range from explicit cuts
    pub fn new(lower_bound: Cut, upper_bound: Cut, typ: SqlType) -> Self {
        Self {
            lower_bound,
            upper_bound,
            typ,
        }
    }

    /// `[lower, upper]`
    pub fn closed(lower: impl Into<Value>, upper: impl Into<Value>, typ: SqlType) -> Self {
        Self::new(Cut::Below(lower.into()), Cut::Above(upper.into()), typ)
    }

    /// `(lower, upper)`
    pub fn open(lower: impl Into<Value>, upper: impl Into<Value>, typ: SqlType) -> Self {
        Self::new(Cut::Above(lower.into()), Cut::Below(upper.into()), typ)
    }

    /// `[lower, upper)`
    pub fn closed_open(lower: impl Into<Value>, upper: impl Into<Value>, typ: SqlType) -> Self {
        Self::new(Cut::Below(lower.into()), Cut::Below(upper.into()), typ)
    }

    /// `(lower, upper]`
    pub fn open_closed(lower: impl Into<Value>, upper: impl Into<Value>, typ: SqlType) -> Self {
        Self::new(Cut::Above(lower.into()), Cut::Above(upper.into()), typ)
    }

    /// `= key`
    pub fn eq(key: impl Into<Value>, typ: SqlType) -> Self {
        let key = key.into();
        Self::new(Cut::Below(key.clone()), Cut::Above(key), typ)
    }

    /// `> key`
    pub fn gt(key: impl Into<Value>, typ: SqlType) -> Self {
        Self::new(Cut::Above(key.into()), Cut::AboveAll, typ)
    }

    /// `>= key`
    pub fn gte(key: impl Into<Value>, typ: SqlType) -> Self {
        Self::new(Cut::Below(key.into()), Cut::AboveAll, typ)
    }

    /// `< key`, excluding NULL
    pub fn lt(key: impl Into<Value>, typ: SqlType) -> Self {
        Self::new(Cut::AboveNull, Cut::Below(key.into()), typ)
    }

    /// `<= key`, excluding NULL
    pub fn lte(key: impl Into<Value>, typ: SqlType) -> Self {
        Self::new(Cut::AboveNull, Cut::Above(key.into()), typ)
    }

    /// `IS NULL`
    pub fn null(typ: SqlType) -> Self {
        Self::new(Cut::BelowNull, Cut::AboveNull, typ)
    }

    /// `IS NOT NULL`
    pub fn not_null(typ: SqlType) -> Self {
        Self::new(Cut::AboveNull, Cut::AboveAll, typ)
    }

    /// Every value including NULL
    pub fn all(typ: SqlType) -> Self {
        Self::new(Cut::BelowNull, Cut::AboveAll, typ)
    }

    /// A range containing nothing
    pub fn empty(typ: SqlType) -> Self {
        Self::new(Cut::AboveAll, Cut::AboveAll, typ)
    }

    /// Checks both cut keys belong to the column type
    pub fn validate(&self) -> RangeResult<()> {
        self.lower_bound.validate(self.typ)?;
        self.upper_bound.validate(self.typ)
    }

    /// True when no value satisfies the range
    pub fn is_empty(&self) -> RangeResult<bool> {
        Ok(self.lower_bound.compare(&self.upper_bound, self.typ)? != Ordering::Less)
    }

    /// Same cuts in both positions
    pub fn equals(&self, other: &RangeColumnExpr) -> RangeResult<bool> {
        Ok(self.lower_bound.compare(&other.lower_bound, self.typ)? == Ordering::Equal
            && self.upper_bound.compare(&other.upper_bound, self.typ)? == Ordering::Equal)
    }

    /// True when the two ranges overlap or touch, e.g. `(.., 5]` and `(5, ..)`
    pub fn is_connected(&self, other: &RangeColumnExpr) -> RangeResult<bool> {
        Ok(
            self.lower_bound.compare(&other.upper_bound, self.typ)? != Ordering::Greater
                && other.lower_bound.compare(&self.upper_bound, self.typ)? != Ordering::Greater,
        )
    }

    /// True when the union of the two ranges is itself a single range
    pub fn is_mergeable(&self, other: &RangeColumnExpr, policy: MergePolicy) -> RangeResult<bool> {
        if self.is_connected(other)? {
            return Ok(true);
        }
        if policy == MergePolicy::Connected {
            return Ok(false);
        }
        // Disconnected: exactly one side lies entirely below the other.
        let (low, high) = if self.upper_bound.compare(&other.lower_bound, self.typ)? == Ordering::Less {
            (self, other)
        } else {
            (other, self)
        };
        match (&low.upper_bound, &high.lower_bound) {
            (Cut::Above(last), Cut::Below(first)) => self.typ.is_adjacent(last, first),
            _ => Ok(false),
        }
    }

    /// Returns the intersection if it is non-empty
    pub fn overlaps(&self, other: &RangeColumnExpr) -> RangeResult<Option<RangeColumnExpr>> {
        let lower = max_cut(&self.lower_bound, &other.lower_bound, self.typ)?;
        let upper = min_cut(&self.upper_bound, &other.upper_bound, self.typ)?;
        let intersection = RangeColumnExpr::new(lower.clone(), upper.clone(), self.typ);
        if intersection.is_empty()? {
            Ok(None)
        } else {
            Ok(Some(intersection))
        }
    }

    /// Intersection, possibly empty
    pub fn intersect(&self, other: &RangeColumnExpr) -> RangeResult<RangeColumnExpr> {
        let lower = max_cut(&self.lower_bound, &other.lower_bound, self.typ)?;
        let upper = min_cut(&self.upper_bound, &other.upper_bound, self.typ)?;
        Ok(RangeColumnExpr::new(lower.clone(), upper.clone(), self.typ))
    }

    /// Union of two mergeable ranges, None otherwise
    pub fn try_union(
        &self,
        other: &RangeColumnExpr,
        policy: MergePolicy,
    ) -> RangeResult<Option<RangeColumnExpr>> {
        if !self.is_mergeable(other, policy)? {
            return Ok(None);
        }
        let lower = min_cut(&self.lower_bound, &other.lower_bound, self.typ)?;
        let upper = max_cut(&self.upper_bound, &other.upper_bound, self.typ)?;
        Ok(Some(RangeColumnExpr::new(lower.clone(), upper.clone(), self.typ)))
    }

    /// True when the key lies within the range. `None` is NULL.
    pub fn contains(&self, key: Option<&Value>) -> RangeResult<bool> {
        let (just_below, just_above) = match key {
            Some(v) => (Cut::Below(v.clone()), Cut::Above(v.clone())),
            None => (Cut::BelowNull, Cut::AboveNull),
        };
        Ok(
            self.lower_bound.compare(&just_below, self.typ)? != Ordering::Greater
                && just_above.compare(&self.upper_bound, self.typ)? != Ordering::Greater,
        )
    }

    /// True when `other` lies entirely within this range
    pub fn is_superset_of(&self, other: &RangeColumnExpr) -> RangeResult<bool> {
        Ok(
            self.lower_bound.compare(&other.lower_bound, self.typ)? != Ordering::Greater
                && self.upper_bound.compare(&other.upper_bound, self.typ)? != Ordering::Less,
        )
    }
}

impl fmt::Display for RangeColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}",
            self.lower_bound.display_as_lower(),
            self.upper_bound.display_as_upper()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT: SqlType = SqlType::Int64;

    #[test]
    fn test_emptiness() {
        assert!(!RangeColumnExpr::eq(5, INT).is_empty().unwrap());
        assert!(RangeColumnExpr::open(5, 5, INT).is_empty().unwrap());
        assert!(RangeColumnExpr::closed_open(5, 5, INT).is_empty().unwrap());
        assert!(RangeColumnExpr::closed(6, 5, INT).is_empty().unwrap());
        assert!(RangeColumnExpr::empty(INT).is_empty().unwrap());
        assert!(!RangeColumnExpr::null(INT).is_empty().unwrap());
    }

    #[test]
    fn test_connected_touching_cuts() {
        let a = RangeColumnExpr::new(Cut::AboveNull, Cut::Above(Value::Int(5)), INT);
        let b = RangeColumnExpr::gt(5, INT);
        assert!(a.is_connected(&b).unwrap());
        assert!(a.overlaps(&b).unwrap().is_none());

        let c = RangeColumnExpr::lt(5, INT);
        let d = RangeColumnExpr::gt(5, INT);
        assert!(!c.is_connected(&d).unwrap());
    }

    #[test]
    fn test_adjacent_values_merge_only_with_policy() {
        let a = RangeColumnExpr::closed(1, 5, INT);
        let b = RangeColumnExpr::closed(6, 10, INT);
        assert!(!a.is_mergeable(&b, MergePolicy::Connected).unwrap());
        assert!(b.is_mergeable(&a, MergePolicy::AdjacentValues).unwrap());
        let merged = a.try_union(&b, MergePolicy::AdjacentValues).unwrap().unwrap();
        assert_eq!(merged, RangeColumnExpr::closed(1, 10, INT));

        // (6, 9) starts at 7, leaving 6 uncovered.
        let gap = RangeColumnExpr::open(6, 9, INT);
        assert!(!RangeColumnExpr::closed(1, 5, INT)
            .is_mergeable(&gap, MergePolicy::AdjacentValues)
            .unwrap());
        let touching = RangeColumnExpr::open(5, 9, INT);
        assert!(RangeColumnExpr::closed(1, 5, INT)
            .is_mergeable(&touching, MergePolicy::Connected)
            .unwrap());
    }

    #[test]
    fn test_overlap_intersection() {
        let a = RangeColumnExpr::closed(1, 10, INT);
        let b = RangeColumnExpr::open(5, 20, INT);
        let overlap = a.overlaps(&b).unwrap().unwrap();
        assert_eq!(overlap, RangeColumnExpr::open_closed(5, 10, INT));
    }

    #[test]
    fn test_superset() {
        let all = RangeColumnExpr::all(INT);
        assert!(all.is_superset_of(&RangeColumnExpr::null(INT)).unwrap());
        assert!(all.is_superset_of(&RangeColumnExpr::closed(1, 2, INT)).unwrap());
        assert!(!RangeColumnExpr::not_null(INT)
            .is_superset_of(&RangeColumnExpr::null(INT))
            .unwrap());
    }

    #[test]
    fn test_contains() {
        let v = |i: i64| Value::Int(i);
        let half_open = RangeColumnExpr::closed_open(1, 5, INT);
        assert!(half_open.contains(Some(&v(1))).unwrap());
        assert!(half_open.contains(Some(&v(4))).unwrap());
        assert!(!half_open.contains(Some(&v(5))).unwrap());
        assert!(!half_open.contains(None).unwrap());

        assert!(RangeColumnExpr::null(INT).contains(None).unwrap());
        assert!(!RangeColumnExpr::null(INT).contains(Some(&v(0))).unwrap());
        assert!(RangeColumnExpr::all(INT).contains(None).unwrap());
        assert!(!RangeColumnExpr::not_null(INT).contains(None).unwrap());
        assert!(!RangeColumnExpr::lt(3, INT).contains(None).unwrap());
    }

    #[test]
    fn test_display() {
        assert_eq!(RangeColumnExpr::closed(1, 5, INT).to_string(), "[1, 5]");
        assert_eq!(RangeColumnExpr::gt(3, INT).to_string(), "(3, ∞)");
        assert_eq!(RangeColumnExpr::null(INT).to_string(), "[NULL, NULL]");
    }
}
