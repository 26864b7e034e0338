//! Multi-column ranges
//!
//! A `Range` holds one `RangeColumnExpr` per index column, in index column
//! order. It describes the box of index keys satisfying a conjunction of
//! column predicates.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::column_expr::{MergePolicy, RangeColumnExpr};
use super::cut::{max_cut, min_cut};
use super::errors::RangeResult;
use super::types::Value;

/// An ordered sequence of column ranges, one per index column
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Range {
    columns: Vec<RangeColumnExpr>,
}

impl Range {
    /// Creates a range from its column expressions
    pub fn new(columns: Vec<RangeColumnExpr>) -> Self {
        Self { columns }
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column expressions in index order
    pub fn columns(&self) -> &[RangeColumnExpr] {
        &self.columns
    }

    /// Consumes the range, returning its columns
    pub fn into_columns(self) -> Vec<RangeColumnExpr> {
        self.columns
    }

    /// Checks every column's keys belong to its type
    pub fn validate(&self) -> RangeResult<()> {
        for (i, col) in self.columns.iter().enumerate() {
            col.validate().map_err(|e| e.at_column(i))?;
        }
        Ok(())
    }

    /// True when any column is empty, making the whole box empty
    pub fn is_empty(&self) -> RangeResult<bool> {
        for col in &self.columns {
            if col.is_empty()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True when an index key lies inside the box. `None` entries are NULL.
    pub fn contains(&self, key: &[Option<Value>]) -> RangeResult<bool> {
        if key.len() != self.columns.len() {
            return Ok(false);
        }
        for (col, value) in self.columns.iter().zip(key) {
            if !col.contains(value.as_ref())? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Column-wise equality of cuts
    pub fn equals(&self, other: &Range) -> RangeResult<bool> {
        if self.columns.len() != other.columns.len() {
            return Ok(false);
        }
        for (a, b) in self.columns.iter().zip(&other.columns) {
            if !a.equals(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True when every column of `other` lies within the matching column
    pub fn is_superset_of(&self, other: &Range) -> RangeResult<bool> {
        if self.columns.len() != other.columns.len() {
            return Ok(false);
        }
        for (a, b) in self.columns.iter().zip(&other.columns) {
            if !a.is_superset_of(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True when every column overlaps or touches the matching column
    pub fn is_connected(&self, other: &Range) -> RangeResult<bool> {
        if self.columns.len() != other.columns.len() {
            return Ok(false);
        }
        for (a, b) in self.columns.iter().zip(&other.columns) {
            if !a.is_connected(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Returns the intersection if every column overlaps
    pub fn overlaps(&self, other: &Range) -> RangeResult<Option<Range>> {
        if self.columns.len() != other.columns.len() {
            return Ok(None);
        }
        let mut intersection = Vec::with_capacity(self.columns.len());
        for (a, b) in self.columns.iter().zip(&other.columns) {
            match a.overlaps(b)? {
                Some(col) => intersection.push(col),
                None => return Ok(None),
            }
        }
        Ok(Some(Range::new(intersection)))
    }

    /// Attempts to express the union of two ranges as a single range.
    ///
    /// Succeeds when one range contains the other, or when the ranges agree
    /// on every column but one and that column is mergeable.
    pub fn try_merge(&self, other: &Range, policy: MergePolicy) -> RangeResult<Option<Range>> {
        if self.columns.len() != other.columns.len() {
            return Ok(None);
        }
        if self.is_superset_of(other)? {
            return Ok(Some(self.clone()));
        }
        if other.is_superset_of(self)? {
            return Ok(Some(other.clone()));
        }

        let mut differing = None;
        for (i, (a, b)) in self.columns.iter().zip(&other.columns).enumerate() {
            if !a.equals(b)? {
                if differing.is_some() {
                    return Ok(None);
                }
                differing = Some(i);
            }
        }

        let Some(i) = differing else {
            return Ok(Some(self.clone()));
        };
        match self.columns[i].try_union(&other.columns[i], policy)? {
            Some(union) => {
                let mut merged = self.clone();
                merged.columns[i] = union;
                Ok(Some(merged))
            }
            None => Ok(None),
        }
    }

    /// Returns `self` minus `other` as pairwise disjoint ranges.
    ///
    /// Column by column, the parts of `self` below and above `other` are cut
    /// off as separate pieces and the remainder narrows to the
    /// intersection, so at most two pieces are produced per column.
    pub fn remove_overlap(&self, other: &Range) -> RangeResult<Vec<Range>> {
        if self.overlaps(other)?.is_none() {
            return Ok(vec![self.clone()]);
        }

        let mut pieces = Vec::new();
        let mut current = self.clone();
        for i in 0..current.columns.len() {
            let ours = current.columns[i].clone();
            let theirs = &other.columns[i];
            let typ = ours.typ;

            let below_upper = min_cut(&ours.upper_bound, &theirs.lower_bound, typ)?;
            let below = RangeColumnExpr::new(ours.lower_bound.clone(), below_upper.clone(), typ);
            if !below.is_empty()? {
                let mut piece = current.clone();
                piece.columns[i] = below;
                pieces.push(piece);
            }

            let above_lower = max_cut(&ours.lower_bound, &theirs.upper_bound, typ)?;
            let above = RangeColumnExpr::new(above_lower.clone(), ours.upper_bound.clone(), typ);
            if !above.is_empty()? {
                let mut piece = current.clone();
                piece.columns[i] = above;
                pieces.push(piece);
            }

            current.columns[i] = ours.intersect(theirs)?;
        }
        Ok(pieces)
    }
}

impl Index<usize> for Range {
    type Output = RangeColumnExpr;

    fn index(&self, index: usize) -> &Self::Output {
        &self.columns[index]
    }
}

impl From<Vec<RangeColumnExpr>> for Range {
    fn from(columns: Vec<RangeColumnExpr>) -> Self {
        Range::new(columns)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", col)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::types::SqlType;

    const INT: SqlType = SqlType::Int64;

    fn r2(a: (i64, i64), b: (i64, i64)) -> Range {
        Range::new(vec![
            RangeColumnExpr::closed(a.0, a.1, INT),
            RangeColumnExpr::closed(b.0, b.1, INT),
        ])
    }

    #[test]
    fn test_display() {
        assert_eq!(r2((1, 3), (10, 20)).to_string(), "{[1, 3], [10, 20]}");
    }

    #[test]
    fn test_empty_if_any_column_empty() {
        assert!(!r2((1, 3), (10, 20)).is_empty().unwrap());
        assert!(r2((1, 3), (20, 10)).is_empty().unwrap());
    }

    #[test]
    fn test_merge_single_differing_column() {
        let merged = r2((1, 3), (10, 20))
            .try_merge(&r2((1, 3), (15, 30)), MergePolicy::Connected)
            .unwrap()
            .unwrap();
        assert_eq!(merged, r2((1, 3), (10, 30)));
    }

    #[test]
    fn test_merge_rejects_two_differing_columns() {
        let merged = r2((1, 3), (10, 20))
            .try_merge(&r2((2, 4), (15, 30)), MergePolicy::Connected)
            .unwrap();
        assert!(merged.is_none());
    }

    #[test]
    fn test_merge_superset_absorbs() {
        let big = r2((1, 10), (1, 10));
        let small = r2((2, 4), (5, 6));
        assert_eq!(
            big.try_merge(&small, MergePolicy::Connected).unwrap(),
            Some(big.clone())
        );
        assert_eq!(
            small.try_merge(&big, MergePolicy::Connected).unwrap(),
            Some(big.clone())
        );
    }

    #[test]
    fn test_overlaps_requires_every_column() {
        assert!(r2((1, 3), (10, 20))
            .overlaps(&r2((3, 5), (21, 30)))
            .unwrap()
            .is_none());
        let overlap = r2((1, 3), (10, 20))
            .overlaps(&r2((3, 5), (15, 30)))
            .unwrap()
            .unwrap();
        assert_eq!(overlap, r2((3, 3), (15, 20)));
    }

    #[test]
    fn test_remove_overlap_pieces_are_disjoint() {
        let a = r2((1, 10), (1, 10));
        let b = r2((4, 6), (4, 6));
        let pieces = a.remove_overlap(&b).unwrap();
        assert_eq!(pieces.len(), 4);
        for (i, p) in pieces.iter().enumerate() {
            assert!(p.overlaps(&b).unwrap().is_none());
            for q in &pieces[i + 1..] {
                assert!(p.overlaps(q).unwrap().is_none());
            }
        }
        assert_eq!(pieces[0].to_string(), "{[1, 4), [1, 10]}");
        assert_eq!(pieces[1].to_string(), "{(6, 10], [1, 10]}");
        assert_eq!(pieces[2].to_string(), "{[4, 6], [1, 4)}");
        assert_eq!(pieces[3].to_string(), "{[4, 6], (6, 10]}");
    }

    #[test]
    fn test_remove_overlap_disjoint_is_identity() {
        let a = r2((1, 2), (1, 2));
        let b = r2((5, 6), (1, 2));
        assert_eq!(a.remove_overlap(&b).unwrap(), vec![a.clone()]);
    }

    #[test]
    fn test_remove_overlap_fully_covered() {
        let a = r2((4, 5), (4, 5));
        let b = r2((1, 10), (1, 10));
        assert!(a.remove_overlap(&b).unwrap().is_empty());
    }
}
