//! Cuts: positions on an ordered value line
//!
//! A cut sits between values rather than on them, so a single cut carries
//! its own open/closed meaning depending on whether it is used as a lower or
//! an upper bound. `Below(5)` as a lower bound is `[5`, as an upper bound
//! it is `5)`.
//!
//! Order within one column:
//!
//! ```text
//! BelowNull < AboveNull < Below(k) < Above(k) < Below(k') ... < AboveAll
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::RangeResult;
use super::types::{SqlType, Value};

/// Whether a bound includes its endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundType {
    /// Endpoint excluded
    Open,
    /// Endpoint included
    Closed,
}

/// A boundary position in one column's value order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cut", content = "key", rename_all = "snake_case")]
pub enum Cut {
    /// Just above `key`
    Above(Value),
    /// Just below `key`
    Below(Value),
    /// Beyond every value
    AboveAll,
    /// Just above NULL, below every non-null value
    AboveNull,
    /// Below NULL and everything else
    BelowNull,
}

impl Cut {
    /// Compares two cuts under the column type.
    pub fn compare(&self, other: &Cut, typ: SqlType) -> RangeResult<Ordering> {
        use Cut::*;
        let ord = match (self, other) {
            (AboveAll, AboveAll) => Ordering::Equal,
            (AboveAll, _) => Ordering::Greater,
            (_, AboveAll) => Ordering::Less,

            (BelowNull, BelowNull) => Ordering::Equal,
            (BelowNull, _) => Ordering::Less,
            (_, BelowNull) => Ordering::Greater,

            (AboveNull, AboveNull) => Ordering::Equal,
            (AboveNull, _) => Ordering::Less,
            (_, AboveNull) => Ordering::Greater,

            (Above(a), Above(b)) | (Below(a), Below(b)) => typ.compare(a, b)?,
            (Above(a), Below(b)) => match typ.compare(a, b)? {
                Ordering::Less => Ordering::Less,
                _ => Ordering::Greater,
            },
            (Below(a), Above(b)) => match typ.compare(a, b)? {
                Ordering::Greater => Ordering::Greater,
                _ => Ordering::Less,
            },
        };
        Ok(ord)
    }

    /// Open/closed meaning when used as a lower bound
    pub fn type_as_lower_bound(&self) -> BoundType {
        match self {
            Cut::Above(_) | Cut::AboveAll | Cut::AboveNull => BoundType::Open,
            Cut::Below(_) | Cut::BelowNull => BoundType::Closed,
        }
    }

    /// Open/closed meaning when used as an upper bound
    pub fn type_as_upper_bound(&self) -> BoundType {
        match self {
            Cut::Above(_) | Cut::AboveNull => BoundType::Closed,
            Cut::Below(_) | Cut::AboveAll | Cut::BelowNull => BoundType::Open,
        }
    }

    /// Returns the key for non-synthetic cuts
    pub fn key(&self) -> Option<&Value> {
        match self {
            Cut::Above(k) | Cut::Below(k) => Some(k),
            _ => None,
        }
    }

    /// Checks the key (if any) belongs to the column type
    pub fn validate(&self, typ: SqlType) -> RangeResult<()> {
        match self.key() {
            Some(key) => typ.validate(key),
            None => Ok(()),
        }
    }

    /// Renders the cut as the left end of an interval, e.g. `[5` or `(NULL`
    pub fn display_as_lower(&self) -> String {
        match self {
            Cut::Above(k) => format!("({}", k),
            Cut::Below(k) => format!("[{}", k),
            Cut::AboveAll => "(∞".to_string(),
            Cut::AboveNull => "(NULL".to_string(),
            Cut::BelowNull => "[NULL".to_string(),
        }
    }

    /// Renders the cut as the right end of an interval, e.g. `5]` or `∞)`
    pub fn display_as_upper(&self) -> String {
        match self {
            Cut::Above(k) => format!("{}]", k),
            Cut::Below(k) => format!("{})", k),
            Cut::AboveAll => "∞)".to_string(),
            Cut::AboveNull => "NULL]".to_string(),
            Cut::BelowNull => "NULL)".to_string(),
        }
    }
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cut::Above(k) => write!(f, "Above[{}]", k),
            Cut::Below(k) => write!(f, "Below[{}]", k),
            Cut::AboveAll => write!(f, "AboveAll"),
            Cut::AboveNull => write!(f, "AboveNull"),
            Cut::BelowNull => write!(f, "BelowNull"),
        }
    }
}

/// Returns the smaller of two cuts
pub fn min_cut<'a>(a: &'a Cut, b: &'a Cut, typ: SqlType) -> RangeResult<&'a Cut> {
    Ok(if a.compare(b, typ)? == Ordering::Greater { b } else { a })
}

/// Returns the larger of two cuts
pub fn max_cut<'a>(a: &'a Cut, b: &'a Cut, typ: SqlType) -> RangeResult<&'a Cut> {
    Ok(if a.compare(b, typ)? == Ordering::Less { b } else { a })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn above(v: i64) -> Cut {
        Cut::Above(Value::Int(v))
    }

    fn below(v: i64) -> Cut {
        Cut::Below(Value::Int(v))
    }

    const INT: SqlType = SqlType::Int64;

    #[test]
    fn test_null_cut_ordering() {
        assert_eq!(Cut::BelowNull.compare(&Cut::AboveNull, INT).unwrap(), Ordering::Less);
        assert_eq!(above(5).compare(&Cut::AboveNull, INT).unwrap(), Ordering::Greater);
        assert_eq!(Cut::AboveNull.compare(&Cut::AboveNull, INT).unwrap(), Ordering::Equal);
        assert_eq!(Cut::AboveNull.compare(&below(i64::MIN), INT).unwrap(), Ordering::Less);
        assert_eq!(Cut::BelowNull.compare(&Cut::BelowNull, INT).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_above_all_is_greatest() {
        for cut in [above(i64::MAX), below(0), Cut::AboveNull, Cut::BelowNull] {
            assert_eq!(Cut::AboveAll.compare(&cut, INT).unwrap(), Ordering::Greater);
            assert_eq!(cut.compare(&Cut::AboveAll, INT).unwrap(), Ordering::Less);
        }
        assert_eq!(Cut::AboveAll.compare(&Cut::AboveAll, INT).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_same_key_below_precedes_above() {
        assert_eq!(below(5).compare(&above(5), INT).unwrap(), Ordering::Less);
        assert_eq!(above(5).compare(&below(5), INT).unwrap(), Ordering::Greater);
        assert_eq!(above(5).compare(&below(6), INT).unwrap(), Ordering::Less);
        assert_eq!(below(6).compare(&above(5), INT).unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_null_cuts_skip_type_compare() {
        // Text keys against an int column would fail, NULL cuts never reach the type.
        assert_eq!(Cut::AboveNull.compare(&Cut::BelowNull, INT).unwrap(), Ordering::Greater);
        assert!(Cut::Above(Value::Text("x".into())).compare(&above(1), INT).is_err());
    }

    #[test]
    fn test_bound_types() {
        assert_eq!(above(1).type_as_lower_bound(), BoundType::Open);
        assert_eq!(above(1).type_as_upper_bound(), BoundType::Closed);
        assert_eq!(below(1).type_as_lower_bound(), BoundType::Closed);
        assert_eq!(below(1).type_as_upper_bound(), BoundType::Open);
        assert_eq!(Cut::AboveNull.type_as_upper_bound(), BoundType::Closed);
        assert_eq!(Cut::BelowNull.type_as_lower_bound(), BoundType::Closed);
        assert_eq!(Cut::AboveAll.type_as_upper_bound(), BoundType::Open);
    }

    #[test]
    fn test_min_max() {
        let a = below(3);
        let b = above(3);
        assert_eq!(min_cut(&a, &b, INT).unwrap(), &a);
        assert_eq!(max_cut(&a, &b, INT).unwrap(), &b);
    }

    #[test]
    fn test_rendering() {
        assert_eq!(below(1).display_as_lower(), "[1");
        assert_eq!(above(5).display_as_upper(), "5]");
        assert_eq!(Cut::AboveAll.display_as_upper(), "∞)");
        assert_eq!(Cut::AboveNull.display_as_lower(), "(NULL");
    }
}
