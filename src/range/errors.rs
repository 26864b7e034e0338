//! Range subsystem error types
//!
//! Error codes:
//! - AERO_RANGE_TYPE_MISMATCH (REJECT)
//! - AERO_RANGE_EMPTY_RANGE (REJECT)
//! - AERO_RANGE_DIMENSION_MISMATCH (REJECT)
//! - AERO_RANGE_OVERLAP_DETECTED (FATAL)
//!
//! Tree invariants (red-black shape, max upper bound augmentation) are never
//! reported here. A violation of those is a bug, not a data condition.

use std::fmt;

/// Severity levels for range errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller input rejected, tree untouched
    Reject,
    /// Merge output is inconsistent
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Range-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeErrorCode {
    /// Two keys cannot be compared under the column type
    AeroRangeTypeMismatch,
    /// A tree was built from a zero-length range
    AeroRangeEmptyRange,
    /// Range arity differs from the tree's column count
    AeroRangeDimensionMismatch,
    /// Merged ranges still overlap
    AeroRangeOverlapDetected,
}

impl RangeErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            RangeErrorCode::AeroRangeTypeMismatch => "AERO_RANGE_TYPE_MISMATCH",
            RangeErrorCode::AeroRangeEmptyRange => "AERO_RANGE_EMPTY_RANGE",
            RangeErrorCode::AeroRangeDimensionMismatch => "AERO_RANGE_DIMENSION_MISMATCH",
            RangeErrorCode::AeroRangeOverlapDetected => "AERO_RANGE_OVERLAP_DETECTED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            RangeErrorCode::AeroRangeOverlapDetected => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for RangeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Range error type with context
#[derive(Debug, Clone, PartialEq)]
pub struct RangeError {
    code: RangeErrorCode,
    message: String,
    /// Column (dimension) index if applicable
    column: Option<usize>,
}

impl RangeError {
    /// Create a type mismatch error
    pub fn type_mismatch(reason: impl Into<String>) -> Self {
        Self {
            code: RangeErrorCode::AeroRangeTypeMismatch,
            message: reason.into(),
            column: None,
        }
    }

    /// Create an empty range error
    pub fn empty_range() -> Self {
        Self {
            code: RangeErrorCode::AeroRangeEmptyRange,
            message: "a range tree cannot be created from a range of length 0".into(),
            column: None,
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(expected: usize, found: usize) -> Self {
        Self {
            code: RangeErrorCode::AeroRangeDimensionMismatch,
            message: format!("expected a range over {} columns, found {}", expected, found),
            column: None,
        }
    }

    /// Create an overlap detected error
    pub fn overlap_detected(first: usize, second: usize) -> Self {
        Self {
            code: RangeErrorCode::AeroRangeOverlapDetected,
            message: format!("ranges {} and {} overlap after merging", first, second),
            column: None,
        }
    }

    /// Attach the column index the error originated in
    pub fn at_column(mut self, column: usize) -> Self {
        if self.column.is_none() {
            self.column = Some(column);
        }
        self
    }

    /// Returns the error code
    pub fn code(&self) -> RangeErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the column index if known
    pub fn column(&self) -> Option<usize> {
        self.column
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(column) = self.column {
            write!(f, " (column {})", column)?;
        }
        Ok(())
    }
}

impl std::error::Error for RangeError {}

/// Result type for range operations
pub type RangeResult<T> = Result<T, RangeError>;
