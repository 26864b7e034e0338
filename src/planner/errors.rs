//! Planner error types
//!
//! Error codes:
//! - AERO_QUERY_INVALID (REJECT)
//! - AERO_QUERY_UNINDEXED_FIELD (REJECT)
//! - AERO_QUERY_TOO_MANY_RANGES (REJECT)
//! - AERO_QUERY_RANGE_FAILED (REJECT, or FATAL when the range layer
//!   reports overlapping output)

use std::fmt;

use crate::range::{self, RangeError};

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
    /// Planner produced an inconsistent result
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

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Malformed filter or value
    AeroQueryInvalid,
    /// Predicate on a column the index does not cover
    AeroQueryUnindexedField,
    /// Filter expands into more ranges than allowed
    AeroQueryTooManyRanges,
    /// Range building or merging failed
    AeroQueryRangeFailed,
}

impl PlannerErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::AeroQueryInvalid => "AERO_QUERY_INVALID",
            PlannerErrorCode::AeroQueryUnindexedField => "AERO_QUERY_UNINDEXED_FIELD",
            PlannerErrorCode::AeroQueryTooManyRanges => "AERO_QUERY_TOO_MANY_RANGES",
            PlannerErrorCode::AeroQueryRangeFailed => "AERO_QUERY_RANGE_FAILED",
        }
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone)]
pub struct PlannerError {
    code: PlannerErrorCode,
    message: String,
    /// Field name if applicable
    field: Option<String>,
    /// Underlying range error for `AeroQueryRangeFailed`
    source: Option<RangeError>,
}

impl PlannerError {
    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::AeroQueryInvalid,
            message: reason.into(),
            field: None,
            source: None,
        }
    }

    /// Create a query invalid error naming a field
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::AeroQueryInvalid,
            message: format!("Field '{}': {}", f, reason.into()),
            field: Some(f),
            source: None,
        }
    }

    /// Create an unindexed field error
    pub fn unindexed_field(field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::AeroQueryUnindexedField,
            message: format!("Field '{}' is not indexed", f),
            field: Some(f),
            source: None,
        }
    }

    /// Create a too many ranges error
    pub fn too_many_ranges(count: usize, max: u64) -> Self {
        Self {
            code: PlannerErrorCode::AeroQueryTooManyRanges,
            message: format!("Filter expands into {} ranges, limit is {}", count, max),
            field: None,
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match &self.source {
            Some(err) if err.severity() == range::Severity::Fatal => Severity::Fatal,
            _ => Severity::Reject,
        }
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the range error this wraps, if any
    pub fn range_error(&self) -> Option<&RangeError> {
        self.source.as_ref()
    }
}

impl From<RangeError> for PlannerError {
    fn from(err: RangeError) -> Self {
        Self {
            code: PlannerErrorCode::AeroQueryRangeFailed,
            message: format!("{}: {}", err.code(), err.message()),
            field: None,
            source: Some(err),
        }
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
