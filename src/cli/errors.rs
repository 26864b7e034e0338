//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::planner::{ExplainPlan, PlannerError};
use crate::range::RangeError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced by the `aerorange` binary
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file unreadable or invalid
    #[error("Invalid config: {0}")]
    Config(String),

    /// Request well-formed JSON but not a valid request
    #[error("Invalid request: {0}")]
    Request(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Range(#[from] RangeError),

    #[error("{0}")]
    Planner(#[from] PlannerError),
}

impl CliError {
    /// Error code string written in error responses
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "AERO_CLI_CONFIG_ERROR",
            CliError::Request(_) => "AERO_CLI_INVALID_REQUEST",
            CliError::Io(_) => "AERO_CLI_IO_ERROR",
            CliError::Json(_) => "AERO_CLI_INVALID_JSON",
            CliError::Range(e) => e.code().code(),
            CliError::Planner(e) => e.code().code(),
        }
    }

    /// Message without the code prefix
    pub fn message(&self) -> String {
        match self {
            CliError::Range(e) => e.message().to_string(),
            CliError::Planner(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }

    /// Rejected-plan explain attached to planner failures
    pub fn rejection_explain(&self) -> Option<ExplainPlan> {
        match self {
            CliError::Planner(e) => Some(ExplainPlan::from_error(e)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(CliError::Config("x".into()).code(), "AERO_CLI_CONFIG_ERROR");
        let err: CliError = RangeError::empty_range().into();
        assert_eq!(err.code(), "AERO_RANGE_EMPTY_RANGE");
        let err: CliError = PlannerError::unindexed_field("z").into();
        assert_eq!(err.code(), "AERO_QUERY_UNINDEXED_FIELD");
        assert_eq!(err.message(), "Field 'z' is not indexed");
    }

    #[test]
    fn test_planner_error_carries_rejected_explain() {
        let err: CliError = PlannerError::unindexed_field("z").into();
        let explain = err.rejection_explain().unwrap();
        assert!(!explain.accepted);
        assert_eq!(
            explain.rejection_code.as_deref(),
            Some("AERO_QUERY_UNINDEXED_FIELD")
        );

        let err: CliError = RangeError::empty_range().into();
        assert!(err.rejection_explain().is_none());
    }

    #[test]
    fn test_json_error_converts() {
        let err: CliError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.code(), "AERO_CLI_INVALID_JSON");
        assert!(err.to_string().starts_with("JSON error"));
    }
}
