//! Range engine configuration
//!
//! Loaded from an optional JSON file. Every field has a default, so an
//! empty object `{}` is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::Severity;
use crate::planner::DEFAULT_MAX_RANGES;
use crate::range::MergePolicy;

use super::errors::{CliError, CliResult};

/// Configuration file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeConfig {
    /// Minimum log severity written to stderr (default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Fuse closed ranges whose keys are adjacent, e.g. [1, 5] and [6, 9]
    #[serde(default)]
    pub merge_adjacent_values: bool,

    /// Ranges a single request may carry or a filter may expand into
    #[serde(default = "default_max_ranges")]
    pub max_ranges: u64,

    /// Re-check merged output for overlap
    #[serde(default = "default_validate_output")]
    pub validate_output: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}
fn default_max_ranges() -> u64 {
    DEFAULT_MAX_RANGES
}
fn default_validate_output() -> bool {
    true
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            merge_adjacent_values: false,
            max_ranges: default_max_ranges(),
            validate_output: default_validate_output(),
        }
    }
}

impl RangeConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read config: {}", e)))?;

        let config: RangeConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> CliResult<()> {
        if Severity::parse(&self.log_level).is_none() {
            return Err(CliError::Config(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn, error or fatal.",
                self.log_level
            )));
        }

        if self.max_ranges == 0 {
            return Err(CliError::Config("max_ranges must be > 0".into()));
        }

        Ok(())
    }

    pub fn merge_policy(&self) -> MergePolicy {
        if self.merge_adjacent_values {
            MergePolicy::AdjacentValues
        } else {
            MergePolicy::Connected
        }
    }

    /// Parsed log level; WARN if the level was never validated
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Warn)
    }
}
