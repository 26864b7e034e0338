//! CLI command implementations
//!
//! Each command is a pure function from a configuration and a parsed JSON
//! request to a JSON response body. `run` wires them to stdin and stdout.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::observability::{log_event_with_fields, CommandScope, Event, Logger, MetricsRegistry};
use crate::planner::{ExplainPlan, Filter, IndexColumn, IndexRangePlanner, IndexSchema};
use crate::range::{validate_range_collection, Range, RangeColumnExprTree, RangeMerger, TreeExplain};

use super::args::{Cli, Command};
use super::config::RangeConfig;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RangesRequest {
    ranges: Vec<Range>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConnectionsRequest {
    ranges: Vec<Range>,
    probe: Range,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanRequest {
    index: Vec<IndexColumn>,
    filter: Filter,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Loads configuration, runs one command against stdin, writes the
/// response to stdout.
///
/// Failures are written as an error response and also returned, so the
/// process exits non-zero.
pub fn run_command(cmd: Command) -> CliResult<()> {
    let result = load_config(&cmd).and_then(|config| {
        let scope = CommandScope::new(cmd.name());
        match read_request().and_then(|request| execute(&cmd, &config, &request)) {
            Ok(data) => {
                scope.complete(&[]);
                Ok(data)
            }
            Err(err) => {
                scope.fail(&err.to_string());
                Err(err)
            }
        }
    });

    match result {
        Ok(data) => write_response(data),
        Err(err) => {
            write_error(&err)?;
            Err(err)
        }
    }
}

fn load_config(cmd: &Command) -> CliResult<RangeConfig> {
    let config = RangeConfig::load_or_default(cmd.config_path())?;
    Logger::set_min_severity(config.severity());

    let source = cmd
        .config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("policy", config.merge_policy().as_str()), ("source", source.as_str())],
    );
    Ok(config)
}

/// Runs a command on an already parsed request
pub fn execute(cmd: &Command, config: &RangeConfig, request: &Value) -> CliResult<Value> {
    match cmd {
        Command::Merge { .. } => merge(config, request),
        Command::Connections { .. } => connections(config, request),
        Command::Explain { .. } => explain(config, request),
        Command::Plan { .. } => plan(config, request),
    }
}

/// `{"ranges": [...]}` to the merged disjoint ranges
pub fn merge(config: &RangeConfig, request: &Value) -> CliResult<Value> {
    let request: RangesRequest = serde_json::from_value(request.clone())?;
    check_range_count(config, request.ranges.len())?;

    let metrics = MetricsRegistry::new();
    let merged = RangeMerger::new(config.merge_policy())
        .with_metrics(&metrics)
        .merge(&request.ranges)?;
    if config.validate_output {
        validate_range_collection(&merged)?;
    }

    Ok(json!({
        "count": merged.len(),
        "ranges": merged,
        "display": merged.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
        "metrics": metrics.snapshot(),
    }))
}

/// `{"ranges": [...], "probe": [...]}` to the stored ranges connected to
/// the probe
pub fn connections(config: &RangeConfig, request: &Value) -> CliResult<Value> {
    let request: ConnectionsRequest = serde_json::from_value(request.clone())?;
    check_range_count(config, request.ranges.len())?;

    let tree = build_tree(&request.ranges)?;
    let found = tree.find_connections(&request.probe)?;

    let probe = request.probe.to_string();
    let count = found.len().to_string();
    log_event_with_fields(
        Event::ConnectionsFound,
        &[("found", count.as_str()), ("probe", probe.as_str())],
    );

    Ok(json!({
        "count": found.len(),
        "connections": found,
        "display": found.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
    }))
}

/// `{"ranges": [...]}` to the tree dump and its structured form
pub fn explain(config: &RangeConfig, request: &Value) -> CliResult<Value> {
    let request: RangesRequest = serde_json::from_value(request.clone())?;
    check_range_count(config, request.ranges.len())?;

    let tree = build_tree(&request.ranges)?;
    let collection = tree.get_range_collection_with(config.merge_policy())?;

    let input = request.ranges.len().to_string();
    let output = collection.len().to_string();
    log_event_with_fields(
        Event::CollectionFlattened,
        &[("input", input.as_str()), ("output", output.as_str())],
    );

    Ok(json!({
        "text": tree.to_string(),
        "tree": TreeExplain::from_tree(&tree),
        "collection": collection.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
    }))
}

/// `{"index": [...], "filter": [[...]]}` to a range plan
pub fn plan(config: &RangeConfig, request: &Value) -> CliResult<Value> {
    let request: PlanRequest = serde_json::from_value(request.clone())?;
    let schema = IndexSchema::new(request.index)?;

    let planner = IndexRangePlanner::new(schema)
        .with_policy(config.merge_policy())
        .with_max_ranges(config.max_ranges)
        .with_validation(config.validate_output);
    let plan = planner.plan(&request.filter)?;
    let explain = ExplainPlan::from_plan(&plan);

    Ok(json!({
        "plan": plan,
        "explain": explain.to_json(),
        "text": explain.to_string(),
        "metrics": planner.metrics().snapshot(),
    }))
}

fn check_range_count(config: &RangeConfig, count: usize) -> CliResult<()> {
    if count as u64 > config.max_ranges {
        return Err(CliError::Request(format!(
            "{} ranges exceed max_ranges {}",
            count, config.max_ranges
        )));
    }
    Ok(())
}

/// Builds a tree holding every range, in input order
fn build_tree(ranges: &[Range]) -> CliResult<RangeColumnExprTree> {
    let (first, rest) = ranges
        .split_first()
        .ok_or_else(|| CliError::Request("at least one range is required".into()))?;

    let mut tree = RangeColumnExprTree::new(first)?;
    for range in rest {
        tree.insert(range)?;
        if Logger::enabled(crate::observability::Severity::Trace) {
            let text = range.to_string();
            Logger::trace(Event::RangeInserted.as_str(), &[("range", text.as_str())]);
        }
    }

    let size = tree.len().to_string();
    let columns = tree.column_types().len().to_string();
    log_event_with_fields(
        Event::TreeBuilt,
        &[("columns", columns.as_str()), ("size", size.as_str())],
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed(lo: i64, hi: i64) -> Value {
        json!({
            "lower_bound": {"cut": "below", "key": lo},
            "upper_bound": {"cut": "above", "key": hi},
            "type": "int64"
        })
    }

    #[test]
    fn test_merge_command() {
        let request = json!({"ranges": [[closed(1, 5)], [closed(3, 8)], [closed(20, 30)]]});
        let data = merge(&RangeConfig::default(), &request).unwrap();
        assert_eq!(data["count"], 2);
        assert_eq!(data["display"], json!(["{[1, 8]}", "{[20, 30]}"]));
        assert_eq!(data["ranges"][0][0]["lower_bound"], json!({"cut": "below", "key": 1}));
        assert_eq!(data["metrics"]["collections_flattened"], 1);
    }

    #[test]
    fn test_merge_command_adjacent_policy() {
        let config = RangeConfig {
            merge_adjacent_values: true,
            ..RangeConfig::default()
        };
        let request = json!({"ranges": [[closed(1, 5)], [closed(6, 10)]]});
        let data = merge(&config, &request).unwrap();
        assert_eq!(data["display"], json!(["{[1, 10]}"]));
    }

    #[test]
    fn test_merge_command_respects_max_ranges() {
        let config = RangeConfig {
            max_ranges: 1,
            ..RangeConfig::default()
        };
        let request = json!({"ranges": [[closed(1, 5)], [closed(6, 10)]]});
        let err = merge(&config, &request).unwrap_err();
        assert_eq!(err.code(), "AERO_CLI_INVALID_REQUEST");
    }

    #[test]
    fn test_merge_command_reports_dimension_mismatch() {
        let request = json!({"ranges": [[closed(1, 5)], [closed(1, 5), closed(1, 5)]]});
        let err = merge(&RangeConfig::default(), &request).unwrap_err();
        assert_eq!(err.code(), "AERO_RANGE_DIMENSION_MISMATCH");
    }

    #[test]
    fn test_connections_command() {
        let request = json!({
            "ranges": [[closed(1, 5)], [closed(10, 15)]],
            "probe": [closed(4, 12)]
        });
        let data = connections(&RangeConfig::default(), &request).unwrap();
        assert_eq!(data["count"], 2);

        let request = json!({
            "ranges": [[closed(1, 5)], [closed(10, 15)]],
            "probe": [closed(6, 9)]
        });
        let data = connections(&RangeConfig::default(), &request).unwrap();
        assert_eq!(data["count"], 0);
    }

    #[test]
    fn test_connections_requires_ranges() {
        let request = json!({"ranges": [], "probe": [closed(6, 9)]});
        let err = connections(&RangeConfig::default(), &request).unwrap_err();
        assert_eq!(err.code(), "AERO_CLI_INVALID_REQUEST");
    }

    #[test]
    fn test_explain_command() {
        let request = json!({"ranges": [[closed(1, 3)], [closed(5, 6)]]});
        let data = explain(&RangeConfig::default(), &request).unwrap();
        let text = data["text"].as_str().unwrap();
        assert!(text.starts_with("RangeColumnExprTree (int64)"));
        assert_eq!(data["tree"]["size"], 2);
        assert_eq!(data["collection"], json!(["{[1, 3]}", "{[5, 6]}"]));
    }

    #[test]
    fn test_plan_command() {
        let request = json!({
            "index": [{"name": "a", "type": "int64"}, {"name": "b", "type": "text"}],
            "filter": [
                [{"field": "a", "op": "eq", "value": 1}, {"field": "b", "op": "gte", "value": "m"}],
                [{"field": "a", "op": "eq", "value": 1}, {"field": "b", "op": "lt", "value": "n"}]
            ]
        });
        let data = plan(&RangeConfig::default(), &request).unwrap();
        assert_eq!(data["explain"]["ranges"], json!(["{[1, 1], (NULL, ∞)}"]));
        assert_eq!(data["plan"]["expanded"], 2);
        assert_eq!(data["plan"]["policy"], "connected");
        assert!(data["text"].as_str().unwrap().contains("ACCEPTED"));
    }

    #[test]
    fn test_plan_command_unindexed_field() {
        let request = json!({
            "index": [{"name": "a", "type": "int64"}],
            "filter": [[{"field": "z", "op": "is_null"}]]
        });
        let err = plan(&RangeConfig::default(), &request).unwrap_err();
        assert_eq!(err.code(), "AERO_QUERY_UNINDEXED_FIELD");
    }

    #[test]
    fn test_unknown_request_field_rejected() {
        let request = json!({"ranges": [], "extra": 1});
        let err = merge(&RangeConfig::default(), &request).unwrap_err();
        assert_eq!(err.code(), "AERO_CLI_INVALID_JSON");
    }

    #[test]
    fn test_execute_dispatches() {
        let request = json!({"ranges": [[closed(1, 2)]]});
        let data = execute(
            &Command::Merge { config: None },
            &RangeConfig::default(),
            &request,
        )
        .unwrap();
        assert_eq!(data["count"], 1);
    }
}
