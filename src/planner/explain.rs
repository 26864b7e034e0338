//! Explain output for range plans
//!
//! Deterministic, human-readable text plus a JSON form.

use std::fmt;

use serde::Serialize;

use super::errors::PlannerError;
use super::planner::RangePlan;

/// Explain plan output
#[derive(Debug, Clone, Serialize)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    /// Index columns as `name type`
    pub index: Vec<String>,
    /// Conjunctions, each rendered as `p1 AND p2`
    pub conjunctions: Vec<String>,
    /// Merge policy name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    /// Boxes before merging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded: Option<usize>,
    /// Merged ranges
    pub ranges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a successful plan
    pub fn from_plan(plan: &RangePlan) -> Self {
        let conjunctions = plan
            .filter
            .disjuncts
            .iter()
            .map(|conj| {
                if conj.is_empty() {
                    "TRUE".to_string()
                } else {
                    conj.iter()
                        .map(|p| p.describe())
                        .collect::<Vec<_>>()
                        .join(" AND ")
                }
            })
            .collect();

        Self {
            accepted: true,
            index: plan
                .columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.typ))
                .collect(),
            conjunctions,
            policy: Some(plan.policy.as_str().to_string()),
            expanded: Some(plan.expanded),
            ranges: plan.ranges.iter().map(|r| r.to_string()).collect(),
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(err: &PlannerError) -> Self {
        Self {
            accepted: false,
            index: Vec::new(),
            conjunctions: Vec::new(),
            policy: None,
            expanded: None,
            ranges: Vec::new(),
            rejection_reason: Some(err.message().to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            writeln!(f, "Index: ({})", self.index.join(", "))?;
            if !self.conjunctions.is_empty() {
                writeln!(f, "Filter:")?;
                for conj in &self.conjunctions {
                    writeln!(f, "  OR {}", conj)?;
                }
            }
            if let Some(policy) = &self.policy {
                writeln!(f, "Merge Policy: {}", policy)?;
            }
            if let Some(expanded) = self.expanded {
                writeln!(f, "Expanded: {} ranges", expanded)?;
            }
            writeln!(f, "Ranges:")?;
            for range in &self.ranges {
                writeln!(f, "  - {}", range)?;
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::ast::{Filter, Predicate};
    use crate::planner::planner::{IndexColumn, IndexRangePlanner, IndexSchema};
    use crate::range::SqlType;
    use serde_json::json;

    fn planner() -> IndexRangePlanner {
        IndexRangePlanner::new(
            IndexSchema::new(vec![
                IndexColumn::new("a", SqlType::Int64),
                IndexColumn::new("b", SqlType::Int64),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_explain_accepted_plan() {
        let plan = planner()
            .plan(&Filter::and(vec![
                Predicate::eq("a", json!(1)),
                Predicate::gte("b", json!(10)),
            ]))
            .unwrap();
        let explain = ExplainPlan::from_plan(&plan);

        assert!(explain.accepted);
        assert_eq!(explain.index, vec!["a int64", "b int64"]);
        assert_eq!(explain.conjunctions, vec!["a eq 1 AND b gte 10"]);
        assert_eq!(explain.ranges, vec!["{[1, 1], [10, ∞)}"]);

        let output = format!("{}", explain);
        assert!(output.contains("ACCEPTED"));
        assert!(output.contains("Index: (a int64, b int64)"));
        assert!(output.contains("  - {[1, 1], [10, ∞)}"));
    }

    #[test]
    fn test_explain_rejected_plan() {
        let err = PlannerError::unindexed_field("name");
        let explain = ExplainPlan::from_error(&err);

        assert!(!explain.accepted);
        assert_eq!(
            explain.rejection_code,
            Some("AERO_QUERY_UNINDEXED_FIELD".into())
        );

        let output = format!("{}", explain);
        assert!(output.contains("REJECTED"));
        assert!(output.contains("AERO_QUERY_UNINDEXED_FIELD"));

        let json = explain.to_json();
        assert_eq!(json["accepted"], false);
        assert!(json.get("policy").is_none());
    }

    #[test]
    fn test_explain_json() {
        let plan = planner()
            .plan(&Filter::and(vec![]).or(vec![Predicate::is_null("a")]))
            .unwrap();
        let json = ExplainPlan::from_plan(&plan).to_json();
        assert_eq!(json["conjunctions"][0], "TRUE");
        assert_eq!(json["policy"], "connected");
        assert_eq!(json["expanded"], 2);
        assert_eq!(json["ranges"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_explain_deterministic() {
        let filter = Filter::and(vec![Predicate::in_list("a", vec![json!(3), json!(1)])]);
        let first = format!("{}", ExplainPlan::from_plan(&planner().plan(&filter).unwrap()));
        let second = format!("{}", ExplainPlan::from_plan(&planner().plan(&filter).unwrap()));
        assert_eq!(first, second);
    }
}
