//! Observable events of the range subsystem
//!
//! Events are explicit and typed. They are emitted at operation
//! granularity; the tree itself never logs per node.

use std::fmt;

/// Observable events in aerorange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Command lifecycle
    /// CLI command begins
    CommandBegin,
    /// CLI command complete
    CommandComplete,
    /// CLI command failed
    CommandFailed,

    // Tree operations
    /// Tree seeded from an initial range
    TreeBuilt,
    /// Range inserted into a tree
    RangeInserted,
    /// Range removed from a tree
    RangeRemoved,
    /// Connection search finished
    ConnectionsFound,
    /// Tree flattened into a range collection
    CollectionFlattened,

    // Merge operations
    /// Overlap removal begins
    MergeBegin,
    /// A stored range was split around an overlapping one
    OverlapSplit,
    /// Overlap removal complete
    MergeComplete,
    /// Merged output still overlaps (FATAL)
    OverlapDetected,

    // Planning
    /// Filter planned into index ranges
    PlanComplete,
    /// Filter rejected by the planner
    PlanRejected,

    // Failures
    /// Key comparison failed
    CompareFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::CommandBegin => "COMMAND_BEGIN",
            Event::CommandComplete => "COMMAND_COMPLETE",
            Event::CommandFailed => "COMMAND_FAILED",

            Event::TreeBuilt => "RANGE_TREE_BUILT",
            Event::RangeInserted => "RANGE_INSERTED",
            Event::RangeRemoved => "RANGE_REMOVED",
            Event::ConnectionsFound => "RANGE_CONNECTIONS_FOUND",
            Event::CollectionFlattened => "RANGE_COLLECTION_FLATTENED",

            Event::MergeBegin => "RANGE_MERGE_BEGIN",
            Event::OverlapSplit => "RANGE_OVERLAP_SPLIT",
            Event::MergeComplete => "RANGE_MERGE_COMPLETE",
            Event::OverlapDetected => "RANGE_OVERLAP_DETECTED",

            Event::PlanComplete => "PLAN_COMPLETE",
            Event::PlanRejected => "PLAN_REJECTED",

            Event::CompareFailed => "RANGE_COMPARE_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::OverlapDetected)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
