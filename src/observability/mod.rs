//! Observability for range building and merging
//!
//! - Structured logging (JSON lines on stderr)
//! - Counter metrics
//! - Typed lifecycle events
//!
//! Observability is read-only: nothing here changes the outcome of a
//! range operation.
//!
//! ```ignore
//! use aerorange::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! let metrics = MetricsRegistry::new();
//! metrics.add_ranges_inserted(1);
//! log_event_with_fields(Event::RangeInserted, &[("range", "{[1, 5]}")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::CommandScope;

fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_for_fatal_event() {
        assert_eq!(severity_for(Event::OverlapDetected), Severity::Fatal);
        assert_eq!(severity_for(Event::RangeInserted), Severity::Info);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::MergeComplete, &[("ranges", "3")]);
    }
}
