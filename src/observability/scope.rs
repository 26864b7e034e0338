//! Scoped begin/complete logging for commands

use std::cell::Cell;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use super::events::Event;
use super::logger::Logger;

/// Logs `COMMAND_BEGIN` on creation and `COMMAND_COMPLETE` or
/// `COMMAND_FAILED` when finished.
///
/// ```ignore
/// let scope = CommandScope::new("merge");
/// // ... do work ...
/// scope.complete(&[("ranges", "3")]);
/// ```
///
/// Every line carries the same `command_id` so one invocation can be
/// followed through the log. A scope dropped without either call logs
/// `COMMAND_FAILED` with reason `incomplete`.
pub struct CommandScope<'a> {
    command: &'a str,
    command_id: String,
    started: Instant,
    finished: Cell<bool>,
}

impl<'a> CommandScope<'a> {
    pub fn new(command: &'a str) -> Self {
        let command_id = Uuid::new_v4().to_string();
        let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Logger::info(
            Event::CommandBegin.as_str(),
            &[
                ("command", command),
                ("command_id", command_id.as_str()),
                ("started_at", started_at.as_str()),
            ],
        );
        Self {
            command,
            command_id,
            started: Instant::now(),
            finished: Cell::new(false),
        }
    }

    pub fn command_id(&self) -> &str {
        &self.command_id
    }

    /// Milliseconds since the scope opened
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Logs completion with extra fields
    pub fn complete(self, extra: &[(&str, &str)]) {
        self.finished.set(true);
        let elapsed = self.elapsed_ms().to_string();
        let mut fields = vec![
            ("command", self.command),
            ("command_id", self.command_id.as_str()),
            ("elapsed_ms", elapsed.as_str()),
        ];
        fields.extend(extra.iter().copied());
        Logger::info(Event::CommandComplete.as_str(), &fields);
    }

    /// Logs failure at ERROR level
    pub fn fail(self, reason: &str) {
        self.finished.set(true);
        Logger::error(
            Event::CommandFailed.as_str(),
            &[
                ("command", self.command),
                ("command_id", self.command_id.as_str()),
                ("reason", reason),
            ],
        );
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }
}

impl Drop for CommandScope<'_> {
    fn drop(&mut self) {
        if !self.finished.get() {
            Logger::warn(
                Event::CommandFailed.as_str(),
                &[
                    ("command", self.command),
                    ("command_id", self.command_id.as_str()),
                    ("reason", "incomplete"),
                ],
            );
        }
    }
}
