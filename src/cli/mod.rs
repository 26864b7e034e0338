//! CLI for the range engine
//!
//! Provides:
//! - merge: collapse ranges into a disjoint sorted set
//! - connections: query the ranges connected to a probe
//! - explain: dump the range tree
//! - plan: turn a filter into index ranges

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{connections, execute, explain, merge, plan, run, run_command};
pub use config::RangeConfig;
pub use errors::{CliError, CliResult};
pub use io::{read_request, read_request_from, write_error, write_error_to, write_response, write_response_to};
