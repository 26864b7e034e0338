//! CLI argument definitions using clap
//!
//! Commands:
//! - aerorange merge [--config <path>]
//! - aerorange connections [--config <path>]
//! - aerorange explain [--config <path>]
//! - aerorange plan [--config <path>]
//!
//! Every command reads one JSON request from stdin and writes one JSON
//! response to stdout.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// aerorange - index range merging and planning
#[derive(Parser, Debug)]
#[command(name = "aerorange")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Merge ranges into a disjoint sorted set
    Merge {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Find the stored ranges connected to a probe range
    Connections {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Dump the range tree built from a set of ranges
    Explain {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Plan a filter into index ranges
    Plan {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Command {
    /// Subcommand name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Merge { .. } => "merge",
            Command::Connections { .. } => "connections",
            Command::Explain { .. } => "explain",
            Command::Plan { .. } => "plan",
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Merge { config }
            | Command::Connections { config }
            | Command::Explain { config }
            | Command::Plan { config } => config.as_deref(),
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
