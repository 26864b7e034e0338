//! aerorange - index range representation and merging
//!
//! Builds the key ranges an index scan must visit: per-column cuts, a
//! nested augmented red-black interval tree for connection queries and
//! overlap-free merging, a small predicate planner on top, and a JSON CLI.

pub mod cli;
pub mod observability;
pub mod planner;
pub mod range;
