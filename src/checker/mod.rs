// src/checker/mod.rs
// =============================================================================
// This module contains everything that runs after the crawl.
//
// Submodules:
// - size: Measures every file, finds the extremes, then fetches the smallest
//   text file and fills in the rest of the report
// - probe: Checks whether external servers accept connections
// =============================================================================

pub mod probe;
mod size;

pub use probe::ServerCheckResult;
pub use size::{complete_report, measure_files};
