//! Output module for Doc-Harvest
//!
//! Downloads themselves land in the configured directories; this module
//! only summarizes what a run did.

mod stats;

pub use stats::{log_statistics, RunStatistics};
