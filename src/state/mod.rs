//! State module for tracking pipeline results
//!
//! # Components
//!
//! - `AssetKind`: Whether a link points at a document or an archive
//! - `DownloadOutcome`: How a single download attempt ended
//! - `FailureKind`: Taxonomy of soft failures absorbed during a run

mod outcome;

// Re-export main types
pub use outcome::{AssetKind, DownloadOutcome, FailureKind};
