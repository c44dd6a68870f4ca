//! Run statistics
//!
//! Counters accumulated by the coordinator while it walks the catalog,
//! reported once the run ends.

use crate::state::{DownloadOutcome, FailureKind};
use std::collections::HashMap;

/// Counters for a single run
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    /// Catalog pages visited
    pub pages_total: u64,

    /// Pages that produced markup
    pub pages_rendered: u64,

    /// Candidate links extracted across all pages
    pub candidates: u64,

    /// Addresses handed to the fetcher
    pub unique_addresses: u64,

    /// Candidates dropped because their address was already seen this run
    pub duplicates: u64,

    /// Files written this run
    pub downloaded: u64,

    /// Bytes written this run
    pub bytes_downloaded: u64,

    /// Fetches skipped because the destination already existed
    pub already_present: u64,

    /// Soft failures by kind
    pub failures: HashMap<FailureKind, u64>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a soft failure
    pub fn record_failure(&mut self, kind: FailureKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    /// Records the outcome of one fetch
    pub fn record_outcome(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { bytes, .. } => {
                self.downloaded += 1;
                self.bytes_downloaded += bytes;
            }
            DownloadOutcome::AlreadyPresent { .. } => self.already_present += 1,
            failure => {
                if let Some(kind) = failure.failure_kind() {
                    self.record_failure(kind);
                }
            }
        }
    }

    /// Number of failures of one kind
    pub fn failures_of(&self, kind: FailureKind) -> u64 {
        self.failures.get(&kind).copied().unwrap_or(0)
    }

    /// Number of failed downloads (page and link failures excluded)
    pub fn failed_downloads(&self) -> u64 {
        self.failures
            .iter()
            .filter(|(kind, _)| kind.is_download_failure())
            .map(|(_, count)| count)
            .sum()
    }

    /// Percentage of handed-off addresses that ended up on disk
    ///
    /// Files that were already present count as on disk.
    pub fn success_rate(&self) -> f64 {
        if self.unique_addresses == 0 {
            return 0.0;
        }
        ((self.downloaded + self.already_present) as f64 / self.unique_addresses as f64) * 100.0
    }
}

/// Logs a run summary through `tracing`
pub fn log_statistics(stats: &RunStatistics) {
    tracing::info!(
        "Pages: {} visited, {} rendered",
        stats.pages_total,
        stats.pages_rendered
    );
    tracing::info!(
        "Links: {} candidates, {} unique, {} duplicates",
        stats.candidates,
        stats.unique_addresses,
        stats.duplicates
    );
    tracing::info!(
        "Downloads: {} written ({} bytes), {} already present, {} failed ({:.1}% on disk)",
        stats.downloaded,
        stats.bytes_downloaded,
        stats.already_present,
        stats.failed_downloads(),
        stats.success_rate()
    );

    for kind in FailureKind::ALL {
        let count = stats.failures_of(kind);
        if count > 0 {
            tracing::info!("  {}: {}", kind, count);
        }
    }
}
