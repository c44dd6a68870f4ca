//! URL handling module for Doc-Harvest
//!
//! This module provides candidate normalization, run-wide deduplication
//! and address-to-filename sanitization.

mod filename;
mod normalize;

use std::collections::HashSet;
use url::Url;

// Re-export main functions
pub use filename::sanitize_filename;
pub use normalize::normalize_candidate;

/// Run-scoped set of addresses already handed to the fetcher
///
/// Keys are serialized normalized addresses, so two references that
/// normalize to the same string are the same asset. The set only grows and
/// lives for one run; nothing is persisted.
#[derive(Debug, Default)]
pub struct SeenSet {
    seen: HashSet<String>,
}

impl SeenSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an address, returning true if it had not been seen before
    ///
    /// # Examples
    ///
    /// ```
    /// use doc_harvest::url::SeenSet;
    /// use url::Url;
    ///
    /// let mut seen = SeenSet::new();
    /// let url = Url::parse("https://example.com/a.pdf").unwrap();
    /// assert!(seen.insert(&url));
    /// assert!(!seen.insert(&url));
    /// ```
    pub fn insert(&mut self, address: &Url) -> bool {
        self.seen.insert(address.as_str().to_string())
    }

    /// Returns true if the address has already been recorded
    pub fn contains(&self, address: &Url) -> bool {
        self.seen.contains(address.as_str())
    }

    /// Number of distinct addresses recorded so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
