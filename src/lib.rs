//! Doc-Harvest: a catalog-driven document downloader
//!
//! This crate renders a fixed list of vendor download pages, extracts the
//! PDF and archive links they contain, deduplicates them across the run and
//! downloads each unique asset exactly once, gated on HTTP status and
//! declared content type.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Doc-Harvest operations
///
/// Only conditions that stop the whole run surface through this type.
/// Per-asset problems are reported as [`state::DownloadOutcome`] values.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create output directory {path}: {source}")]
    DirectoryBootstrap {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid request header {name}: {message}")]
    InvalidHeader { name: String, message: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid link pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Errors produced by a page renderer
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Rendering timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Renderer process failed: {0}")]
    Process(String),

    #[error("HTTP error while rendering: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0} while rendering")]
    Status(u16),

    #[error("IO error while rendering: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Doc-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for rendering operations
pub type RenderResult<T> = std::result::Result<T, RenderError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{AssetFetcher, Coordinator, LinkExtractor, Renderer};
pub use state::{AssetKind, DownloadOutcome, FailureKind};
pub use crate::url::{normalize_candidate, sanitize_filename, SeenSet};
