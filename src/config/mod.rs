//! Configuration module for Doc-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section except `[catalog]` falls back to defaults when omitted.
//!
//! # Example
//!
//! ```no_run
//! use doc_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Catalog pages: {}", config.catalog.pages.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, CrawlerConfig, ExtractConfig, FetchConfig, OutputConfig,
    RendererConfig, RendererKind,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
