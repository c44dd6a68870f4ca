//! Crawler module for the harvest pipeline
//!
//! This module contains the core harvesting logic, including:
//! - Page rendering behind the `Renderer` trait
//! - Link extraction from rendered markup
//! - Guarded asset downloads
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod parser;
mod renderer;

pub use coordinator::{run_harvest, Coordinator};
pub use fetcher::{browser_headers, build_http_client, decode_body, AssetFetcher};
pub use parser::{CandidateLink, LinkExtractor};
pub use renderer::{build_renderer, CachedRenderer, ChromeRenderer, HttpRenderer, Renderer};

use crate::config::Config;
use crate::output::RunStatistics;
use crate::HarvestError;

/// Runs a complete harvest
///
/// This is the main entry point for starting a run. It will:
/// 1. Build the renderer described by the configuration
/// 2. Create the output directories
/// 3. Render, extract and download page by page
/// 4. Log a summary
///
/// # Arguments
///
/// * `config` - The harvest configuration
///
/// # Returns
///
/// * `Ok(RunStatistics)` - The catalog was exhausted
/// * `Err(HarvestError)` - The run could not start
pub async fn harvest(config: &Config) -> Result<RunStatistics, HarvestError> {
    run_harvest(config).await
}
