//! Crawler coordinator - main harvest orchestration logic
//!
//! This module walks the catalog one page at a time:
//! - Creating the output directories before any download
//! - Rendering each page through the injected renderer
//! - Extracting, normalizing and deduplicating candidate links
//! - Fetching each newly seen address into the directory for its kind
//! - Pausing between pages

use crate::config::Config;
use crate::crawler::fetcher::AssetFetcher;
use crate::crawler::parser::{CandidateLink, LinkExtractor};
use crate::crawler::renderer::{build_renderer, Renderer};
use crate::output::{log_statistics, RunStatistics};
use crate::state::{AssetKind, FailureKind};
use crate::url::{normalize_candidate, SeenSet};
use crate::{HarvestError, RenderError, UrlError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use url::Url;

/// Main harvest coordinator structure
///
/// Owns the run-wide seen-set; everything runs on the caller's task, one
/// page and one download at a time.
pub struct Coordinator {
    base_origin: Url,
    catalog: Vec<Url>,
    renderer: Box<dyn Renderer>,
    extractor: LinkExtractor,
    fetcher: AssetFetcher,
    seen: SeenSet,
    stats: RunStatistics,
    documents_dir: PathBuf,
    archives_dir: PathBuf,
    render_timeout: Duration,
    inter_page_delay: Duration,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated harvest configuration
    /// * `renderer` - Turns catalog pages into markup
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - A catalog address is unusable or the HTTP client
    ///   could not be built
    pub fn new(config: &Config, renderer: Box<dyn Renderer>) -> Result<Self, HarvestError> {
        let base_origin = parse_absolute(&config.crawler.base_origin)?;
        let catalog = config
            .catalog
            .pages
            .iter()
            .map(|page| parse_absolute(page))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            base_origin,
            catalog,
            renderer,
            extractor: LinkExtractor::new(&config.extract),
            fetcher: AssetFetcher::new(&config.fetch)?,
            seen: SeenSet::new(),
            stats: RunStatistics::new(),
            documents_dir: PathBuf::from(&config.output.documents_dir),
            archives_dir: PathBuf::from(&config.output.archives_dir),
            render_timeout: Duration::from_secs(config.crawler.render_timeout),
            inter_page_delay: Duration::from_millis(config.crawler.inter_page_delay),
        })
    }

    /// Creates both output directories if they are missing
    ///
    /// This is the only fatal step of a run: without the directories no
    /// download can be placed.
    pub async fn prepare_output_dirs(&self) -> Result<(), HarvestError> {
        for dir in [&self.documents_dir, &self.archives_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| HarvestError::DirectoryBootstrap {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Runs the catalog from start to finish
    ///
    /// Returns the run statistics once every page has been processed. Only
    /// directory bootstrap failures end the run early.
    pub async fn run(&mut self) -> Result<RunStatistics, HarvestError> {
        self.prepare_output_dirs().await?;

        let start_time = Instant::now();
        let total = self.catalog.len();
        tracing::info!("Starting harvest of {} catalog pages", total);

        let catalog = self.catalog.clone();
        for (index, page) in catalog.iter().enumerate() {
            tracing::info!("Processing page {}/{}: {}", index + 1, total, page);
            self.process_page(page).await;

            if index + 1 < total && !self.inter_page_delay.is_zero() {
                tracing::debug!("Pausing {:?} before next page", self.inter_page_delay);
                tokio::time::sleep(self.inter_page_delay).await;
            }
        }

        tracing::info!("Harvest completed in {:?}", start_time.elapsed());
        log_statistics(&self.stats);

        Ok(self.stats.clone())
    }

    /// Processes a single catalog page
    ///
    /// Never fails: render, address and download problems are logged and
    /// counted, then the page is done.
    pub async fn process_page(&mut self, page: &Url) {
        self.stats.pages_total += 1;

        let markup = match self.render(page).await {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!("Failed to render {}: {}", page, e);
                self.stats.record_failure(FailureKind::RenderFailure);
                return;
            }
        };
        self.stats.pages_rendered += 1;

        if !self.extractor.has_structural_scan() {
            self.stats.record_failure(FailureKind::ParseFailure);
        }

        let candidates = self.extractor.extract(&markup);
        tracing::debug!("Found {} candidate links on {}", candidates.len(), page);
        self.stats.candidates += candidates.len() as u64;

        let queued = self.queue_new_addresses(candidates);
        tracing::info!("{} new assets queued from {}", queued.len(), page);

        for (address, kind) in queued {
            let output_dir = self.output_dir(kind).to_path_buf();
            let outcome = self.fetcher.fetch(&address, kind, &output_dir).await;
            self.stats.record_outcome(&outcome);
        }
    }

    /// Renders a page, guarding the renderer with the render timeout
    async fn render(&self, page: &Url) -> Result<String, RenderError> {
        match tokio::time::timeout(
            self.render_timeout,
            self.renderer.render(page, self.render_timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(self.render_timeout)),
        }
    }

    /// Normalizes candidates and keeps the ones not yet seen this run
    fn queue_new_addresses(&mut self, candidates: Vec<CandidateLink>) -> Vec<(Url, AssetKind)> {
        let mut queued = Vec::new();

        for candidate in candidates {
            let address = match normalize_candidate(&candidate.reference, &self.base_origin) {
                Ok(address) => address,
                Err(e) => {
                    tracing::warn!("Dropping invalid reference '{}': {}", candidate.reference, e);
                    self.stats.record_failure(FailureKind::AddressInvalid);
                    continue;
                }
            };

            if self.seen.insert(&address) {
                self.stats.unique_addresses += 1;
                queued.push((address, candidate.kind));
            } else {
                tracing::debug!("Skipping duplicate {}", address);
                self.stats.duplicates += 1;
            }
        }

        queued
    }

    /// Directory receiving assets of a kind
    pub fn output_dir(&self, kind: AssetKind) -> &Path {
        match kind {
            AssetKind::Document => &self.documents_dir,
            AssetKind::Archive => &self.archives_dir,
        }
    }

    /// Addresses handed to the fetcher so far
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Statistics accumulated so far
    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }
}

fn parse_absolute(value: &str) -> Result<Url, UrlError> {
    let url = Url::parse(value).map_err(|e| UrlError::Parse(format!("{}: {}", value, e)))?;
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }
    Ok(url)
}

/// Runs a complete harvest with the renderer described by the configuration
///
/// This is the main entry point used by the binary.
pub async fn run_harvest(config: &Config) -> Result<RunStatistics, HarvestError> {
    let renderer = build_renderer(config)?;
    let mut coordinator = Coordinator::new(config, renderer)?;
    coordinator.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::RenderResult;
    use async_trait::async_trait;

    struct StaticRenderer(&'static str);

    #[async_trait]
    impl Renderer for StaticRenderer {
        async fn render(&self, _address: &Url, _timeout: Duration) -> RenderResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct HangingRenderer;

    #[async_trait]
    impl Renderer for HangingRenderer {
        async fn render(&self, _address: &Url, _timeout: Duration) -> RenderResult<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn create_test_config(dir: &Path) -> Config {
        let mut config = Config {
            catalog: CatalogConfig {
                pages: vec!["https://vendor.example.com/downloads".to_string()],
            },
            ..Config::default()
        };
        config.crawler.base_origin = "https://vendor.example.com".to_string();
        config.crawler.inter_page_delay = 0;
        config.output.documents_dir = dir.join("PDFs").to_string_lossy().into_owned();
        config.output.archives_dir = dir.join("ZIPs").to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_queue_new_addresses_dedupes_and_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let config = create_test_config(dir.path());
        let mut coordinator = Coordinator::new(&config, Box::new(StaticRenderer(""))).unwrap();

        let candidates = LinkExtractor::new(&config.extract).extract(
            r#"<a href="/a.pdf">a</a><a href="https://vendor.example.com/a.pdf">again</a>
               <a href="javascript:download.pdf">js</a>"#,
        );
        let queued = coordinator.queue_new_addresses(candidates);

        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].0.as_str(), "https://vendor.example.com/a.pdf");
        assert_eq!(queued[0].1, AssetKind::Document);
        // Relative and absolute forms of the same asset
        assert_eq!(coordinator.statistics().duplicates, 1);
        assert_eq!(
            coordinator
                .statistics()
                .failures_of(FailureKind::AddressInvalid),
            1
        );
    }

    #[test]
    fn test_reference_with_space_counted_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let config = create_test_config(dir.path());
        let mut coordinator = Coordinator::new(&config, Box::new(StaticRenderer(""))).unwrap();

        let candidates = LinkExtractor::new(&config.extract)
            .extract(r#"<a href="/files/User Guide.pdf">guide</a>"#);
        let queued = coordinator.queue_new_addresses(candidates);

        assert!(queued.is_empty());
        assert_eq!(
            coordinator
                .statistics()
                .failures_of(FailureKind::AddressInvalid),
            1
        );
    }

    #[test]
    fn test_output_dir_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let config = create_test_config(dir.path());
        let coordinator = Coordinator::new(&config, Box::new(StaticRenderer(""))).unwrap();

        assert!(coordinator
            .output_dir(AssetKind::Document)
            .ends_with("PDFs"));
        assert!(coordinator.output_dir(AssetKind::Archive).ends_with("ZIPs"));
    }

    #[tokio::test]
    async fn test_prepare_output_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = create_test_config(dir.path());
        let coordinator = Coordinator::new(&config, Box::new(StaticRenderer(""))).unwrap();

        coordinator.prepare_output_dirs().await.unwrap();

        assert!(dir.path().join("PDFs").is_dir());
        assert!(dir.path().join("ZIPs").is_dir());
    }

    #[tokio::test]
    async fn test_directory_bootstrap_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut config = create_test_config(dir.path());
        config.output.documents_dir = blocker.join("PDFs").to_string_lossy().into_owned();
        let mut coordinator = Coordinator::new(&config, Box::new(StaticRenderer(""))).unwrap();

        let result = coordinator.run().await;
        assert!(matches!(
            result,
            Err(HarvestError::DirectoryBootstrap { .. })
        ));
    }

    #[tokio::test]
    async fn test_render_timeout_skips_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = create_test_config(dir.path());
        config.crawler.render_timeout = 1;
        let mut coordinator = Coordinator::new(&config, Box::new(HangingRenderer)).unwrap();

        let stats = coordinator.run().await.unwrap();

        assert_eq!(stats.pages_total, 1);
        assert_eq!(stats.pages_rendered, 0);
        assert_eq!(stats.failures_of(FailureKind::RenderFailure), 1);
    }

    #[test]
    fn test_invalid_catalog_page() {
        let mut config = create_test_config(Path::new("/tmp"));
        config.catalog.pages = vec!["not a url".to_string()];
        let result = Coordinator::new(&config, Box::new(StaticRenderer("")));
        assert!(matches!(result, Err(HarvestError::UrlError(_))));
    }
}
