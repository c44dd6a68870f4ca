//! Page renderers
//!
//! A renderer turns a catalog page address into markup. The pipeline only
//! depends on the [`Renderer`] trait, so tests can hand it canned markup.
//!
//! - [`ChromeRenderer`]: headless Chromium `--dump-dom`, scripts executed
//! - [`HttpRenderer`]: plain GET, static markup only
//! - [`CachedRenderer`]: keeps each page's markup on disk and reuses it

use crate::config::{Config, FetchConfig, RendererKind};
use crate::crawler::fetcher::client_builder;
use crate::{HarvestError, RenderError, RenderResult};
use async_trait::async_trait;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use url::Url;

/// Longest stderr excerpt carried in a process error
const STDERR_EXCERPT: usize = 512;

/// Turns a page address into rendered markup
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders `address`, giving up after `timeout`
    async fn render(&self, address: &Url, timeout: Duration) -> RenderResult<String>;
}

#[async_trait]
impl<R: Renderer + ?Sized> Renderer for Box<R> {
    async fn render(&self, address: &Url, timeout: Duration) -> RenderResult<String> {
        (**self).render(address, timeout).await
    }
}

/// Renders pages with a headless Chromium binary
///
/// The browser is started once per page and killed if it outlives the
/// timeout.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    binary: String,
}

impl ChromeRenderer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, address: &Url) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .args([
                "--headless",
                "--disable-gpu",
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--window-size=1920,1080",
                "--dump-dom",
                address.as_str(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render(&self, address: &Url, timeout: Duration) -> RenderResult<String> {
        tracing::debug!("Launching {} for {}", self.binary, address);

        let child = self.command(address).spawn().map_err(|e| {
            RenderError::Process(format!("failed to launch '{}': {}", self.binary, e))
        })?;

        // Dropping the wait future drops the child, which kills it
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(RenderError::Timeout(timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(STDERR_EXCERPT).collect();
            return Err(RenderError::Process(format!(
                "'{}' exited with {}: {}",
                self.binary, output.status, excerpt
            )));
        }

        let markup = String::from_utf8_lossy(&output.stdout).into_owned();
        if markup.trim().is_empty() {
            return Err(RenderError::Process(format!(
                "'{}' produced an empty DOM",
                self.binary
            )));
        }

        Ok(markup)
    }
}

/// Fetches pages over plain HTTP without running scripts
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Builds a renderer sending the same browser headers as asset downloads
    pub fn new(config: &FetchConfig) -> Result<Self, HarvestError> {
        let client = client_builder(config)?.gzip(true).brotli(true).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, address: &Url, timeout: Duration) -> RenderResult<String> {
        let response = self
            .client
            .get(address.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_timeout(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| classify_timeout(e, timeout))
    }
}

fn classify_timeout(error: reqwest::Error, timeout: Duration) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout(timeout)
    } else {
        RenderError::Http(error)
    }
}

/// Caches rendered markup on disk, one file per page address
///
/// A cached page is served without invoking the wrapped renderer. Cache
/// write failures are logged and otherwise ignored.
pub struct CachedRenderer<R> {
    inner: R,
    dir: PathBuf,
}

impl<R: Renderer> CachedRenderer<R> {
    pub fn new(inner: R, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }

    /// Location of the cached markup for an address
    pub fn cache_path(&self, address: &Url) -> PathBuf {
        cache_path_in(&self.dir, address)
    }
}

fn cache_path_in(dir: &Path, address: &Url) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(address.as_str().as_bytes());
    dir.join(format!("{}.html", hex::encode(hasher.finalize())))
}

#[async_trait]
impl<R: Renderer> Renderer for CachedRenderer<R> {
    async fn render(&self, address: &Url, timeout: Duration) -> RenderResult<String> {
        let path = self.cache_path(address);

        if path.is_file() {
            match tokio::fs::read_to_string(&path).await {
                Ok(markup) => {
                    tracing::info!("Using cached markup for {} ({})", address, path.display());
                    return Ok(markup);
                }
                Err(e) => {
                    tracing::warn!(
                        "Ignoring unreadable cache file {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        let markup = self.inner.render(address, timeout).await?;

        if let Err(e) = store(&self.dir, &path, &markup).await {
            tracing::warn!("Failed to cache markup for {}: {}", address, e);
        }

        Ok(markup)
    }
}

async fn store(dir: &Path, path: &Path, markup: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, markup).await
}

/// Builds the renderer described by the configuration
pub fn build_renderer(config: &Config) -> Result<Box<dyn Renderer>, HarvestError> {
    let base: Box<dyn Renderer> = match config.renderer.kind {
        RendererKind::Chrome => Box::new(ChromeRenderer::new(&config.renderer.chrome_binary)),
        RendererKind::Http => Box::new(HttpRenderer::new(&config.fetch)?),
    };

    Ok(match &config.renderer.cache_dir {
        Some(dir) => Box::new(CachedRenderer::new(base, dir)),
        None => base,
    })
}
