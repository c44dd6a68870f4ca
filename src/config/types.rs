use serde::Deserialize;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Main configuration structure for Doc-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub catalog: CatalogConfig,
}

/// Orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Origin that relative references are resolved against
    #[serde(rename = "base-origin", default = "default_base_origin")]
    pub base_origin: String,

    /// Fixed pause between catalog pages (milliseconds)
    #[serde(rename = "inter-page-delay", default = "default_inter_page_delay")]
    pub inter_page_delay: u64,

    /// Upper bound on rendering a single page (seconds)
    #[serde(rename = "render-timeout", default = "default_render_timeout")]
    pub render_timeout: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_origin: default_base_origin(),
            inter_page_delay: default_inter_page_delay(),
            render_timeout: default_render_timeout(),
        }
    }
}

/// Which renderer turns a catalog page into markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Headless Chromium, dumps the DOM after scripts have run
    #[default]
    Chrome,
    /// Plain HTTP GET, static markup only
    Http,
}

/// Renderer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    #[serde(default)]
    pub kind: RendererKind,

    /// Chromium executable used by the chrome renderer
    #[serde(rename = "chrome-binary", default = "default_chrome_binary")]
    pub chrome_binary: String,

    /// Directory for cached rendered markup; caching is off when unset
    #[serde(rename = "cache-dir", default)]
    pub cache_dir: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::default(),
            chrome_binary: default_chrome_binary(),
            cache_dir: None,
        }
    }
}

/// Asset download configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Upper bound on a single asset download (seconds)
    #[serde(default = "default_fetch_timeout")]
    pub timeout: u64,

    /// Decode gzip/deflate bodies before writing them
    #[serde(default = "default_true")]
    pub decompress: bool,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept")]
    pub accept: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    #[serde(rename = "do-not-track", default = "default_true")]
    pub do_not_track: bool,

    /// Content types accepted for document downloads (substring match)
    #[serde(
        rename = "document-content-types",
        default = "default_document_content_types"
    )]
    pub document_content_types: Vec<String>,

    /// Content types accepted for archive downloads (substring match)
    #[serde(
        rename = "archive-content-types",
        default = "default_archive_content_types"
    )]
    pub archive_content_types: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            decompress: true,
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            do_not_track: true,
            document_content_types: default_document_content_types(),
            archive_content_types: default_archive_content_types(),
        }
    }
}

/// Link extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// CSS selector for anchor-like elements carrying an `href`
    #[serde(rename = "link-selector", default = "default_link_selector")]
    pub link_selector: String,

    /// Extensions (without the dot) recognized as documents
    #[serde(
        rename = "document-extensions",
        default = "default_document_extensions"
    )]
    pub document_extensions: Vec<String>,

    /// Extensions (without the dot) recognized as archives
    #[serde(rename = "archive-extensions", default = "default_archive_extensions")]
    pub archive_extensions: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            link_selector: default_link_selector(),
            document_extensions: default_document_extensions(),
            archive_extensions: default_archive_extensions(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving document downloads
    #[serde(rename = "documents-dir", default = "default_documents_dir")]
    pub documents_dir: String,

    /// Directory receiving archive downloads
    #[serde(rename = "archives-dir", default = "default_archives_dir")]
    pub archives_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            archives_dir: default_archives_dir(),
        }
    }
}

/// The fixed list of pages visited in one run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    pub pages: Vec<String>,
}

fn default_base_origin() -> String {
    "https://www.dji.com".to_string()
}

fn default_inter_page_delay() -> u64 {
    5_000
}

fn default_render_timeout() -> u64 {
    300
}

fn default_chrome_binary() -> String {
    "chromium".to_string()
}

fn default_fetch_timeout() -> u64 {
    180
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept() -> String {
    "application/pdf,application/zip,application/octet-stream;q=0.9,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_document_content_types() -> Vec<String> {
    vec!["application/pdf".to_string()]
}

fn default_archive_content_types() -> Vec<String> {
    [
        "application/pdf",
        "application/zip",
        "application/x-tar",
        "application/gzip",
        "application/x-7z-compressed",
        "application/vnd.rar",
        "application/octet-stream",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_link_selector() -> String {
    "a[href]".to_string()
}

fn default_document_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

fn default_archive_extensions() -> Vec<String> {
    vec!["zip".to_string()]
}

fn default_documents_dir() -> String {
    "PDFs".to_string()
}

fn default_archives_dir() -> String {
    "ZIPs".to_string()
}
