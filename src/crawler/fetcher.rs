//! Asset fetcher implementation
//!
//! This module downloads a single asset with every gate applied:
//! - Existing destination files short-circuit without a request
//! - Browser-like request headers
//! - HTTP status must be 200
//! - Content-Type must match the allow-list for the asset kind
//! - gzip / deflate bodies are decoded before anything is written
//! - Empty bodies are rejected
//! - The file is written through a temporary sibling and renamed into place
//!
//! No failure here is fatal; every outcome is returned to the caller.

use crate::config::FetchConfig;
use crate::state::{AssetKind, DownloadOutcome};
use crate::url::sanitize_filename;
use crate::HarvestError;
use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT,
};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Encodings advertised on every request; brotli is decoded by the client
const ACCEPTED_ENCODINGS: &str = "gzip, deflate, br";

/// Builds the browser-like header set sent with every request
///
/// # Errors
///
/// Returns `HarvestError::InvalidHeader` if a configured value cannot be
/// used as an HTTP header value.
pub fn browser_headers(config: &FetchConfig) -> Result<HeaderMap, HarvestError> {
    let mut headers = HeaderMap::new();

    headers.insert(USER_AGENT, header_value("user-agent", &config.user_agent)?);
    headers.insert(ACCEPT, header_value("accept", &config.accept)?);
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPTED_ENCODINGS));
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept-language", &config.accept_language)?,
    );
    if config.do_not_track {
        headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    }
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    Ok(headers)
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, HarvestError> {
    HeaderValue::from_str(value).map_err(|e| HarvestError::InvalidHeader {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Client builder shared by the fetcher and the HTTP renderer
pub(crate) fn client_builder(config: &FetchConfig) -> Result<ClientBuilder, HarvestError> {
    Ok(Client::builder()
        .default_headers(browser_headers(config)?)
        .timeout(Duration::from_secs(config.timeout))
        .connect_timeout(Duration::from_secs(30)))
}

/// Builds the HTTP client used for asset downloads
///
/// gzip is left to the fetcher so that decoding failures can be told apart
/// from network failures; brotli is decoded transparently.
///
/// # Example
///
/// ```no_run
/// use doc_harvest::config::FetchConfig;
/// use doc_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, HarvestError> {
    Ok(client_builder(config)?.gzip(false).brotli(true).build()?)
}

/// Downloads individual assets into an output directory
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: Client,
    timeout: Duration,
    decompress: bool,
    document_content_types: Vec<String>,
    archive_content_types: Vec<String>,
}

impl AssetFetcher {
    /// Creates a fetcher with its own HTTP client
    pub fn new(config: &FetchConfig) -> Result<Self, HarvestError> {
        let client = build_http_client(config)?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(config.timeout),
            decompress: config.decompress,
            document_content_types: lowercase_all(&config.document_content_types),
            archive_content_types: lowercase_all(&config.archive_content_types),
        }
    }

    /// Content types accepted for an asset kind
    pub fn allowed_content_types(&self, kind: AssetKind) -> &[String] {
        match kind {
            AssetKind::Document => &self.document_content_types,
            AssetKind::Archive => &self.archive_content_types,
        }
    }

    /// Returns true if a declared Content-Type is on the allow-list for `kind`
    pub fn is_allowed_content_type(&self, kind: AssetKind, content_type: &str) -> bool {
        let declared = content_type.to_lowercase();
        self.allowed_content_types(kind)
            .iter()
            .any(|allowed| declared.contains(allowed.as_str()))
    }

    /// Destination of an address inside `output_dir`
    pub fn destination(address: &Url, output_dir: &Path) -> PathBuf {
        output_dir.join(sanitize_filename(address.as_str()))
    }

    /// Attempts exactly one retrieval of `address` into `output_dir`
    ///
    /// # Request Flow
    ///
    /// | Step | Failure outcome |
    /// |------|-----------------|
    /// | destination already a file | `AlreadyPresent` (no request) |
    /// | send GET | `NetworkFailure` |
    /// | status != 200 | `StatusFailure` |
    /// | Content-Type not allowed | `ContentTypeMismatch` |
    /// | read body | `NetworkFailure` |
    /// | zero bytes received | `ZeroByteBody` |
    /// | decode gzip / deflate | `DecompressionFailure` |
    /// | zero bytes decoded | `ZeroByteBody` |
    /// | write + rename | `FilesystemFailure` |
    ///
    /// Every failure is logged with the address and reason.
    pub async fn fetch(
        &self,
        address: &Url,
        kind: AssetKind,
        output_dir: &Path,
    ) -> DownloadOutcome {
        let outcome = self.fetch_inner(address, kind, output_dir).await;

        match &outcome {
            DownloadOutcome::Downloaded { bytes, path } => {
                tracing::info!(
                    "Successfully downloaded {} bytes: {} -> {}",
                    bytes,
                    address,
                    path.display()
                );
            }
            DownloadOutcome::AlreadyPresent { path } => {
                tracing::info!("File already exists, skipping: {}", path.display());
            }
            failure => {
                tracing::warn!(
                    failure_kind = failure.failure_kind().map(|k| k.as_str()).unwrap_or_default(),
                    "Download of {} {} failed: {}",
                    kind,
                    address,
                    failure
                );
            }
        }

        outcome
    }

    async fn fetch_inner(
        &self,
        address: &Url,
        kind: AssetKind,
        output_dir: &Path,
    ) -> DownloadOutcome {
        let path = Self::destination(address, output_dir);

        if path.is_file() {
            return DownloadOutcome::AlreadyPresent { path };
        }

        let response = match self
            .client
            .get(address.clone())
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return network_failure(e),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return DownloadOutcome::StatusFailure {
                status_code: status.as_u16(),
            };
        }

        let content_type = header_string(response.headers(), CONTENT_TYPE);
        if !self.is_allowed_content_type(kind, &content_type) {
            return DownloadOutcome::ContentTypeMismatch { content_type };
        }

        let encoding = header_string(response.headers(), CONTENT_ENCODING).to_lowercase();

        let raw = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return network_failure(e),
        };

        if raw.is_empty() {
            return DownloadOutcome::ZeroByteBody;
        }

        let body = if self.decompress {
            match decode_body(&encoding, &raw) {
                Ok(body) => body,
                Err(error) => return DownloadOutcome::DecompressionFailure { encoding, error },
            }
        } else {
            raw.to_vec()
        };

        if body.is_empty() {
            return DownloadOutcome::ZeroByteBody;
        }

        if let Err(e) = write_atomically(&path, &body).await {
            return DownloadOutcome::FilesystemFailure {
                path,
                error: e.to_string(),
            };
        }

        DownloadOutcome::Downloaded {
            bytes: body.len() as u64,
            path,
        }
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_string()
}

fn network_failure(e: reqwest::Error) -> DownloadOutcome {
    let error = if e.is_timeout() {
        format!("request timeout: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };
    DownloadOutcome::NetworkFailure { error }
}

/// Decodes a body according to its declared Content-Encoding
///
/// Unknown or absent encodings pass through untouched. gzip bodies may hold
/// several concatenated members. `deflate` is tried as zlib first and as raw
/// deflate second, since servers disagree on framing.
pub fn decode_body(encoding: &str, raw: &[u8]) -> Result<Vec<u8>, String> {
    let mut decoded = Vec::new();

    match encoding {
        "gzip" | "x-gzip" => {
            MultiGzDecoder::new(raw)
                .read_to_end(&mut decoded)
                .map_err(|e| e.to_string())?;
        }
        "deflate" => {
            if ZlibDecoder::new(raw).read_to_end(&mut decoded).is_err() {
                decoded.clear();
                DeflateDecoder::new(raw)
                    .read_to_end(&mut decoded)
                    .map_err(|e| e.to_string())?;
            }
        }
        _ => decoded.extend_from_slice(raw),
    }

    Ok(decoded)
}

/// Writes `body` next to `path` and renames it into place
///
/// The temporary file is removed on failure, so `path` is either absent or
/// complete.
async fn write_atomically(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.part", file_name));

    let result = async {
        tokio::fs::write(&temp, body).await?;
        tokio::fs::rename(&temp, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp).await;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn fetcher() -> AssetFetcher {
        AssetFetcher::new(&FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn test_browser_headers() {
        let headers = browser_headers(&FetchConfig::default()).unwrap();
        assert_eq!(headers[ACCEPT_ENCODING], "gzip, deflate, br");
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers["dnt"], "1");
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("Mozilla/5.0"));
        assert!(headers.contains_key(ACCEPT_LANGUAGE));
    }

    #[test]
    fn test_do_not_track_optional() {
        let config = FetchConfig {
            do_not_track: false,
            ..FetchConfig::default()
        };
        let headers = browser_headers(&config).unwrap();
        assert!(!headers.contains_key("dnt"));
    }

    #[test]
    fn test_invalid_header_value() {
        let config = FetchConfig {
            user_agent: "bad\nagent".to_string(),
            ..FetchConfig::default()
        };
        assert!(matches!(
            browser_headers(&config),
            Err(HarvestError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_document_allow_list() {
        let fetcher = fetcher();
        assert!(fetcher.is_allowed_content_type(AssetKind::Document, "application/pdf"));
        assert!(fetcher.is_allowed_content_type(
            AssetKind::Document,
            "Application/PDF; charset=binary"
        ));
        assert!(!fetcher.is_allowed_content_type(AssetKind::Document, "application/zip"));
        assert!(!fetcher.is_allowed_content_type(AssetKind::Document, "text/html"));
        assert!(!fetcher.is_allowed_content_type(AssetKind::Document, ""));
    }

    #[test]
    fn test_archive_allow_list() {
        let fetcher = fetcher();
        for content_type in [
            "application/zip",
            "application/x-tar",
            "application/gzip",
            "application/x-7z-compressed",
            "application/vnd.rar",
            "application/octet-stream",
            "application/pdf",
        ] {
            assert!(
                fetcher.is_allowed_content_type(AssetKind::Archive, content_type),
                "{} should be allowed",
                content_type
            );
        }
        assert!(!fetcher.is_allowed_content_type(AssetKind::Archive, "text/html"));
    }

    #[test]
    fn test_destination_uses_sanitized_name() {
        let address = Url::parse("https://example.com/Docs/User Guide.PDF").unwrap();
        let path = AssetFetcher::destination(&address, Path::new("PDFs"));
        assert_eq!(path, Path::new("PDFs").join("user_20guide.pdf"));
    }

    #[test]
    fn test_decode_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"%PDF-1.7 payload").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(decode_body("gzip", &compressed).unwrap(), b"%PDF-1.7 payload");
    }

    #[test]
    fn test_decode_multi_member_gzip() {
        let mut body = Vec::new();
        for part in [&b"%PDF-1.7 "[..], &b"second member"[..]] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(part).unwrap();
            body.extend(encoder.finish().unwrap());
        }

        assert_eq!(
            decode_body("gzip", &body).unwrap(),
            b"%PDF-1.7 second member"
        );
    }

    #[test]
    fn test_decode_deflate_zlib_framed() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"zip bytes").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(decode_body("deflate", &compressed).unwrap(), b"zip bytes");
    }

    #[test]
    fn test_decode_raw_deflate() {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"raw deflate").unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(decode_body("deflate", &compressed).unwrap(), b"raw deflate");
    }

    #[test]
    fn test_decode_invalid_gzip() {
        assert!(decode_body("gzip", b"definitely not gzip").is_err());
    }

    #[test]
    fn test_identity_passthrough() {
        assert_eq!(decode_body("", b"plain").unwrap(), b"plain");
        assert_eq!(decode_body("identity", b"plain").unwrap(), b"plain");
    }

    #[tokio::test]
    async fn test_write_atomically_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");

        write_atomically(&path, b"content").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"content");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_atomically_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("a.pdf");

        assert!(write_atomically(&path, b"content").await.is_err());
        assert!(!path.exists());
    }
}
