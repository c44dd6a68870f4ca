//! Link extraction from rendered markup
//!
//! Vendor pages are inconsistent, so two scans run over every document:
//! - a structural scan over anchor elements, keeping `href`s that end in a
//!   recognized extension
//! - a lexical scan for absolute `http(s)://` addresses ending in a
//!   recognized extension, wherever they appear (scripts, JSON blobs, text)
//!
//! Both scans are pure. A lexical match that the structural scan already
//! reported for the same document is dropped, so an absolute anchor counts
//! once; repeats within a scan are kept and left to the run-wide seen-set.

use crate::config::ExtractConfig;
use crate::state::AssetKind;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// A raw reference found in markup, tagged with what it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// The reference exactly as it appeared (original casing preserved)
    pub reference: String,

    /// Kind inferred from the extension
    pub kind: AssetKind,
}

/// Compiled extraction rules
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    /// `None` when the configured selector could not be compiled
    anchor_selector: Option<Selector>,
    selector_source: String,
    document_extensions: Vec<String>,
    archive_extensions: Vec<String>,
    lexical_pattern: Option<Regex>,
}

impl LinkExtractor {
    /// Compiles the extraction rules
    ///
    /// An unusable selector is logged and leaves only the lexical scan; it
    /// never fails construction.
    pub fn new(config: &ExtractConfig) -> Self {
        let anchor_selector = match Selector::parse(&config.link_selector) {
            Ok(selector) => Some(selector),
            Err(e) => {
                tracing::warn!(
                    "Link selector '{}' is unusable ({:?}); extraction will use the lexical scan only",
                    config.link_selector,
                    e
                );
                None
            }
        };

        let document_extensions = lowercase_all(&config.document_extensions);
        let archive_extensions = lowercase_all(&config.archive_extensions);

        let lexical_pattern =
            build_lexical_pattern(document_extensions.iter().chain(archive_extensions.iter()));

        Self {
            anchor_selector,
            selector_source: config.link_selector.clone(),
            document_extensions,
            archive_extensions,
            lexical_pattern,
        }
    }

    /// Infers the asset kind from a reference's extension
    ///
    /// Matching is case-insensitive; documents win when an extension is
    /// configured for both kinds.
    pub fn classify(&self, reference: &str) -> Option<AssetKind> {
        let lowercase = reference.trim().to_lowercase();
        let has_ext = |exts: &[String]| {
            exts.iter()
                .any(|ext| lowercase.ends_with(&format!(".{}", ext)))
        };

        if has_ext(self.document_extensions.as_slice()) {
            Some(AssetKind::Document)
        } else if has_ext(self.archive_extensions.as_slice()) {
            Some(AssetKind::Archive)
        } else {
            None
        }
    }

    /// Runs both scans over a document
    ///
    /// Structural matches come first, in document order, followed by lexical
    /// matches in text order. Lexical matches whose reference the structural
    /// scan already returned are skipped; any other repeats are kept.
    pub fn extract(&self, markup: &str) -> Vec<CandidateLink> {
        let structural = self.extract_structural(markup);
        let anchored: HashSet<&str> = structural
            .iter()
            .map(|link| link.reference.as_str())
            .collect();

        let lexical: Vec<CandidateLink> = self
            .extract_lexical(markup)
            .into_iter()
            .filter(|link| !anchored.contains(link.reference.as_str()))
            .collect();

        let mut links = structural;
        links.extend(lexical);
        links
    }

    /// Scans anchor-like elements for recognized `href` values
    ///
    /// Returns an empty list, after logging, when no selector is available.
    pub fn extract_structural(&self, markup: &str) -> Vec<CandidateLink> {
        let Some(selector) = &self.anchor_selector else {
            tracing::warn!(
                "Skipping structural scan: link selector '{}' could not be parsed",
                self.selector_source
            );
            return Vec::new();
        };

        let document = Html::parse_document(markup);
        if !document.errors.is_empty() {
            tracing::debug!(
                "Markup had {} recoverable parse errors",
                document.errors.len()
            );
        }

        let mut links = Vec::new();
        for element in document.select(selector) {
            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if let Some(kind) = self.classify(href) {
                    links.push(CandidateLink {
                        reference: href.to_string(),
                        kind,
                    });
                }
            }
        }

        links
    }

    /// Scans raw text for absolute addresses ending in a recognized extension
    pub fn extract_lexical(&self, text: &str) -> Vec<CandidateLink> {
        let Some(pattern) = &self.lexical_pattern else {
            return Vec::new();
        };

        pattern
            .find_iter(text)
            .filter_map(|m| {
                let reference = m.as_str();
                self.classify(reference).map(|kind| CandidateLink {
                    reference: reference.to_string(),
                    kind,
                })
            })
            .collect()
    }

    /// Returns true if the structural scan is available
    pub fn has_structural_scan(&self) -> bool {
        self.anchor_selector.is_some()
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

/// Builds `(?i)https?://[^\s"'<>\\]+\.(?:ext1|ext2)\b`
fn build_lexical_pattern<'a, I>(extensions: I) -> Option<Regex>
where
    I: Iterator<Item = &'a String>,
{
    let alternatives: Vec<String> = extensions.map(|ext| regex::escape(ext)).collect();
    if alternatives.is_empty() {
        return None;
    }

    let pattern = format!(
        r#"(?i)https?://[^\s"'<>\\]+\.(?:{})\b"#,
        alternatives.join("|")
    );

    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!("Lexical link pattern failed to compile: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> LinkExtractor {
        LinkExtractor::new(&ExtractConfig::default())
    }

    fn references(links: &[CandidateLink]) -> Vec<&str> {
        links.iter().map(|l| l.reference.as_str()).collect()
    }

    #[test]
    fn test_relative_pdf_anchor() {
        let html = r#"<html><body><a href="report.pdf">Report</a></body></html>"#;
        let links = extractor().extract(html);
        assert_eq!(
            links,
            vec![CandidateLink {
                reference: "report.pdf".to_string(),
                kind: AssetKind::Document,
            }]
        );
    }

    #[test]
    fn test_anchor_and_script_embedded_archive() {
        let html = r#"<html><body>
            <a href="report.pdf">Report</a>
            <script>window.__DATA__ = {"fw": "https://host/archive.zip"};</script>
        </body></html>"#;
        let links = extractor().extract(html);

        assert_eq!(links.len(), 2);
        assert!(links.contains(&CandidateLink {
            reference: "report.pdf".to_string(),
            kind: AssetKind::Document,
        }));
        assert!(links.contains(&CandidateLink {
            reference: "https://host/archive.zip".to_string(),
            kind: AssetKind::Archive,
        }));
    }

    #[test]
    fn test_case_insensitive_extension_preserves_casing() {
        let html = r#"<a href="/Docs/Manual.PDF">Manual</a>"#;
        let links = extractor().extract_structural(html);
        assert_eq!(references(&links), vec!["/Docs/Manual.PDF"]);
    }

    #[test]
    fn test_non_matching_anchor_ignored() {
        let html = r#"<a href="/products">Products</a><a href="/a.pdf.html">Viewer</a>"#;
        assert!(extractor().extract_structural(html).is_empty());
    }

    #[test]
    fn test_absolute_anchor_reported_once() {
        let html = r#"<a href="https://dl.example.com/a.pdf">A</a>"#;
        let links = extractor().extract(html);
        assert_eq!(references(&links), vec!["https://dl.example.com/a.pdf"]);
    }

    #[test]
    fn test_repeated_absolute_anchor_kept_per_anchor() {
        let html = r#"
            <a href="https://dl.example.com/a.pdf">A</a>
            <a href="https://dl.example.com/b.pdf">B</a>
            <a href="https://dl.example.com/a.pdf">A again</a>
            <script>var fw = "https://dl.example.com/a.pdf";</script>
        "#;
        let links = extractor().extract(html);
        assert_eq!(
            references(&links),
            vec![
                "https://dl.example.com/a.pdf",
                "https://dl.example.com/b.pdf",
                "https://dl.example.com/a.pdf",
            ]
        );
    }

    #[test]
    fn test_lexical_only_match_survives_next_to_anchors() {
        let html = r#"
            <a href="https://dl.example.com/a.pdf">A</a>
            <script>var fw = "https://dl.example.com/fw.zip";</script>
        "#;
        let links = extractor().extract(html);
        assert_eq!(
            references(&links),
            vec!["https://dl.example.com/a.pdf", "https://dl.example.com/fw.zip"]
        );
        assert_eq!(links[1].kind, AssetKind::Archive);
    }

    #[test]
    fn test_lexical_scan_in_plain_text() {
        let text = "See https://example.com/fw/Update.ZIP and http://example.com/spec.pdf.";
        let links = extractor().extract_lexical(text);
        assert_eq!(
            references(&links),
            vec!["https://example.com/fw/Update.ZIP", "http://example.com/spec.pdf"]
        );
        assert_eq!(links[0].kind, AssetKind::Archive);
        assert_eq!(links[1].kind, AssetKind::Document);
    }

    #[test]
    fn test_lexical_scan_stops_at_quotes() {
        let text = r#"{"a":"https://example.com/a.pdf","b":"https://example.com/b.zip"}"#;
        let links = extractor().extract_lexical(text);
        assert_eq!(
            references(&links),
            vec!["https://example.com/a.pdf", "https://example.com/b.zip"]
        );
    }

    #[test]
    fn test_lexical_scan_requires_extension_boundary() {
        let text = "https://example.com/a.pdfx https://example.com/b.zipper";
        assert!(extractor().extract_lexical(text).is_empty());
    }

    #[test]
    fn test_malformed_markup_does_not_abort() {
        let html = r#"<html><body><div><a href="broken.pdf">x</div></p></span><a href='ok.pdf'"#;
        let links = extractor().extract_structural(html);
        assert!(references(&links).contains(&"broken.pdf"));
    }

    #[test]
    fn test_invalid_selector_falls_back_to_lexical() {
        let config = ExtractConfig {
            link_selector: "a[[href".to_string(),
            ..ExtractConfig::default()
        };
        let extractor = LinkExtractor::new(&config);
        assert!(!extractor.has_structural_scan());

        let html = r#"<a href="relative.pdf">x</a> https://example.com/abs.pdf"#;
        let links = extractor.extract(html);
        assert_eq!(references(&links), vec!["https://example.com/abs.pdf"]);
    }

    #[test]
    fn test_configured_archive_extensions() {
        let config = ExtractConfig {
            archive_extensions: vec!["zip".to_string(), "7z".to_string()],
            ..ExtractConfig::default()
        };
        let extractor = LinkExtractor::new(&config);
        let links = extractor.extract(r#"<a href="/fw/pack.7z">7z</a>"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind, AssetKind::Archive);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let html = r#"<a href="a.pdf">1</a><a href="a.pdf">2</a>"#;
        assert_eq!(extractor().extract(html).len(), 2);
    }

    #[test]
    fn test_classify() {
        let extractor = extractor();
        assert_eq!(extractor.classify("x.PDF"), Some(AssetKind::Document));
        assert_eq!(extractor.classify("x.zip"), Some(AssetKind::Archive));
        assert_eq!(extractor.classify("x.tar"), None);
    }
}
