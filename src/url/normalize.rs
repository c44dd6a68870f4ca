use crate::UrlError;
use url::Url;

/// Resolves a candidate reference into an absolute, well-formed address
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty references
/// 2. Reject references with embedded whitespace or control characters
/// 3. If the reference parses on its own and carries a host, use it as-is;
///    otherwise resolve it against `base` (`report.pdf`, `/files/report.pdf`
///    and `//cdn.example.com/report.pdf` are all handled)
/// 4. Require an `http` or `https` scheme
/// 5. Require a host
/// 6. Remove fragment (everything after #)
///
/// The serialized result is the deduplication key for the run.
///
/// # Arguments
///
/// * `reference` - The raw reference found in markup
/// * `base` - The origin that relative references are resolved against
///
/// # Returns
///
/// * `Ok(Url)` - Normalized address
/// * `Err(UrlError)` - The reference cannot be turned into a fetchable address
///
/// # Examples
///
/// ```
/// use doc_harvest::url::normalize_candidate;
/// use url::Url;
///
/// let base = Url::parse("https://www.example.com").unwrap();
/// let url = normalize_candidate("/files/manual.pdf", &base).unwrap();
/// assert_eq!(url.as_str(), "https://www.example.com/files/manual.pdf");
/// ```
pub fn normalize_candidate(reference: &str, base: &Url) -> Result<Url, UrlError> {
    // Step 1: Trim
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(UrlError::Malformed("empty reference".to_string()));
    }

    // Step 2: Strict character check; the url crate would silently
    // percent-encode these
    if let Some(c) = reference
        .chars()
        .find(|c| c.is_whitespace() || c.is_control())
    {
        return Err(UrlError::Malformed(format!(
            "reference contains {:?}; whitespace and control characters are not \
             percent-encoded automatically, so the link is not fetched",
            c
        )));
    }

    // Step 3: Absolute references stand alone, everything else joins the base
    let mut url = match Url::parse(reference) {
        Ok(url) if url.host_str().is_some() => url,
        Ok(url) if !url.cannot_be_a_base() => return Err(UrlError::MissingHost),
        Ok(url) => {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                url.scheme()
            )))
        }
        Err(::url::ParseError::RelativeUrlWithoutBase) => base
            .join(reference)
            .map_err(|e| UrlError::Parse(e.to_string()))?,
        Err(e) => return Err(UrlError::Parse(e.to_string())),
    };

    // Step 4: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 5: Require a host
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    // Step 6: Remove fragment
    url.set_fragment(None);

    Ok(url)
}
