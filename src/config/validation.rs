use crate::config::types::{
    CatalogConfig, Config, CrawlerConfig, ExtractConfig, FetchConfig, OutputConfig,
    RendererConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_renderer_config(&config.renderer)?;
    validate_fetch_config(&config.fetch)?;
    validate_extract_config(&config.extract)?;
    validate_output_config(&config.output)?;
    validate_catalog(&config.catalog)?;
    Ok(())
}

/// Validates orchestration configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_http_url("base-origin", &config.base_origin)?;

    if config.render_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "render-timeout must be >= 1s, got {}s",
            config.render_timeout
        )));
    }

    // A zero inter-page delay is allowed and disables pacing

    Ok(())
}

/// Validates renderer configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    if config.chrome_binary.trim().is_empty() {
        return Err(ConfigError::Validation(
            "chrome-binary cannot be empty".to_string(),
        ));
    }

    if let Some(dir) = &config.cache_dir {
        if dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cache-dir cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates download configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "fetch timeout must be >= 1s, got {}s",
            config.timeout
        )));
    }

    for (name, value) in [
        ("user-agent", &config.user_agent),
        ("accept", &config.accept),
        ("accept-language", &config.accept_language),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    validate_content_types("document-content-types", &config.document_content_types)?;
    validate_content_types("archive-content-types", &config.archive_content_types)?;

    Ok(())
}

fn validate_content_types(name: &str, types: &[String]) -> Result<(), ConfigError> {
    if types.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} must list at least one content type",
            name
        )));
    }

    if let Some(bad) = types.iter().find(|t| !t.contains('/')) {
        return Err(ConfigError::Validation(format!(
            "{} contains '{}', which is not a media type",
            name, bad
        )));
    }

    Ok(())
}

/// Validates link extraction configuration
///
/// The link selector is not checked here: an unusable selector
/// degrades extraction to the lexical scan instead of aborting the run.
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    if config.document_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "document-extensions must list at least one extension".to_string(),
        ));
    }

    for ext in config
        .document_extensions
        .iter()
        .chain(config.archive_extensions.iter())
    {
        validate_extension(ext)?;
    }

    Ok(())
}

/// Extensions are written without the leading dot, e.g. `pdf`
fn validate_extension(ext: &str) -> Result<(), ConfigError> {
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::InvalidPattern(format!(
            "Extension '{}' must be non-empty and alphanumeric (no leading dot)",
            ext
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.documents_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "documents-dir cannot be empty".to_string(),
        ));
    }

    if config.archives_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "archives-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the page catalog
fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.pages.is_empty() {
        return Err(ConfigError::Validation(
            "catalog must contain at least one page".to_string(),
        ));
    }

    for page in &catalog.pages {
        validate_http_url("catalog page", page)?;
    }

    Ok(())
}

/// Requires an absolute http(s) URL with a host
fn validate_http_url(what: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", what, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            what, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            what, value
        )));
    }

    Ok(())
}
