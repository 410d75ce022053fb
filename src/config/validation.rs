use crate::config::types::{Config, DiscoveryConfig, ExtractionConfig, FetchConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site(&config.site)?;
    validate_fetch(&config.fetch)?;
    validate_discovery(&config.discovery)?;
    validate_extraction(&config.extraction)?;
    Ok(())
}

/// Validates the site configuration
fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    let seed = Url::parse(&site.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed-url: {}", e)))?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "seed-url must be HTTP(S), got scheme '{}'",
            seed.scheme()
        )));
    }

    if !seed.path().contains(&site.link_scope) {
        return Err(ConfigError::Validation(format!(
            "seed-url path '{}' is outside link-scope '{}'",
            seed.path(),
            site.link_scope
        )));
    }

    for (name, value) in [
        ("link-scope", &site.link_scope),
        ("navigation-marker", &site.navigation_marker),
        ("index-suffix", &site.index_suffix),
        ("content-marker", &site.content_marker),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates the fetch gate configuration
fn validate_fetch(fetch: &FetchConfig) -> Result<(), ConfigError> {
    Url::parse(&fetch.render_endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid render-endpoint: {}", e)))?;

    if fetch.max_in_flight < 1 || fetch.max_in_flight > 100 {
        return Err(ConfigError::Validation(format!(
            "max-in-flight must be between 1 and 100, got {}",
            fetch.max_in_flight
        )));
    }

    if fetch.timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "timeout-ms must be >= 1000, got {}",
            fetch.timeout_ms
        )));
    }

    Ok(())
}

/// Validates the discovery driver configuration
fn validate_discovery(discovery: &DiscoveryConfig) -> Result<(), ConfigError> {
    if discovery.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            discovery.batch_size
        )));
    }

    if discovery.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint-interval must be >= 1, got {}",
            discovery.checkpoint_interval
        )));
    }

    Ok(())
}

/// Validates the extraction driver configuration
fn validate_extraction(extraction: &ExtractionConfig) -> Result<(), ConfigError> {
    if extraction.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            extraction.concurrency
        )));
    }

    if extraction.checkpoint_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint-interval must be >= 1, got {}",
            extraction.checkpoint_interval
        )));
    }

    Ok(())
}
