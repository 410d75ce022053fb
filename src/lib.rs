//! CCR-Corpus: a crawl-and-extract pipeline for the California Code of Regulations
//!
//! This crate builds a structured corpus from the hosted CCR publication site in
//! two phases: discovery walks the browse hierarchy breadth-first to enumerate
//! section URLs, and extraction turns each section page into one canonical
//! record appended to a JSON Lines log. Both phases checkpoint their progress
//! and resume after a crash.

pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod events;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for CCR-Corpus operations
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render failed for {url}: {message}")]
    Render { url: String, message: String },

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for CCR-Corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ExtractionStatus, SectionRecord};
pub use url::{normalize_url, LinkClass, LinkClassifier};
