//! Configuration module for CCR-Corpus
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. All paths and site patterns live here so that drivers can be
//! constructed against temporary directories in tests.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DiscoveryConfig, ExtractionConfig, FetchConfig, PathsConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
