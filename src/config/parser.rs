use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored in checkpoint snapshots so a resumed run can warn when
/// the configuration changed underneath it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const MINIMAL: &str = r#"
[site]
seed-url = "https://govt.westlaw.com/calregs/Index"

[fetch]
render-endpoint = "http://127.0.0.1:3000/render"
"#;

    #[test]
    fn test_load_minimal_config_with_defaults() {
        let file = create_temp_config(MINIMAL);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.seed_url, "https://govt.westlaw.com/calregs/Index");
        assert_eq!(config.site.navigation_marker, "/calregs/Browse/");
        assert_eq!(config.site.content_marker, "/calregs/Document/");
        assert_eq!(config.fetch.delay_ms, 1500);
        assert_eq!(config.fetch.max_in_flight, 3);
        assert!(config.fetch.cache_bypass);
        assert_eq!(config.discovery.checkpoint_interval, 100);
        assert_eq!(config.extraction.concurrency, 3);
        assert_eq!(
            config.paths.records(),
            std::path::PathBuf::from("data/sections.jsonl")
        );
    }

    #[test]
    fn test_load_config_with_overrides() {
        let content = r#"
[site]
seed-url = "https://example.com/calregs/Index"

[fetch]
render-endpoint = "http://127.0.0.1:3000/render"
delay-ms = 10
max-in-flight = 8

[discovery]
batch-size = 5
max-visited = 50
max-discovered = 10

[paths]
checkpoint-dir = "/tmp/ck"
data-dir = "/tmp/data"
"#;
        let file = create_temp_config(content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetch.delay_ms, 10);
        assert_eq!(config.discovery.batch_size, 5);
        assert_eq!(config.discovery.max_visited, Some(50));
        assert_eq!(config.discovery.max_discovered, Some(10));
        assert_eq!(
            config.paths.discovery_snapshot(),
            std::path::PathBuf::from("/tmp/ck/discovery_state.json")
        );
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_compute_config_hash_is_stable() {
        let file = create_temp_config(MINIMAL);

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
