use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for CCR-Corpus
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Target site configuration
///
/// The path patterns drive link classification. The defaults match the hosted
/// CCR publication site; overriding them is only useful for tests.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// The single seed URL discovery starts from
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Path substring every followed link must contain
    #[serde(rename = "link-scope", default = "default_link_scope")]
    pub link_scope: String,

    /// Path substring marking a navigation (browse) page
    #[serde(rename = "navigation-marker", default = "default_navigation_marker")]
    pub navigation_marker: String,

    /// Path suffix marking the top-level index page (also navigation)
    #[serde(rename = "index-suffix", default = "default_index_suffix")]
    pub index_suffix: String,

    /// Path substring marking a section document page
    #[serde(rename = "content-marker", default = "default_content_marker")]
    pub content_marker: String,
}

/// Fetch gate and rendering service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Endpoint of the browser rendering service
    #[serde(rename = "render-endpoint")]
    pub render_endpoint: String,

    /// Fixed delay before each request (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Upper bound on concurrently in-flight render requests
    #[serde(rename = "max-in-flight", default = "default_max_in_flight")]
    pub max_in_flight: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Ask the rendering service to bypass its page cache
    #[serde(rename = "cache-bypass", default = "default_true")]
    pub cache_bypass: bool,

    /// Ask the rendering service to wait for network idle before returning
    #[serde(rename = "wait-for-network-idle", default = "default_true")]
    pub wait_for_network_idle: bool,
}

/// Discovery driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Number of URLs fetched concurrently per BFS batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: u32,

    /// Checkpoint every time the visited count crosses a multiple of this
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,

    /// Stop after visiting this many URLs (test runs only)
    #[serde(rename = "max-visited", default)]
    pub max_visited: Option<u64>,

    /// Stop after discovering this many section URLs (test runs only)
    #[serde(rename = "max-discovered", default)]
    pub max_discovered: Option<u64>,
}

/// Extraction driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Number of URLs processed concurrently, independent of the fetch gate
    #[serde(default = "default_extract_concurrency")]
    pub concurrency: u32,

    /// Checkpoint every this many processed records
    #[serde(rename = "checkpoint-interval", default = "default_checkpoint_interval")]
    pub checkpoint_interval: u64,
}

/// Working-directory layout
///
/// Passed to the drivers at construction so tests can point everything at a
/// temporary directory.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the per-driver checkpoint snapshots
    #[serde(rename = "checkpoint-dir", default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,

    /// Directory holding the record log and failure ledger
    #[serde(rename = "data-dir", default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl PathsConfig {
    /// Discovery driver snapshot file
    pub fn discovery_snapshot(&self) -> PathBuf {
        self.checkpoint_dir.join("discovery_state.json")
    }

    /// Extraction driver snapshot file
    pub fn extraction_snapshot(&self) -> PathBuf {
        self.checkpoint_dir.join("extraction_state.json")
    }

    /// Discovered section URLs, one per line in discovery order
    pub fn discovered_urls(&self) -> PathBuf {
        self.checkpoint_dir.join("discovered_urls.txt")
    }

    /// JSON Lines record log
    pub fn records(&self) -> PathBuf {
        self.data_dir.join("sections.jsonl")
    }

    /// Tab-separated failure ledger
    pub fn failures(&self) -> PathBuf {
        self.data_dir.join("failed_extractions.tsv")
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            checkpoint_interval: default_checkpoint_interval(),
            max_visited: None,
            max_discovered: None,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            concurrency: default_extract_concurrency(),
            checkpoint_interval: default_checkpoint_interval(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: default_checkpoint_dir(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_link_scope() -> String {
    "/calregs/".to_string()
}

fn default_navigation_marker() -> String {
    "/calregs/Browse/".to_string()
}

fn default_index_suffix() -> String {
    "/calregs/Index".to_string()
}

fn default_content_marker() -> String {
    "/calregs/Document/".to_string()
}

fn default_delay_ms() -> u64 {
    1500
}

fn default_max_in_flight() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> u32 {
    3
}

fn default_checkpoint_interval() -> u64 {
    100
}

fn default_extract_concurrency() -> u32 {
    3
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("checkpoints")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
