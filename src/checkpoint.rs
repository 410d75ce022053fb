//! Durable snapshots of driver progress
//!
//! Each driver owns exactly one versioned snapshot file, read once at startup
//! and rewritten on a cadence and on shutdown. Snapshots are written via a
//! temp-file-then-rename so a crash mid-write can never leave a half-written
//! checkpoint behind. The discovered-URL list is written the same way as a
//! plain line-oriented file, since it doubles as the extraction input.

use crate::{CorpusError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Current snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Discovery driver snapshot: the full frontier state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    /// Hash of the config the run was started with
    #[serde(default)]
    pub config_hash: Option<String>,
    /// BFS queue, front first
    pub queue: Vec<String>,
    /// Visited URLs, sorted
    pub visited: Vec<String>,
    /// Discovered section URLs, in discovery order
    pub discovered: Vec<String>,
}

impl DiscoverySnapshot {
    pub fn new(
        queue: Vec<String>,
        visited: Vec<String>,
        discovered: Vec<String>,
        config_hash: Option<String>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            config_hash,
            queue,
            visited,
            discovered,
        }
    }
}

/// Extraction driver snapshot: progress counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub config_hash: Option<String>,
    pub processed: u64,
    pub failed: u64,
}

impl ExtractionSnapshot {
    pub fn new(processed: u64, failed: u64, config_hash: Option<String>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            config_hash,
            processed,
            failed,
        }
    }
}

/// Loads the discovery snapshot, if one exists
pub fn load_discovery(path: &Path) -> Result<Option<DiscoverySnapshot>> {
    let snapshot: Option<DiscoverySnapshot> = read_json(path)?;
    if let Some(s) = &snapshot {
        check_version(s.version, path)?;
    }
    Ok(snapshot)
}

/// Loads the extraction snapshot, if one exists
pub fn load_extraction(path: &Path) -> Result<Option<ExtractionSnapshot>> {
    let snapshot: Option<ExtractionSnapshot> = read_json(path)?;
    if let Some(s) = &snapshot {
        check_version(s.version, path)?;
    }
    Ok(snapshot)
}

/// Atomically writes the discovery snapshot
pub fn save_discovery(path: &Path, snapshot: &DiscoverySnapshot) -> Result<()> {
    write_atomic(path, serde_json::to_vec_pretty(snapshot)?.as_slice())
}

/// Atomically writes the extraction snapshot
pub fn save_extraction(path: &Path, snapshot: &ExtractionSnapshot) -> Result<()> {
    write_atomic(path, serde_json::to_vec_pretty(snapshot)?.as_slice())
}

/// Atomically writes a line-oriented URL list
pub fn save_url_list(path: &Path, urls: &[String]) -> Result<()> {
    let mut buffer = Vec::with_capacity(urls.iter().map(|u| u.len() + 1).sum());
    for url in urls {
        writeln!(buffer, "{}", url)?;
    }
    write_atomic(path, &buffer)
}

/// Reads a line-oriented URL list, skipping blank lines
pub fn load_url_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn check_version(version: u32, path: &Path) -> Result<()> {
    if version != SNAPSHOT_VERSION {
        return Err(CorpusError::Checkpoint(format!(
            "unsupported snapshot version {} in {} (expected {})",
            version,
            path.display(),
            SNAPSHOT_VERSION
        )));
    }
    Ok(())
}

/// Write-to-temp-then-rename so readers never observe a partial file
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
