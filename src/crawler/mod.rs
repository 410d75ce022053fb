//! Crawler module: frontier management and the discovery driver
//!
//! Discovery is the first phase of the pipeline: a breadth-first traversal of
//! the site's browse hierarchy that classifies every link it sees and emits
//! the ordered list of section-document URLs for the extraction phase.

mod discovery;
mod frontier;
mod parser;

pub use discovery::{DiscoveryDriver, DiscoverySummary};
pub use frontier::Frontier;
pub use parser::extract_links;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Spawns a task that flips `flag` when the process receives Ctrl-C
///
/// The drivers poll the flag between batches, so work already admitted past
/// the fetch gate finishes naturally before the final checkpoint flush.
pub fn spawn_interrupt_watcher(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received");
            flag.store(true, Ordering::SeqCst);
        }
    });
}
