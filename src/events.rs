//! Structured progress events emitted by the drivers
//!
//! The drivers report progress through an injected [`EventSink`] instead of
//! writing to a process-global logger, so tests can assert on what happened
//! without scraping log output. [`TracingSink`] is the production sink and
//! forwards every event to `tracing`; [`MemorySink`] records events in memory.

use crate::extract::ExtractionStatus;
use std::sync::Mutex;

/// A progress event from the discovery or extraction driver
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// Discovery run starting (counts reflect a resumed checkpoint, if any)
    DiscoveryStarted {
        queued: usize,
        visited: usize,
        discovered: usize,
    },

    /// A BFS batch of this many URLs is being fetched
    BatchStarted { size: usize },

    /// A fetch resolved to a failure; the URL contributes no links or content
    FetchFailed { url: String, reason: String },

    /// Links were extracted from a fetched navigation page
    LinksExtracted { url: String, count: usize },

    /// A content URL entered the discovered set for the first time
    SectionDiscovered { url: String },

    /// Discovery state was flushed to disk
    DiscoveryCheckpoint {
        queued: usize,
        visited: usize,
        discovered: usize,
    },

    /// Discovery run finished (queue drained, ceiling hit, or interrupted)
    DiscoveryFinished {
        visited: usize,
        discovered: usize,
        queued: usize,
    },

    /// Extraction run starting
    ExtractionStarted { total: usize, resumed_at: usize },

    /// One record was appended to the record log
    RecordWritten {
        url: String,
        status: ExtractionStatus,
    },

    /// Extraction counters were flushed to disk
    ExtractionCheckpoint { processed: u64, failed: u64 },

    /// Extraction run finished
    ExtractionFinished { processed: u64, failed: u64 },
}

/// Receiver for driver progress events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

/// Forwards events to the `tracing` subscriber
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::DiscoveryStarted {
                queued,
                visited,
                discovered,
            } => {
                tracing::info!(queued, visited, discovered, "starting discovery");
            }
            CrawlEvent::BatchStarted { size } => {
                tracing::debug!(size, "processing batch");
            }
            CrawlEvent::FetchFailed { url, reason } => {
                tracing::warn!(%url, %reason, "fetch failed");
            }
            CrawlEvent::LinksExtracted { url, count } => {
                tracing::debug!(%url, count, "extracted links");
            }
            CrawlEvent::SectionDiscovered { url } => {
                tracing::info!(%url, "discovered section");
            }
            CrawlEvent::DiscoveryCheckpoint {
                queued,
                visited,
                discovered,
            } => {
                tracing::info!(queued, visited, discovered, "checkpoint saved");
            }
            CrawlEvent::DiscoveryFinished {
                visited,
                discovered,
                queued,
            } => {
                tracing::info!(visited, discovered, queued, "discovery finished");
            }
            CrawlEvent::ExtractionStarted { total, resumed_at } => {
                tracing::info!(total, resumed_at, "starting extraction");
            }
            CrawlEvent::RecordWritten { url, status } => {
                tracing::info!(%url, ?status, "record written");
            }
            CrawlEvent::ExtractionCheckpoint { processed, failed } => {
                tracing::info!(processed, failed, "checkpoint saved");
            }
            CrawlEvent::ExtractionFinished { processed, failed } => {
                tracing::info!(processed, failed, "extraction finished");
            }
        }
    }
}

/// Records events in memory, in emission order
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<CrawlEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events emitted so far
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: CrawlEvent) {
        self.events.lock().unwrap().push(event);
    }
}
