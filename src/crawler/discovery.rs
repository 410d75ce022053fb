//! Discovery driver - breadth-first traversal of navigation pages
//!
//! The driver drains the frontier in batches: up to `batch-size` URLs are
//! taken from the queue and marked visited before anything is awaited, the
//! batch is fetched concurrently through the gate, and the resulting link
//! lists are merged back into the frontier sequentially in the driver's own
//! context. Marking visited at batch assembly (never inside a spawned task)
//! is what makes a double fetch of the same URL within a batch impossible.
//!
//! A failed fetch is reported and contributes no links; traversal continues.
//! The frontier is checkpointed whenever the visited count crosses a multiple
//! of the checkpoint interval, on interrupt, and on every exit path.

use crate::checkpoint;
use crate::config::Config;
use crate::crawler::parser::extract_links;
use crate::events::{CrawlEvent, EventSink};
use crate::fetch::{FetchGate, FetchOutcome};
use crate::url::{normalize_url, LinkClass, LinkClassifier};
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

use super::frontier::Frontier;

/// Counts reported at the end of a discovery run
#[derive(Debug, Clone)]
pub struct DiscoverySummary {
    pub visited: usize,
    pub discovered: usize,
    pub queued: usize,
    pub interrupted: bool,
}

/// BFS driver over the navigation pages
pub struct DiscoveryDriver {
    config: Arc<Config>,
    gate: Arc<FetchGate>,
    classifier: LinkClassifier,
    sink: Arc<dyn EventSink>,
    frontier: Frontier,
    config_hash: Option<String>,
    last_checkpoint_mark: u64,
}

impl DiscoveryDriver {
    /// Creates a driver, resuming from the checkpoint snapshot unless `fresh`
    ///
    /// With no snapshot (or with `fresh`) the frontier holds only the
    /// normalized seed URL. Resuming with a config whose hash differs from
    /// the one stored in the snapshot logs a warning but proceeds.
    pub fn new(
        config: Arc<Config>,
        gate: Arc<FetchGate>,
        sink: Arc<dyn EventSink>,
        config_hash: Option<String>,
        fresh: bool,
    ) -> Result<Self> {
        let seed = normalize_url(&config.site.seed_url)?;
        let snapshot_path = config.paths.discovery_snapshot();

        let frontier = if fresh {
            Frontier::seeded(seed.as_str())
        } else {
            match checkpoint::load_discovery(&snapshot_path)? {
                Some(snapshot) => {
                    if let (Some(stored), Some(current)) = (&snapshot.config_hash, &config_hash) {
                        if stored != current {
                            tracing::warn!(
                                "configuration changed since the snapshot was written; \
                                 resuming with the new configuration"
                            );
                        }
                    }
                    tracing::info!(
                        queued = snapshot.queue.len(),
                        visited = snapshot.visited.len(),
                        discovered = snapshot.discovered.len(),
                        "resuming from checkpoint"
                    );
                    Frontier::from_snapshot(snapshot)
                }
                None => Frontier::seeded(seed.as_str()),
            }
        };

        let interval = config.discovery.checkpoint_interval;
        let last_checkpoint_mark = frontier.visited_count() as u64 / interval;

        Ok(Self {
            classifier: LinkClassifier::new(&config.site),
            config,
            gate,
            sink,
            frontier,
            config_hash,
            last_checkpoint_mark,
        })
    }

    /// Runs the BFS until the queue is drained, a ceiling is hit, or an
    /// interrupt is received
    ///
    /// The frontier is flushed to disk on every exit path, including the
    /// error path, before the error propagates.
    pub async fn run(&mut self) -> Result<DiscoverySummary> {
        self.sink.emit(CrawlEvent::DiscoveryStarted {
            queued: self.frontier.queue_len(),
            visited: self.frontier.visited_count(),
            discovered: self.frontier.discovered_count(),
        });

        let shutdown = Arc::new(AtomicBool::new(false));
        super::spawn_interrupt_watcher(shutdown.clone());

        let drained = self.drain(&shutdown).await;

        let flushed = self.save_checkpoint();

        let interrupted = match drained {
            Ok(interrupted) => interrupted,
            Err(e) => {
                if let Err(flush_err) = flushed {
                    tracing::error!("final checkpoint flush failed: {}", flush_err);
                }
                return Err(e);
            }
        };
        flushed?;

        self.sink.emit(CrawlEvent::DiscoveryFinished {
            visited: self.frontier.visited_count(),
            discovered: self.frontier.discovered_count(),
            queued: self.frontier.queue_len(),
        });

        Ok(DiscoverySummary {
            visited: self.frontier.visited_count(),
            discovered: self.frontier.discovered_count(),
            queued: self.frontier.queue_len(),
            interrupted,
        })
    }

    /// The main batch loop; returns whether it stopped on an interrupt
    async fn drain(&mut self, shutdown: &AtomicBool) -> Result<bool> {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                tracing::warn!("interrupt received, stopping after checkpoint");
                return Ok(true);
            }

            if self.ceiling_reached() {
                tracing::info!("visit/discovery ceiling reached, stopping");
                return Ok(false);
            }

            let batch = self.take_batch();
            if batch.is_empty() {
                tracing::info!("frontier queue is empty, traversal complete");
                return Ok(false);
            }

            self.sink.emit(CrawlEvent::BatchStarted { size: batch.len() });

            let mut handles = Vec::with_capacity(batch.len());
            for url in batch {
                let gate = Arc::clone(&self.gate);
                let scope = self.config.site.link_scope.clone();
                handles.push(tokio::spawn(async move {
                    match gate.fetch(&url).await {
                        FetchOutcome::Rendered { html } => {
                            let links = match Url::parse(&url) {
                                Ok(base) => extract_links(&html, &base, &scope),
                                Err(_) => Vec::new(),
                            };
                            (url, Ok(links))
                        }
                        FetchOutcome::Failed { reason } => (url, Err(reason)),
                    }
                }));
            }

            // Results merge in completion order; discovered-set membership is
            // exact either way.
            for handle in handles {
                match handle.await {
                    Ok((url, Ok(links))) => {
                        self.sink.emit(CrawlEvent::LinksExtracted {
                            url,
                            count: links.len(),
                        });
                        self.fold_links(links);
                    }
                    Ok((url, Err(reason))) => {
                        self.sink.emit(CrawlEvent::FetchFailed { url, reason });
                    }
                    Err(e) => {
                        tracing::error!("batch task failed to complete: {}", e);
                    }
                }
            }

            self.maybe_checkpoint()?;
        }
    }

    /// Takes up to `batch-size` unvisited URLs off the queue, marking each
    /// visited before anything else happens
    fn take_batch(&mut self) -> Vec<String> {
        let mut batch = Vec::new();
        while batch.len() < self.config.discovery.batch_size as usize {
            match self.frontier.dequeue() {
                Some(url) => {
                    if self.frontier.mark_visited(&url) {
                        batch.push(url);
                    }
                }
                None => break,
            }
        }
        batch
    }

    /// Normalizes and classifies extracted links, folding them into the
    /// frontier
    fn fold_links(&mut self, links: Vec<String>) {
        for link in links {
            let normalized = match normalize_url(&link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(%link, "dropping unnormalizable link: {}", e);
                    continue;
                }
            };

            match self.classifier.classify(&normalized) {
                LinkClass::Navigation => {
                    self.frontier.enqueue(normalized.as_str());
                }
                LinkClass::Content => {
                    if self.frontier.record_discovered(normalized.as_str()) {
                        self.sink.emit(CrawlEvent::SectionDiscovered {
                            url: normalized.to_string(),
                        });
                    }
                }
                LinkClass::Ignored => {}
            }
        }
    }

    fn ceiling_reached(&self) -> bool {
        if let Some(max) = self.config.discovery.max_visited {
            if self.frontier.visited_count() as u64 >= max {
                return true;
            }
        }
        if let Some(max) = self.config.discovery.max_discovered {
            if self.frontier.discovered_count() as u64 >= max {
                return true;
            }
        }
        false
    }

    /// Checkpoints when the visited count has crossed a multiple of the
    /// checkpoint interval since the last save
    fn maybe_checkpoint(&mut self) -> Result<()> {
        let interval = self.config.discovery.checkpoint_interval;
        let mark = self.frontier.visited_count() as u64 / interval;
        if mark > self.last_checkpoint_mark {
            self.last_checkpoint_mark = mark;
            self.save_checkpoint()?;
        }
        Ok(())
    }

    /// Writes the snapshot and the discovered-URL list
    fn save_checkpoint(&self) -> Result<()> {
        let snapshot = self.frontier.to_snapshot(self.config_hash.clone());
        checkpoint::save_discovery(&self.config.paths.discovery_snapshot(), &snapshot)?;
        checkpoint::save_url_list(
            &self.config.paths.discovered_urls(),
            self.frontier.discovered(),
        )?;

        self.sink.emit(CrawlEvent::DiscoveryCheckpoint {
            queued: self.frontier.queue_len(),
            visited: self.frontier.visited_count(),
            discovered: self.frontier.discovered_count(),
        });
        Ok(())
    }
}
