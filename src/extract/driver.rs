//! Extraction driver - turns the discovered-URL list into the record log
//!
//! The driver resumes from the length of the existing record log: the log is
//! append-only with exactly one record per input URL, so its line count is
//! the only resume cursor that stays correct when a crash lands between a
//! write and a checkpoint. URLs are processed concurrently under the
//! driver's own admission semaphore; the fetch gate applies its own limit
//! underneath. Appends to the record log and failure ledger, the progress
//! counters, and the checkpoint decision all happen inside one serialized
//! critical section so concurrent tasks never interleave partial lines or
//! double-checkpoint.

use crate::checkpoint::{self, ExtractionSnapshot};
use crate::config::Config;
use crate::events::{CrawlEvent, EventSink};
use crate::extract::record::SectionRecord;
use crate::extract::section::extract_section;
use crate::fetch::{FetchGate, FetchOutcome};
use crate::output::{FailureLedger, RecordWriter};
use crate::{CorpusError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

/// Counts reported at the end of an extraction run
#[derive(Debug, Clone)]
pub struct ExtractionSummary {
    /// Size of the input list
    pub total: usize,
    /// Records in the log after this run (resumed position included)
    pub processed: u64,
    /// Non-success records across all runs against this log
    pub failed: u64,
    pub interrupted: bool,
}

impl ExtractionSummary {
    /// Fraction of processed records that extracted successfully
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        (self.processed - self.failed.min(self.processed)) as f64 / self.processed as f64 * 100.0
    }
}

/// Shared writer state: everything the serialized critical section touches
struct WriterState {
    records: RecordWriter,
    ledger: FailureLedger,
    processed: u64,
    failed: u64,
    checkpoint_interval: u64,
    snapshot_path: PathBuf,
    config_hash: Option<String>,
    sink: Arc<dyn EventSink>,
}

impl WriterState {
    /// Appends one record (and its ledger line when non-success), advances
    /// the counters, and checkpoints on the interval
    ///
    /// Called only while holding the driver's mutex.
    fn append(&mut self, record: &SectionRecord) -> Result<()> {
        self.records.append(&record.to_line())?;

        if !record.status().is_success() {
            self.ledger
                .append(&record.url, record.status(), record.note().unwrap_or(""))?;
            self.failed += 1;
        }

        self.processed += 1;

        if self.processed % self.checkpoint_interval == 0 {
            self.save_snapshot()?;
        }

        Ok(())
    }

    fn save_snapshot(&self) -> Result<()> {
        checkpoint::save_extraction(
            &self.snapshot_path,
            &ExtractionSnapshot::new(self.processed, self.failed, self.config_hash.clone()),
        )?;
        self.sink.emit(CrawlEvent::ExtractionCheckpoint {
            processed: self.processed,
            failed: self.failed,
        });
        Ok(())
    }
}

/// Drives the discovered-URL list through the gate and the extractor
pub struct ExtractionDriver {
    config: Arc<Config>,
    gate: Arc<FetchGate>,
    sink: Arc<dyn EventSink>,
    config_hash: Option<String>,
}

impl ExtractionDriver {
    pub fn new(
        config: Arc<Config>,
        gate: Arc<FetchGate>,
        sink: Arc<dyn EventSink>,
        config_hash: Option<String>,
    ) -> Self {
        Self {
            config,
            gate,
            sink,
            config_hash,
        }
    }

    /// Runs extraction over the discovered-URL list
    ///
    /// Every admitted URL yields exactly one appended record, success or not.
    /// On interrupt no further URLs are admitted; tasks already past the
    /// semaphore finish and write their records before the final flush.
    pub async fn run(&self) -> Result<ExtractionSummary> {
        let input_path = self.config.paths.discovered_urls();
        if !input_path.exists() {
            return Err(CorpusError::Checkpoint(format!(
                "input list {} not found; run discovery first",
                input_path.display()
            )));
        }
        let urls = checkpoint::load_url_list(&input_path)?;

        let records_path = self.config.paths.records();
        let resume_at = RecordWriter::count_lines(&records_path)?;
        let remaining = urls.len().saturating_sub(resume_at);

        let snapshot_path = self.config.paths.extraction_snapshot();
        let failed_baseline = match checkpoint::load_extraction(&snapshot_path)? {
            Some(snapshot) => {
                if let (Some(stored), Some(current)) = (&snapshot.config_hash, &self.config_hash)
                {
                    if stored != current {
                        tracing::warn!(
                            "configuration changed since the snapshot was written; \
                             resuming with the new configuration"
                        );
                    }
                }
                snapshot.failed
            }
            None => 0,
        };

        self.sink.emit(CrawlEvent::ExtractionStarted {
            total: urls.len(),
            resumed_at: resume_at,
        });

        let state = Arc::new(Mutex::new(WriterState {
            records: RecordWriter::open(&records_path)?,
            ledger: FailureLedger::open(&self.config.paths.failures())?,
            processed: resume_at as u64,
            failed: failed_baseline,
            checkpoint_interval: self.config.extraction.checkpoint_interval,
            snapshot_path,
            config_hash: self.config_hash.clone(),
            sink: Arc::clone(&self.sink),
        }));

        let semaphore = Arc::new(Semaphore::new(self.config.extraction.concurrency as usize));
        let shutdown = Arc::new(AtomicBool::new(false));
        crate::crawler::spawn_interrupt_watcher(Arc::clone(&shutdown));

        let mut handles = Vec::new();
        let mut admitted = 0usize;

        for url in urls.iter().skip(resume_at) {
            if shutdown.load(Ordering::SeqCst) {
                tracing::warn!("interrupt received, no further URLs admitted");
                break;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| CorpusError::Checkpoint("extraction semaphore closed".to_string()))?;

            let gate = Arc::clone(&self.gate);
            let state = Arc::clone(&state);
            let sink = Arc::clone(&self.sink);
            let url = url.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                process_url(gate, url, state, sink).await
            }));
            admitted += 1;
        }

        let interrupted = admitted < remaining;

        // Wait for every admitted task; remember the first write error but
        // let siblings finish so their records are not lost.
        let mut task_error: Option<CorpusError> = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("extraction task failed: {}", e);
                    task_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!("extraction task did not complete: {}", e);
                }
            }
        }

        let state = state.lock().await;
        let flushed = state.save_snapshot();

        if let Some(e) = task_error {
            if let Err(flush_err) = flushed {
                tracing::error!("final checkpoint flush failed: {}", flush_err);
            }
            return Err(e);
        }
        flushed?;

        self.sink.emit(CrawlEvent::ExtractionFinished {
            processed: state.processed,
            failed: state.failed,
        });

        Ok(ExtractionSummary {
            total: urls.len(),
            processed: state.processed,
            failed: state.failed,
            interrupted,
        })
    }
}

/// Fetch + extract + serialized append for one URL
///
/// Fetch and extraction failures become data; only an output-file error (a
/// fatal driver condition) propagates.
async fn process_url(
    gate: Arc<FetchGate>,
    url: String,
    state: Arc<Mutex<WriterState>>,
    sink: Arc<dyn EventSink>,
) -> Result<()> {
    let record = match gate.fetch(&url).await {
        FetchOutcome::Rendered { html } => extract_section(&html, &url),
        FetchOutcome::Failed { reason } => SectionRecord::fetch_failure(&url, &reason),
    };
    let status = record.status();

    {
        let mut state = state.lock().await;
        state.append(&record)?;
    }

    sink.emit(CrawlEvent::RecordWritten { url, status });
    Ok(())
}
