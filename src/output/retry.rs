//! Retry-list generation from the failure ledger
//!
//! There is no automatic re-queue in the pipeline; recovery is a separate
//! full pass. This module computes that pass's input: every URL in the
//! failure ledger that still has no successful record in the log, in ledger
//! order, deduplicated.

use crate::extract::ExtractionStatus;
use crate::output::log::read_records;
use crate::Result;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Builds the list of URLs still needing a successful extraction
///
/// A missing ledger means nothing failed; a missing record log means nothing
/// succeeded yet. Both degrade gracefully.
pub fn build_retry_list(ledger_path: &Path, records_path: &Path) -> Result<Vec<String>> {
    let (records, _) = read_records(records_path)?;
    let succeeded: HashSet<&str> = records
        .iter()
        .filter(|r| r.extraction_status == ExtractionStatus::Success)
        .map(|r| r.url.as_str())
        .collect();

    let mut seen = HashSet::new();
    let mut retry = Vec::new();

    if !ledger_path.exists() {
        return Ok(retry);
    }

    let reader = BufReader::new(File::open(ledger_path)?);
    for line in reader.lines() {
        let line = line?;
        let url = match line.split('\t').next() {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => continue,
        };
        if succeeded.contains(url.as_str()) {
            continue;
        }
        if seen.insert(url.clone()) {
            retry.push(url);
        }
    }

    Ok(retry)
}
