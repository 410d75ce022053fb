//! Append-only output files: the record log and the failure ledger
//!
//! Both files are shared by all extraction tasks and only ever appended to,
//! inside the driver's serialized critical section. The record log is one
//! JSON object per line; its line count doubles as the resume cursor, which
//! stays correct even when a crash lands between a write and a checkpoint.

use crate::extract::{ExtractionStatus, RecordLine};
use crate::Result;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Appends section records to the JSON Lines log
pub struct RecordWriter {
    file: File,
}

impl RecordWriter {
    /// Opens the log for appending, creating parent directories as needed
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Appends one record as a single JSON line and flushes
    pub fn append(&mut self, line: &RecordLine) -> Result<()> {
        let json = serde_json::to_string(line)?;
        writeln!(self.file, "{}", json)?;
        self.file.flush()?;
        Ok(())
    }

    /// Number of lines already in the log; this is the resume position
    pub fn count_lines(path: &Path) -> Result<usize> {
        if !path.exists() {
            return Ok(0);
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(reader.lines().count())
    }
}

/// Appends one tab-separated line per non-success record
pub struct FailureLedger {
    file: File,
}

impl FailureLedger {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Appends `url \t status \t note`, flattening whitespace in the note so
    /// one failure is always one line
    pub fn append(&mut self, url: &str, status: ExtractionStatus, note: &str) -> Result<()> {
        let note = note.replace(['\t', '\n', '\r'], " ");
        writeln!(self.file, "{}\t{}\t{}", url, status.as_str(), note)?;
        self.file.flush()?;
        Ok(())
    }
}

/// Reads every well-formed record line from a log, skipping corrupt lines
///
/// A crash can leave a partial last line behind; validation reports it
/// rather than failing the whole read.
pub fn read_records(path: &Path) -> Result<(Vec<RecordLine>, usize)> {
    let mut records = Vec::new();
    let mut malformed = 0;

    if !path.exists() {
        return Ok((records, malformed));
    }

    let reader = BufReader::new(File::open(path)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RecordLine>(&line) {
            Ok(record) => records.push(record),
            Err(_) => malformed += 1,
        }
    }

    Ok((records, malformed))
}
