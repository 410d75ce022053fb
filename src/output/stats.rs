//! Record-log validation and statistics
//!
//! Scans an existing record log and reports totals, duplicate URLs, per-status
//! counts, and field-quality figures. Run after (or during) a long extraction
//! to gauge corpus health before handing the log to the indexer.

use crate::extract::ExtractionStatus;
use crate::output::log::read_records;
use crate::Result;
use std::collections::HashSet;
use std::path::Path;

/// Summary of one pass over a record log
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Well-formed record lines
    pub total: usize,

    /// Lines that failed to parse as JSON (crash residue)
    pub malformed: usize,

    /// Distinct URLs seen
    pub unique_urls: usize,

    /// Records whose URL appeared earlier in the log
    pub duplicates: usize,

    /// Per-status counts
    pub success: usize,
    pub external_redirects: usize,
    pub parse_failures: usize,

    /// Records with no section title
    pub missing_title: usize,

    /// Success records whose text is missing or trivially short
    pub thin_text: usize,
}

impl ValidationReport {
    /// Fraction of records that extracted successfully, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.success as f64 / self.total as f64 * 100.0
    }
}

/// Validates a record log
pub fn validate_records(path: &Path) -> Result<ValidationReport> {
    let (records, malformed) = read_records(path)?;

    let mut report = ValidationReport {
        total: records.len(),
        malformed,
        ..ValidationReport::default()
    };

    let mut seen_urls = HashSet::new();

    for record in &records {
        if !seen_urls.insert(record.url.clone()) {
            report.duplicates += 1;
        }

        match record.extraction_status {
            ExtractionStatus::Success => report.success += 1,
            ExtractionStatus::ExternalRedirect => report.external_redirects += 1,
            ExtractionStatus::ParseFailure => report.parse_failures += 1,
        }

        if record.section_title.is_none() {
            report.missing_title += 1;
        }

        if record.extraction_status.is_success() {
            let thin = record
                .text_plain
                .as_deref()
                .map(|t| t.trim().len() < 10)
                .unwrap_or(true);
            if thin {
                report.thin_text += 1;
            }
        }
    }

    report.unique_urls = seen_urls.len();
    Ok(report)
}

/// Prints a validation report to stdout
pub fn print_report(report: &ValidationReport) {
    println!("=== Record Log Validation ===\n");

    println!("Records:");
    println!("  Total: {}", report.total);
    println!("  Malformed lines: {}", report.malformed);
    println!("  Unique URLs: {}", report.unique_urls);
    println!("  Duplicates: {}", report.duplicates);
    println!();

    println!("By status:");
    println!("  success: {}", report.success);
    println!("  external_redirect: {}", report.external_redirects);
    println!("  parse_failure: {}", report.parse_failures);
    println!();

    println!("Field quality:");
    println!("  Missing title: {}", report.missing_title);
    println!("  Thin/missing text on success: {}", report.thin_text);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} records)",
        report.success_rate(),
        report.success,
        report.total
    );
}
