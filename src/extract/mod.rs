//! Extraction module: the section extractor and its driver
//!
//! The extractor is a pure transform from one rendered page to one
//! [`SectionRecord`]; the driver feeds it the discovered-URL list through the
//! fetch gate and appends the results to the record log.

mod driver;
mod record;
mod section;

pub use driver::{ExtractionDriver, ExtractionSummary};
pub use record::{
    Extraction, ExtractionStatus, Hierarchy, RecordLine, SectionHeader, SectionRecord,
};
pub use section::extract_section;
