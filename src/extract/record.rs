//! Section record types
//!
//! The three extraction outcomes are a tagged enum rather than a bag of
//! optional fields, so a status branch cannot accidentally omit a field its
//! status requires. Records serialize to the flat JSON Lines schema consumed
//! by the downstream indexer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three-way outcome classification for a content page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Success,
    ExternalRedirect,
    ParseFailure,
}

impl ExtractionStatus {
    /// Wire form, as used in the record log and the failure ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ExternalRedirect => "external_redirect",
            Self::ParseFailure => "parse_failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Regulatory hierarchy levels, outermost first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub title: Option<String>,
    pub division: Option<String>,
    pub chapter: Option<String>,
    pub subchapter: Option<String>,
    pub article: Option<String>,
}

impl Hierarchy {
    /// Extracts the bare title number from a heading like
    /// "Title 17. Public Health"
    pub fn title_number(&self) -> Option<String> {
        let title = self.title.as_ref()?;
        let head = title.split('.').next()?;
        let number = head.trim_start_matches("Title").trim();
        if number.is_empty() {
            None
        } else {
            Some(number.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.division.is_none()
            && self.chapter.is_none()
            && self.subchapter.is_none()
            && self.article.is_none()
    }
}

/// Header fields attempted independently of body extraction
#[derive(Debug, Clone, Default)]
pub struct SectionHeader {
    pub guid: Option<String>,
    pub section_number: Option<String>,
    pub section_title: Option<String>,
    pub hierarchy: Hierarchy,
}

/// The status-discriminated part of a record
#[derive(Debug, Clone)]
pub enum Extraction {
    /// The body container yielded text; all content fields are present
    Success {
        citation_short: Option<String>,
        citation_canonical: Option<String>,
        text_html: String,
        text_plain: String,
        currency_notice: Option<String>,
    },

    /// The page hands off to an external publisher; no content fields
    ExternalRedirect { external_url: String, note: String },

    /// The body container was absent or empty; header fields may still be set
    ParseFailure { note: String },
}

/// One canonical record for one content URL
///
/// Immutable once created; appended exactly once to the record log.
#[derive(Debug, Clone)]
pub struct SectionRecord {
    pub url: String,
    pub header: SectionHeader,
    pub extraction: Extraction,
    pub extracted_at: DateTime<Utc>,
}

impl SectionRecord {
    pub fn new(url: &str, header: SectionHeader, extraction: Extraction) -> Self {
        Self {
            url: url.to_string(),
            header,
            extraction,
            extracted_at: Utc::now(),
        }
    }

    /// Record for a URL whose fetch failed outright; no page, so no header
    pub fn fetch_failure(url: &str, reason: &str) -> Self {
        Self::new(
            url,
            SectionHeader::default(),
            Extraction::ParseFailure {
                note: format!("fetch failed: {}", reason),
            },
        )
    }

    pub fn status(&self) -> ExtractionStatus {
        match &self.extraction {
            Extraction::Success { .. } => ExtractionStatus::Success,
            Extraction::ExternalRedirect { .. } => ExtractionStatus::ExternalRedirect,
            Extraction::ParseFailure { .. } => ExtractionStatus::ParseFailure,
        }
    }

    /// The extraction note, if this outcome carries one
    pub fn note(&self) -> Option<&str> {
        match &self.extraction {
            Extraction::Success { .. } => None,
            Extraction::ExternalRedirect { note, .. } => Some(note),
            Extraction::ParseFailure { note } => Some(note),
        }
    }

    /// Flattens the record into its JSON Lines wire form
    pub fn to_line(&self) -> RecordLine {
        let mut line = RecordLine {
            url: self.url.clone(),
            guid: self.header.guid.clone(),
            section_number: self.header.section_number.clone(),
            section_title: self.header.section_title.clone(),
            citation_short: None,
            citation_canonical: None,
            hierarchy: self.header.hierarchy.clone(),
            text_html: None,
            text_plain: None,
            currency_notice: None,
            extraction_status: self.status(),
            extraction_note: self.note().map(str::to_string),
            external_url: None,
            extracted_at: self.extracted_at,
        };

        match &self.extraction {
            Extraction::Success {
                citation_short,
                citation_canonical,
                text_html,
                text_plain,
                currency_notice,
            } => {
                line.citation_short = citation_short.clone();
                line.citation_canonical = citation_canonical.clone();
                line.text_html = Some(text_html.clone());
                line.text_plain = Some(text_plain.clone());
                line.currency_notice = currency_notice.clone();
            }
            Extraction::ExternalRedirect { external_url, .. } => {
                line.external_url = Some(external_url.clone());
            }
            Extraction::ParseFailure { .. } => {}
        }

        line
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_line())
    }
}

/// Flat wire form of a section record, one JSON object per log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordLine {
    pub url: String,
    pub guid: Option<String>,
    pub section_number: Option<String>,
    pub section_title: Option<String>,
    pub citation_short: Option<String>,
    pub citation_canonical: Option<String>,
    pub hierarchy: Hierarchy,
    pub text_html: Option<String>,
    pub text_plain: Option<String>,
    pub currency_notice: Option<String>,
    pub extraction_status: ExtractionStatus,
    pub extraction_note: Option<String>,
    pub external_url: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> SectionHeader {
        SectionHeader {
            guid: Some("IABC123".to_string()),
            section_number: Some("§ 1234".to_string()),
            section_title: Some("Fire exits required".to_string()),
            hierarchy: Hierarchy {
                title: Some("Title 17. Public Health".to_string()),
                ..Hierarchy::default()
            },
        }
    }

    #[test]
    fn test_success_line_has_content_fields() {
        let record = SectionRecord::new(
            "https://example.com/calregs/Document/IABC123",
            header(),
            Extraction::Success {
                citation_short: Some("17 CCR § 1234".to_string()),
                citation_canonical: Some("17 CCR § 1234".to_string()),
                text_html: "<div>text</div>".to_string(),
                text_plain: "text".to_string(),
                currency_notice: None,
            },
        );

        let line = record.to_line();
        assert_eq!(line.extraction_status, ExtractionStatus::Success);
        assert_eq!(line.text_plain.as_deref(), Some("text"));
        assert!(line.external_url.is_none());
        assert!(line.extraction_note.is_none());
    }

    #[test]
    fn test_redirect_line_has_external_url_and_no_text() {
        let record = SectionRecord::new(
            "https://example.com/calregs/Document/IT24",
            header(),
            Extraction::ExternalRedirect {
                external_url: "https://www.dgs.ca.gov/BSC".to_string(),
                note: "Title 24 redirects to external publisher".to_string(),
            },
        );

        let line = record.to_line();
        assert_eq!(line.extraction_status, ExtractionStatus::ExternalRedirect);
        assert!(line.text_html.is_none());
        assert!(line.text_plain.is_none());
        assert_eq!(line.external_url.as_deref(), Some("https://www.dgs.ca.gov/BSC"));
        assert!(line.extraction_note.is_some());
        // Header fields survive on the redirect branch.
        assert_eq!(line.section_number.as_deref(), Some("§ 1234"));
    }

    #[test]
    fn test_parse_failure_line_is_bare() {
        let record = SectionRecord::new(
            "https://example.com/calregs/Document/IBAD",
            SectionHeader::default(),
            Extraction::ParseFailure {
                note: "document body container not found".to_string(),
            },
        );

        let line = record.to_line();
        assert_eq!(line.extraction_status, ExtractionStatus::ParseFailure);
        assert!(line.text_plain.is_none());
        assert!(line.external_url.is_none());
        assert!(line.citation_short.is_none());
    }

    #[test]
    fn test_fetch_failure_is_parse_failure_with_reason() {
        let record = SectionRecord::fetch_failure("https://example.com/x", "timeout after 30000ms");
        assert_eq!(record.status(), ExtractionStatus::ParseFailure);
        assert!(record.note().unwrap().contains("timeout"));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json =
            serde_json::to_string(&ExtractionStatus::ExternalRedirect).unwrap();
        assert_eq!(json, r#""external_redirect""#);
    }

    #[test]
    fn test_line_round_trips_through_json() {
        let record = SectionRecord::new(
            "https://example.com/calregs/Document/IABC123",
            header(),
            Extraction::Success {
                citation_short: None,
                citation_canonical: None,
                text_html: "<div>t</div>".to_string(),
                text_plain: "t".to_string(),
                currency_notice: Some("Current through Register 2024, No. 1".to_string()),
            },
        );

        let json = record.to_json().unwrap();
        let parsed: RecordLine = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.url, record.url);
        assert_eq!(parsed.extraction_status, ExtractionStatus::Success);
        assert_eq!(
            parsed.currency_notice.as_deref(),
            Some("Current through Register 2024, No. 1")
        );
    }

    #[test]
    fn test_title_number_from_heading() {
        let hierarchy = Hierarchy {
            title: Some("Title 17. Public Health".to_string()),
            ..Hierarchy::default()
        };
        assert_eq!(hierarchy.title_number().as_deref(), Some("17"));
    }

    #[test]
    fn test_title_number_missing_title() {
        assert!(Hierarchy::default().title_number().is_none());
    }
}
