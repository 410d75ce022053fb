//! Structural field extraction from rendered section pages
//!
//! A pure transform from (HTML, URL) to one [`SectionRecord`]. The decision
//! order is fixed: the external-redirect test runs first, then the body test;
//! header fields (number, title, guid, hierarchy) are attempted regardless of
//! body success. Every rule degrades to `None` on a missing anchor; the only
//! thing that produces `parse_failure` is a wholly missing or empty body
//! container. This function never returns an error.

use crate::extract::record::{Extraction, Hierarchy, SectionHeader, SectionRecord};
use scraper::{ElementRef, Html, Selector};

/// Domains of the external publishers that Title 24 hands off to
const EXTERNAL_PUBLISHER_DOMAINS: &[&str] = &["dgs.ca.gov", "iccsafe.org", "nfpa.org"];

/// Body phrases that mark a hand-off page even without an outbound link
const REDIRECT_PHRASES: &[&str] = &[
    "redirects to",
    "external site",
    "building standards commission",
];

/// Fallback target when a hand-off page carries no matching outbound link
const DEFAULT_EXTERNAL_URL: &str = "https://www.dgs.ca.gov/BSC";

/// Path marker preceding the document GUID in section URLs
const DOCUMENT_PATH_MARKER: &str = "Document/";

/// Extracts one canonical record from a rendered section page
pub fn extract_section(html: &str, url: &str) -> SectionRecord {
    let extractor = SectionExtractor {
        document: Html::parse_document(html),
        url,
    };
    extractor.extract()
}

struct SectionExtractor<'a> {
    document: Html,
    url: &'a str,
}

impl SectionExtractor<'_> {
    fn extract(&self) -> SectionRecord {
        let header = self.header();

        if let Some(external_url) = self.external_redirect() {
            return SectionRecord::new(
                self.url,
                header,
                Extraction::ExternalRedirect {
                    external_url,
                    note: "redirects to external publisher (DGS/ICC/NFPA)".to_string(),
                },
            );
        }

        match self.body() {
            Some((text_html, text_plain)) => {
                let citation_short = self.citation_short(&header);
                SectionRecord::new(
                    self.url,
                    header,
                    Extraction::Success {
                        citation_canonical: citation_short.clone(),
                        citation_short,
                        text_html,
                        text_plain,
                        currency_notice: self.currency_notice(),
                    },
                )
            }
            None => SectionRecord::new(
                self.url,
                header,
                Extraction::ParseFailure {
                    note: "could not extract document text content".to_string(),
                },
            ),
        }
    }

    /// Header fields, attempted independently of the body
    fn header(&self) -> SectionHeader {
        let (section_number, section_title) = match self.heading_text() {
            Some(heading) => split_heading(&heading),
            None => (None, None),
        };

        SectionHeader {
            guid: self.guid(),
            section_number,
            section_title,
            hierarchy: self.hierarchy(),
        }
    }

    /// The section heading, e.g. "§ 1234. Fire exits required."
    fn heading_text(&self) -> Option<String> {
        self.select_text(".co_title")
    }

    /// Document GUID from the hidden form field, else from the URL path
    /// segment following the `Document/` marker
    fn guid(&self) -> Option<String> {
        if let Ok(selector) = Selector::parse(r#"input[name="documentGuid"]"#) {
            if let Some(element) = self.document.select(&selector).next() {
                if let Some(value) = element.value().attr("value") {
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }

        let (_, tail) = self.url.split_once(DOCUMENT_PATH_MARKER)?;
        let guid = tail.split('?').next().unwrap_or(tail);
        if guid.is_empty() {
            None
        } else {
            Some(guid.to_string())
        }
    }

    /// Short citation, e.g. "17 CCR § 1234"
    ///
    /// Read from the dedicated citation element, falling back to the expanded
    /// citation (first comma segment), falling back to synthesis from the
    /// hierarchy title number plus the section number.
    fn citation_short(&self, header: &SectionHeader) -> Option<String> {
        if let Some(cite) = self.select_text(".co_citeString") {
            return Some(cite);
        }

        if let Some(cite) = self.select_text(".co_cmdExpandedcite") {
            let first = cite.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }

        let title_number = header.hierarchy.title_number()?;
        let section_number = header.section_number.as_deref()?;
        Some(format!("{} CCR {}", title_number, section_number))
    }

    /// Hierarchy levels from the breadcrumb trail and the prelim headers
    ///
    /// The first match per level wins; later lines for the same level are
    /// ignored. "Subchapter" is tested before "Chapter" since the former
    /// contains the latter as a substring.
    fn hierarchy(&self) -> Hierarchy {
        let mut hierarchy = Hierarchy::default();

        let mut lines: Vec<String> = Vec::new();
        if let Ok(selector) = Selector::parse(".co_breadcrumb a") {
            for element in self.document.select(&selector) {
                lines.push(element.text().collect::<String>().trim().to_string());
            }
        }
        if let Ok(selector) = Selector::parse("#co_prelimContainer .co_prelimHead") {
            for element in self.document.select(&selector) {
                // Prelim headers nest annotations after the first text node.
                if let Some(first) = element.text().map(str::trim).find(|t| !t.is_empty()) {
                    lines.push(first.to_string());
                }
            }
        }

        for line in lines {
            if line.is_empty() {
                continue;
            }
            if line.starts_with("Title") {
                set_if_empty(&mut hierarchy.title, &line);
            } else if line.contains("Division") {
                set_if_empty(&mut hierarchy.division, &line);
            } else if line.contains("Subchapter") {
                set_if_empty(&mut hierarchy.subchapter, &line);
            } else if line.contains("Chapter") {
                set_if_empty(&mut hierarchy.chapter, &line);
            } else if line.contains("Article") {
                set_if_empty(&mut hierarchy.article, &line);
            }
        }

        hierarchy
    }

    /// Document body as (outer HTML, plain text), or None when the container
    /// is absent or yields no text
    fn body(&self) -> Option<(String, String)> {
        let selector = Selector::parse(".co_docText").ok()?;
        let element = self.document.select(&selector).next()?;

        let text_plain = element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text_plain.is_empty() {
            return None;
        }

        Some((element.html(), text_plain))
    }

    /// Currency notice, e.g. "Current through Register 2024, No. 1"
    fn currency_notice(&self) -> Option<String> {
        self.select_text(".co_currencyNotice")
    }

    /// Detects a hand-off to an external publisher
    ///
    /// Returns the first outbound link to a known publisher domain; when only
    /// a redirect phrase matches, returns the fixed default target.
    fn external_redirect(&self) -> Option<String> {
        if let Ok(selector) = Selector::parse("a[href]") {
            for element in self.document.select(&selector) {
                if let Some(href) = element.value().attr("href") {
                    if EXTERNAL_PUBLISHER_DOMAINS.iter().any(|d| href.contains(d)) {
                        return Some(href.to_string());
                    }
                }
            }
        }

        let page_text = self
            .document
            .root_element()
            .text()
            .collect::<String>()
            .to_lowercase();
        if REDIRECT_PHRASES.iter().any(|p| page_text.contains(p)) {
            return Some(DEFAULT_EXTERNAL_URL.to_string());
        }

        None
    }

    /// First element matching `selector`, as trimmed text, None when absent
    /// or empty
    fn select_text(&self, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        let element: ElementRef = self.document.select(&selector).next()?;
        let text = element.text().collect::<String>().trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Splits a heading like "§ 1234. Fire exits required" into number and title
/// at the first period following the section mark
///
/// Without a period the whole heading becomes the title and the number is
/// derived by pairing the section-mark token with the token after it.
fn split_heading(heading: &str) -> (Option<String>, Option<String>) {
    let heading = heading.trim();
    if heading.is_empty() {
        return (None, None);
    }

    if let Some(mark_idx) = heading.find('§') {
        if let Some(rel_dot) = heading[mark_idx..].find('.') {
            let dot_idx = mark_idx + rel_dot;
            let number = heading[..dot_idx].trim();
            let title = heading[dot_idx + 1..].trim();
            return (
                (!number.is_empty()).then(|| number.to_string()),
                (!title.is_empty()).then(|| title.to_string()),
            );
        }

        return (section_mark_pair(heading), Some(heading.to_string()));
    }

    (None, Some(heading.to_string()))
}

/// Pairs the token containing the section mark with the following token
fn section_mark_pair(heading: &str) -> Option<String> {
    let words: Vec<&str> = heading.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        if word.contains('§') {
            if let Some(next) = words.get(i + 1) {
                return Some(format!("{} {}", word, next));
            }
        }
    }
    None
}

fn set_if_empty(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::record::ExtractionStatus;

    const TEST_URL: &str =
        "https://govt.westlaw.com/calregs/Document/IABC123?viewType=FullText";

    fn section_page() -> String {
        r##"<html><body>
            <input type="hidden" name="documentGuid" value="IGUID42" />
            <div class="co_breadcrumb">
                <a href="#">Title 17. Public Health</a>
                <a href="#">Division 1. State Department of Health Services</a>
                <a href="#">Chapter 5. Sanitation</a>
                <a href="#">Subchapter 1. Engineering</a>
                <a href="#">Article 2. Drinking Water Supplies</a>
            </div>
            <div class="co_title">&#167; 1234. Fire exits required.</div>
            <div class="co_citeString">17 CCR &#167; 1234</div>
            <div class="co_docText"><p>Every building shall maintain fire exits.</p>
            <p>Exits shall be unobstructed.</p></div>
            <div class="co_currencyNotice">Current through Register 2024, No. 1</div>
        </body></html>"##
            .to_string()
    }

    #[test]
    fn test_success_extraction() {
        let record = extract_section(&section_page(), TEST_URL);
        assert_eq!(record.status(), ExtractionStatus::Success);

        assert_eq!(record.header.guid.as_deref(), Some("IGUID42"));
        assert_eq!(record.header.section_number.as_deref(), Some("§ 1234"));
        assert_eq!(
            record.header.section_title.as_deref(),
            Some("Fire exits required.")
        );

        let line = record.to_line();
        assert_eq!(line.citation_short.as_deref(), Some("17 CCR § 1234"));
        assert_eq!(line.citation_canonical.as_deref(), Some("17 CCR § 1234"));
        let plain = line.text_plain.unwrap();
        assert!(plain.contains("Every building shall maintain fire exits."));
        assert!(plain.contains("Exits shall be unobstructed."));
        assert!(line.text_html.unwrap().contains("<p>"));
        assert_eq!(
            line.currency_notice.as_deref(),
            Some("Current through Register 2024, No. 1")
        );
    }

    #[test]
    fn test_hierarchy_levels() {
        let record = extract_section(&section_page(), TEST_URL);
        let h = &record.header.hierarchy;
        assert_eq!(h.title.as_deref(), Some("Title 17. Public Health"));
        assert_eq!(
            h.division.as_deref(),
            Some("Division 1. State Department of Health Services")
        );
        assert_eq!(h.chapter.as_deref(), Some("Chapter 5. Sanitation"));
        assert_eq!(h.subchapter.as_deref(), Some("Subchapter 1. Engineering"));
        assert_eq!(
            h.article.as_deref(),
            Some("Article 2. Drinking Water Supplies")
        );
    }

    #[test]
    fn test_subchapter_not_mistaken_for_chapter() {
        let html = r##"<div class="co_breadcrumb">
            <a href="#">Subchapter 1. Engineering</a>
        </div>
        <div class="co_docText">body</div>"##;
        let record = extract_section(html, TEST_URL);
        let h = &record.header.hierarchy;
        assert_eq!(h.subchapter.as_deref(), Some("Subchapter 1. Engineering"));
        assert!(h.chapter.is_none());
    }

    #[test]
    fn test_hierarchy_first_match_per_level_wins() {
        let html = r##"<div class="co_breadcrumb">
            <a href="#">Chapter 5. Sanitation</a>
            <a href="#">Chapter 9. Later Entry</a>
        </div>
        <div class="co_docText">body</div>"##;
        let record = extract_section(html, TEST_URL);
        assert_eq!(
            record.header.hierarchy.chapter.as_deref(),
            Some("Chapter 5. Sanitation")
        );
    }

    #[test]
    fn test_hierarchy_from_prelim_headers() {
        let html = r#"<div id="co_prelimContainer">
            <div class="co_prelimHead">Title 17. Public Health<span>annotation</span></div>
            <div class="co_prelimHead">Chapter 5. Sanitation</div>
        </div>
        <div class="co_docText">body</div>"#;
        let record = extract_section(html, TEST_URL);
        let h = &record.header.hierarchy;
        assert_eq!(h.title.as_deref(), Some("Title 17. Public Health"));
        assert_eq!(h.chapter.as_deref(), Some("Chapter 5. Sanitation"));
    }

    #[test]
    fn test_external_redirect_by_link() {
        let html = r#"<html><body>
            <div class="co_title">&#167; 101. Building standards.</div>
            <p>See the California Building Standards Code.</p>
            <a href="https://www.dgs.ca.gov/BSC/Codes">Access Title 24</a>
        </body></html>"#;
        let record = extract_section(html, TEST_URL);

        assert_eq!(record.status(), ExtractionStatus::ExternalRedirect);
        let line = record.to_line();
        assert_eq!(
            line.external_url.as_deref(),
            Some("https://www.dgs.ca.gov/BSC/Codes")
        );
        assert!(line.text_plain.is_none());
        assert!(line.text_html.is_none());
        // Header fields are still attempted on the redirect branch.
        assert_eq!(line.section_number.as_deref(), Some("§ 101"));
    }

    #[test]
    fn test_external_redirect_by_phrase_uses_default_url() {
        let html = r#"<html><body>
            <p>This title redirects to an External Site maintained by the publisher.</p>
        </body></html>"#;
        let record = extract_section(html, TEST_URL);

        assert_eq!(record.status(), ExtractionStatus::ExternalRedirect);
        assert_eq!(
            record.to_line().external_url.as_deref(),
            Some(DEFAULT_EXTERNAL_URL)
        );
    }

    #[test]
    fn test_redirect_wins_over_body() {
        // Decision order: the redirect test runs before the body test.
        let html = r#"<html><body>
            <a href="https://www.iccsafe.org/codes">ICC</a>
            <div class="co_docText">some residual text</div>
        </body></html>"#;
        let record = extract_section(html, TEST_URL);
        assert_eq!(record.status(), ExtractionStatus::ExternalRedirect);
    }

    #[test]
    fn test_parse_failure_when_body_missing() {
        let html = r#"<html><body>
            <div class="co_title">&#167; 99. Orphan heading.</div>
        </body></html>"#;
        let record = extract_section(html, TEST_URL);

        assert_eq!(record.status(), ExtractionStatus::ParseFailure);
        // Header fields survive the failed body.
        assert_eq!(record.header.section_number.as_deref(), Some("§ 99"));
        assert_eq!(record.header.section_title.as_deref(), Some("Orphan heading."));
        assert!(record.note().unwrap().contains("document text"));
    }

    #[test]
    fn test_parse_failure_when_body_empty() {
        let html = r#"<div class="co_docText">   </div>"#;
        let record = extract_section(html, TEST_URL);
        assert_eq!(record.status(), ExtractionStatus::ParseFailure);
    }

    #[test]
    fn test_status_partition_is_exhaustive() {
        let pages = [
            section_page(),
            r#"<a href="https://www.nfpa.org/code">NFPA</a>"#.to_string(),
            "<html><body>nothing here</body></html>".to_string(),
        ];
        for html in &pages {
            let record = extract_section(html, TEST_URL);
            let line = record.to_line();
            match line.extraction_status {
                ExtractionStatus::Success => {
                    assert!(!line.text_plain.unwrap().is_empty());
                    assert!(line.external_url.is_none());
                }
                ExtractionStatus::ExternalRedirect => {
                    assert!(line.text_plain.is_none());
                    assert!(line.external_url.is_some());
                }
                ExtractionStatus::ParseFailure => {
                    assert!(line.text_plain.is_none());
                    assert!(line.external_url.is_none());
                }
            }
        }
    }

    #[test]
    fn test_guid_falls_back_to_url_path() {
        let html = r#"<div class="co_docText">body</div>"#;
        let record = extract_section(
            html,
            "https://govt.westlaw.com/calregs/Document/I03B54E70D4EC11DE8879F88E8B0DAAAE?viewType=FullText",
        );
        assert_eq!(
            record.header.guid.as_deref(),
            Some("I03B54E70D4EC11DE8879F88E8B0DAAAE")
        );
    }

    #[test]
    fn test_guid_none_without_marker_or_field() {
        let html = r#"<div class="co_docText">body</div>"#;
        let record = extract_section(html, "https://govt.westlaw.com/calregs/Index");
        assert!(record.header.guid.is_none());
    }

    #[test]
    fn test_heading_split_standard() {
        let (number, title) = split_heading("§ 1234. Fire exits required");
        assert_eq!(number.as_deref(), Some("§ 1234"));
        assert_eq!(title.as_deref(), Some("Fire exits required"));
    }

    #[test]
    fn test_heading_split_period_in_title_kept() {
        let (number, title) = split_heading("§ 10. Scope. Application. Intent");
        assert_eq!(number.as_deref(), Some("§ 10"));
        assert_eq!(title.as_deref(), Some("Scope. Application. Intent"));
    }

    #[test]
    fn test_heading_split_decimal_section_number() {
        // The first period after the mark splits; decimal section numbers on
        // this site are written "§ 1234.1." with the title after the final
        // period of the number-with-suffix form.
        let (number, title) = split_heading("§ 1234.1. Exit signage");
        assert_eq!(number.as_deref(), Some("§ 1234"));
        assert_eq!(title.as_deref(), Some("1. Exit signage"));
    }

    #[test]
    fn test_heading_without_period_pairs_tokens() {
        let (number, title) = split_heading("§ 500 Reserved");
        assert_eq!(number.as_deref(), Some("§ 500"));
        assert_eq!(title.as_deref(), Some("§ 500 Reserved"));
    }

    #[test]
    fn test_heading_without_mark_is_all_title() {
        let (number, title) = split_heading("Appendix A");
        assert!(number.is_none());
        assert_eq!(title.as_deref(), Some("Appendix A"));
    }

    #[test]
    fn test_citation_falls_back_to_expanded_cite() {
        let html = r#"
            <div class="co_cmdExpandedcite">17 CA ADC &#167; 1234, Barclays Official California Code</div>
            <div class="co_docText">body</div>
        "#;
        let record = extract_section(html, TEST_URL);
        assert_eq!(
            record.to_line().citation_short.as_deref(),
            Some("17 CA ADC § 1234")
        );
    }

    #[test]
    fn test_citation_synthesized_from_hierarchy() {
        let html = r##"
            <div class="co_breadcrumb"><a href="#">Title 17. Public Health</a></div>
            <div class="co_title">&#167; 1234. Fire exits required.</div>
            <div class="co_docText">body</div>
        "##;
        let record = extract_section(html, TEST_URL);
        assert_eq!(
            record.to_line().citation_short.as_deref(),
            Some("17 CCR § 1234")
        );
    }

    #[test]
    fn test_no_citation_when_nothing_available() {
        let html = r#"<div class="co_docText">body</div>"#;
        let record = extract_section(html, TEST_URL);
        assert!(record.to_line().citation_short.is_none());
    }

    #[test]
    fn test_extractor_never_panics_on_garbage() {
        let record = extract_section("<<<<not really html >>>", TEST_URL);
        assert_eq!(record.status(), ExtractionStatus::ParseFailure);
    }
}
