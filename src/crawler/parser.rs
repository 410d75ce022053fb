//! Hyperlink extraction from rendered navigation pages
//!
//! Only `<a href>` links are considered; the target site's browse pages are
//! plain anchor lists once rendered. Links are resolved against the page's
//! own URL and pre-filtered to the crawl scope; classification into
//! navigation/content happens later against the normalized form.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts in-scope absolute links from HTML, first-seen order, deduplicated
///
/// # Arguments
///
/// * `html` - The rendered page content
/// * `base_url` - The page's own URL, for resolving relative links
/// * `scope` - Substring every kept link must contain (e.g. `/calregs/`)
pub fn extract_links(html: &str, base_url: &Url, scope: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, base_url) {
                    if absolute.contains(scope) && seen.insert(absolute.clone()) {
                        links.push(absolute);
                    }
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - anything that is not HTTP(S) after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
