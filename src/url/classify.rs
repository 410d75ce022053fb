use crate::config::SiteConfig;
use url::Url;

/// Classification of a discovered link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkClass {
    /// A browse/index page whose links feed back into the BFS queue
    Navigation,
    /// A section document page holding one record worth of content
    Content,
    /// Outside the crawl scope, or an in-scope page of neither kind
    Ignored,
}

/// Classifies normalized URLs into navigation, content, and ignored links
///
/// Classification is purely path-pattern based. Navigation wins over content
/// when a path matches both patterns, so a document link nested under a
/// browse path keeps feeding the queue rather than being emitted twice.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    link_scope: String,
    navigation_marker: String,
    index_suffix: String,
    content_marker: String,
}

impl LinkClassifier {
    /// Creates a classifier from the site configuration
    pub fn new(site: &SiteConfig) -> Self {
        Self {
            link_scope: site.link_scope.clone(),
            navigation_marker: site.navigation_marker.clone(),
            index_suffix: site.index_suffix.clone(),
            content_marker: site.content_marker.clone(),
        }
    }

    /// Classifies a normalized URL
    pub fn classify(&self, url: &Url) -> LinkClass {
        let path = url.path();

        if !path.contains(&self.link_scope) {
            return LinkClass::Ignored;
        }

        if path.contains(&self.navigation_marker) || path.ends_with(&self.index_suffix) {
            return LinkClass::Navigation;
        }

        if path.contains(&self.content_marker) {
            return LinkClass::Content;
        }

        LinkClass::Ignored
    }
}
