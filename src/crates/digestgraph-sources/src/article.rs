//! The retrieval-side `Article` DTO (spec.md §3) and ingress validation.
//!
//! Lives in this crate (rather than `digestgraph-core`) so Search
//! Connectors stay a leaf dependency with no knowledge of `SharedState`;
//! `digestgraph-core`'s `fetch_all_topics` node converts these into its own
//! `state::Article` once relevance scoring begins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
}

impl Article {
    /// Ingress validation (spec.md §7 ValidationError): a well-formed
    /// absolute URL, and at least a title or content (spec.md §4.3.2
    /// pre-filter — articles lacking both are dropped before this even
    /// runs, but a malformed URL alone is also grounds to drop).
    pub fn is_valid(&self) -> bool {
        url::Url::parse(&self.url).map(|u| u.scheme() == "http" || u.scheme() == "https").unwrap_or(false)
            && (!self.title.trim().is_empty() || self.content.as_deref().is_some_and(|c| !c.trim().is_empty()))
    }

    /// Normalized URL for cross-source dedup (spec.md §4.6 policy 3):
    /// lower-cased host+path, stripped trailing slash.
    pub fn normalized_url(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(u) => {
                let host = u.host_str().unwrap_or("").to_lowercase();
                let path = u.path().trim_end_matches('/').to_lowercase();
                format!("{host}{path}")
            }
            Err(_) => self.url.to_lowercase(),
        }
    }

    pub fn normalized_title(&self) -> String {
        self.title.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(url: &str, title: &str) -> Article {
        Article {
            title: title.to_string(),
            url: url.to_string(),
            source: None,
            content: None,
            summary: None,
            published_date: None,
        }
    }

    #[test]
    fn rejects_malformed_url() {
        assert!(!article("not-a-url", "Title").is_valid());
    }

    #[test]
    fn rejects_missing_title_and_content() {
        let mut a = article("https://example.com/a", "");
        a.content = None;
        assert!(!a.is_valid());
    }

    #[test]
    fn normalized_url_strips_trailing_slash_and_case() {
        let a = article("HTTPS://Example.COM/Path/", "t");
        assert_eq!(a.normalized_url(), "example.com/path");
    }
}
