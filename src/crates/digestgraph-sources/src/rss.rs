//! RSS/Atom retriever over a configurable fixed feed list (spec.md §4.6
//! domain sources). Feeds are fetched concurrently and filtered by query
//! keyword match plus `days_back`, since most feeds have no search endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use tracing::warn;

use crate::article::Article;
use crate::error::Result;
use crate::retriever::Retriever;

pub struct RssRetriever {
    client: reqwest::Client,
    feed_urls: Vec<String>,
}

impl RssRetriever {
    pub fn new(client: reqwest::Client, feed_urls: Vec<String>) -> Self {
        Self { client, feed_urls }
    }

    async fn fetch_feed(&self, url: &str) -> Option<Vec<Article>> {
        let body = match self.client.get(url).send().await.and_then(|r| r.error_for_status()) {
            Ok(resp) => match resp.bytes().await {
                Ok(b) => b,
                Err(e) => {
                    warn!(feed = url, error = %e, "failed reading rss feed body");
                    return None;
                }
            },
            Err(e) => {
                warn!(feed = url, error = %e, "failed fetching rss feed");
                return None;
            }
        };

        let parsed = match feed_rs::parser::parse(&body[..]) {
            Ok(p) => p,
            Err(e) => {
                warn!(feed = url, error = %e, "failed parsing rss feed");
                return None;
            }
        };

        Some(
            parsed
                .entries
                .into_iter()
                .map(|entry| {
                    let title = entry.title.map(|t| t.content).unwrap_or_default();
                    let link = entry.links.first().map(|l| l.href.clone()).unwrap_or_default();
                    let summary = entry.summary.map(|s| s.content);
                    let content = entry.content.and_then(|c| c.body).or_else(|| summary.clone());
                    let published_date: Option<DateTime<Utc>> = entry.published.or(entry.updated);
                    Article { title, url: link, source: Some(feed_host(url)), content, summary, published_date }
                })
                .collect(),
        )
    }
}

fn feed_host(url: &str) -> String {
    url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)).unwrap_or_else(|| url.to_string())
}

#[async_trait]
impl Retriever for RssRetriever {
    fn name(&self) -> &str {
        "rss"
    }

    async fn search(&self, query: &str, max_results: usize, days_back: u32) -> Result<Vec<Article>> {
        let fetches = self.feed_urls.iter().map(|u| self.fetch_feed(u));
        let fetched: Vec<Vec<Article>> = join_all(fetches).await.into_iter().flatten().collect();

        let cutoff = Utc::now() - ChronoDuration::days(days_back as i64);
        let needle = query.to_lowercase();
        let needle_terms: Vec<&str> = needle.split_whitespace().collect();

        let mut matching: Vec<Article> = fetched
            .into_iter()
            .flatten()
            .filter(|a| a.is_valid())
            .filter(|a| a.published_date.map(|d| d >= cutoff).unwrap_or(true))
            .filter(|a| {
                let haystack = format!(
                    "{} {}",
                    a.title.to_lowercase(),
                    a.content.as_deref().unwrap_or("").to_lowercase()
                );
                needle_terms.iter().any(|term| haystack.contains(term))
            })
            .collect();

        matching.sort_by(|a, b| b.published_date.cmp(&a.published_date));
        matching.truncate(max_results);
        Ok(matching)
    }
}
