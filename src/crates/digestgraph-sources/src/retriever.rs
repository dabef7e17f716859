//! The `Retriever` trait (spec.md §4.6, Component C6): a single pluggable
//! search connector. Domain retrievers (PubMed, RSS) and the generic
//! web-search retriever all implement this; the Meta-Retriever composes
//! them.

use async_trait::async_trait;

use crate::article::Article;
use crate::error::Result;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Stable identifier used in dedup priority ordering and diagnostics
    /// (e.g. "pubmed", "rss", "websearch:brave").
    fn name(&self) -> &str;

    /// Fetch up to `max_results` articles matching `query`, published within
    /// the last `days_back` days where the source can honor that filter.
    /// A retriever that finds nothing returns `Ok(vec![])`, not an error;
    /// `Err` is reserved for the retriever itself being unreachable or
    /// misconfigured (spec.md §4.6 failure semantics: a failing retriever
    /// never fails the run, only shrinks its contribution).
    async fn search(&self, query: &str, max_results: usize, days_back: u32) -> Result<Vec<Article>>;
}
