//! The Meta-Retriever (spec.md §4.6): composes domain and generic
//! retrievers under one policy, so Node Functions never talk to a concrete
//! `Retriever` directly.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use digestgraph_tooling::async_utils::timeout::{with_timeout, TimeoutError};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::article::Article;
use crate::error::{Result, SourceError};
use crate::retriever::Retriever;

#[derive(Debug, Clone)]
pub struct MetaRetrieverConfig {
    /// spec.md §4.6 policy 1: prefer domain retrievers when true (default).
    pub use_domain_sources: bool,
    /// Augment from the generic retriever when the domain aggregate falls
    /// below this count (default 3).
    pub min_domain_results: usize,
    /// Soft timeout per retriever; a retriever that exceeds it is skipped,
    /// not failed (spec.md §4.6 failure semantics).
    pub per_retriever_timeout: Duration,
    /// Shared-resource policy (spec.md §5): retrievers share a semaphore,
    /// default width 4.
    pub max_concurrent: usize,
}

impl Default for MetaRetrieverConfig {
    fn default() -> Self {
        Self {
            use_domain_sources: true,
            min_domain_results: 3,
            per_retriever_timeout: Duration::from_secs(10),
            max_concurrent: 4,
        }
    }
}

pub struct MetaRetriever {
    domain_retrievers: Vec<Arc<dyn Retriever>>,
    generic_retrievers: Vec<Arc<dyn Retriever>>,
    config: MetaRetrieverConfig,
    semaphore: Arc<Semaphore>,
}

impl MetaRetriever {
    pub fn new(
        domain_retrievers: Vec<Arc<dyn Retriever>>,
        generic_retrievers: Vec<Arc<dyn Retriever>>,
        config: MetaRetrieverConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self { domain_retrievers, generic_retrievers, config, semaphore }
    }

    pub async fn search(&self, query: &str, max_results: usize, days_back: u32) -> Result<Vec<Article>> {
        let mut collected: Vec<(Article, bool)> = Vec::new();
        let mut any_succeeded = false;

        if self.config.use_domain_sources && !self.domain_retrievers.is_empty() {
            let domain_results = self.run_bounded(&self.domain_retrievers, query, max_results, days_back).await;
            for (articles, succeeded) in domain_results {
                any_succeeded |= succeeded;
                collected.extend(articles.into_iter().map(|a| (a, true)));
            }

            if collected.len() < self.config.min_domain_results && !self.generic_retrievers.is_empty() {
                let generic_results =
                    self.run_bounded(&self.generic_retrievers, query, max_results, days_back).await;
                for (articles, succeeded) in generic_results {
                    any_succeeded |= succeeded;
                    collected.extend(articles.into_iter().map(|a| (a, false)));
                }
            }
        } else if !self.generic_retrievers.is_empty() {
            let generic_results = self.run_bounded(&self.generic_retrievers, query, max_results, days_back).await;
            for (articles, succeeded) in generic_results {
                any_succeeded |= succeeded;
                collected.extend(articles.into_iter().map(|a| (a, false)));
            }
        }

        if !any_succeeded && collected.is_empty() {
            return Err(SourceError::AllFailed);
        }

        Ok(dedup_and_sort(collected, max_results))
    }

    /// Runs `retrievers` concurrently, bounded by the shared semaphore, each
    /// under a soft timeout. Returns `(articles, succeeded)` per retriever; a
    /// retriever that errors or times out contributes an empty vec and
    /// `succeeded = false` without aborting the others.
    async fn run_bounded(
        &self,
        retrievers: &[Arc<dyn Retriever>],
        query: &str,
        max_results: usize,
        days_back: u32,
    ) -> Vec<(Vec<Article>, bool)> {
        let tasks = retrievers.iter().map(|retriever| {
            let retriever = Arc::clone(retriever);
            let semaphore = Arc::clone(&self.semaphore);
            let timeout = self.config.per_retriever_timeout;
            let query = query.to_string();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                match with_timeout(timeout, retriever.search(&query, max_results, days_back)).await {
                    Ok(articles) => (articles, true),
                    Err(TimeoutError::OperationFailed(err)) => {
                        warn!(retriever = retriever.name(), error = %err, "retriever failed");
                        (Vec::new(), false)
                    }
                    Err(TimeoutError::Timeout(_)) => {
                        warn!(retriever = retriever.name(), "retriever exceeded soft timeout");
                        (Vec::new(), false)
                    }
                }
            }
        });
        join_all(tasks).await
    }
}

/// spec.md §4.6 policies 3-4: dedup by (normalized URL, normalized title),
/// then sort domain-before-generic, then by recency.
fn dedup_and_sort(collected: Vec<(Article, bool)>, max_results: usize) -> Vec<Article> {
    let mut seen_urls = HashSet::new();
    let mut seen_titles = HashSet::new();
    let mut deduped: Vec<(Article, bool)> = Vec::new();

    for (article, is_domain) in collected {
        if !article.is_valid() {
            continue;
        }
        let url_key = article.normalized_url();
        let title_key = article.normalized_title();
        if seen_urls.contains(&url_key) || (!title_key.is_empty() && seen_titles.contains(&title_key)) {
            continue;
        }
        seen_urls.insert(url_key);
        if !title_key.is_empty() {
            seen_titles.insert(title_key);
        }
        deduped.push((article, is_domain));
    }

    deduped.sort_by(|(a, a_domain), (b, b_domain)| {
        b_domain.cmp(a_domain).then_with(|| b.published_date.cmp(&a.published_date))
    });

    deduped.into_iter().take(max_results).map(|(a, _)| a).collect()
}
