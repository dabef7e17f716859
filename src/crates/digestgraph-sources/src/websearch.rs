//! Generic web-search retriever (spec.md §4.6 fallback/augmentation source).
//! Credentials are only required the first time `search` actually runs, in
//! keeping with the lazy-gateway redesign flag spec.md §9 applies elsewhere
//! in the pipeline.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::article::Article;
use crate::dateparse::parse_permissive;
use crate::error::{Result, SourceError};
use crate::retriever::Retriever;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProvider {
    Brave,
    Serper,
}

impl SearchProvider {
    fn endpoint(self) -> &'static str {
        match self {
            SearchProvider::Brave => "https://api.search.brave.com/res/v1/news/search",
            SearchProvider::Serper => "https://google.serper.dev/news",
        }
    }
}

pub struct WebSearchRetriever {
    client: reqwest::Client,
    provider: SearchProvider,
    api_key: String,
}

impl WebSearchRetriever {
    pub fn new(client: reqwest::Client, provider: SearchProvider, api_key: impl Into<String>) -> Self {
        Self { client, provider, api_key: api_key.into() }
    }

    async fn query_brave(&self, query: &str, count: usize) -> Result<Vec<Article>> {
        #[derive(Deserialize)]
        struct BraveResponse {
            #[serde(default)]
            results: Vec<BraveResult>,
        }
        #[derive(Deserialize)]
        struct BraveResult {
            title: String,
            url: String,
            #[serde(default)]
            description: Option<String>,
            #[serde(default)]
            age: Option<String>,
        }

        let response = self
            .client
            .get(self.provider.endpoint())
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", &count.to_string())])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| SourceError::Retriever { source_name: "websearch:brave".into(), message: e.to_string() })?
            .json::<BraveResponse>()
            .await?;

        Ok(response
            .results
            .into_iter()
            .map(|r| Article {
                title: r.title,
                url: r.url,
                source: Some("websearch:brave".to_string()),
                content: r.description.clone(),
                summary: r.description,
                published_date: r.age.and_then(|a| parse_permissive(&a)),
            })
            .collect())
    }

    async fn query_serper(&self, query: &str, count: usize) -> Result<Vec<Article>> {
        #[derive(Deserialize)]
        struct SerperResponse {
            #[serde(default)]
            news: Vec<SerperResult>,
        }
        #[derive(Deserialize)]
        struct SerperResult {
            title: String,
            link: String,
            #[serde(default)]
            snippet: Option<String>,
            #[serde(default)]
            date: Option<String>,
        }

        let response = self
            .client
            .post(self.provider.endpoint())
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query, "num": count }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| SourceError::Retriever { source_name: "websearch:serper".into(), message: e.to_string() })?
            .json::<SerperResponse>()
            .await?;

        Ok(response
            .news
            .into_iter()
            .map(|r| Article {
                title: r.title,
                url: r.link,
                source: Some("websearch:serper".to_string()),
                content: r.snippet.clone(),
                summary: r.snippet,
                published_date: r.date.and_then(|d| parse_permissive(&d)),
            })
            .collect())
    }
}

#[async_trait]
impl Retriever for WebSearchRetriever {
    fn name(&self) -> &str {
        match self.provider {
            SearchProvider::Brave => "websearch:brave",
            SearchProvider::Serper => "websearch:serper",
        }
    }

    async fn search(&self, query: &str, max_results: usize, _days_back: u32) -> Result<Vec<Article>> {
        if self.api_key.trim().is_empty() {
            return Err(SourceError::Retriever {
                source_name: self.name().to_string(),
                message: "no API key configured".to_string(),
            });
        }
        debug!(provider = self.name(), "issuing web search query");
        let articles = match self.provider {
            SearchProvider::Brave => self.query_brave(query, max_results).await?,
            SearchProvider::Serper => self.query_serper(query, max_results).await?,
        };
        Ok(articles.into_iter().filter(|a| a.is_valid()).take(max_results).collect())
    }
}
