//! Input DTOs for output composition (spec.md §3, §4.8).
//!
//! Deliberately independent of `digestgraph-core::state`, the same leaf
//! pattern `digestgraph-sources::Article` and `digestgraph-kg::types` use:
//! the `compose_outputs` node builds a [`NewsletterContent`] from its
//! `SharedState` once composition begins, so this crate stays a leaf
//! dependency with no knowledge of the engine above it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRef {
    pub title: String,
    pub url: String,
    pub source: Option<String>,
    pub relevance_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewBadge {
    pub score: f64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSection {
    pub topic_name: String,
    pub overview: String,
    pub key_findings: Vec<String>,
    pub notable_trends: Vec<String>,
    pub top_articles: Vec<ArticleRef>,
    pub review: Option<ReviewBadge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossarySection {
    pub term: String,
    pub entity_type_label: String,
    pub importance: f64,
    pub definition: String,
    pub related: Vec<String>,
}

/// Aggregate metrics surfaced in the HTML analytics section and used to
/// drive the Chart Producer (spec.md §4.8, §4.9).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsSummary {
    pub total_articles: usize,
    pub avg_quality: f64,
    /// `(topic_name, quality_score)` in topic-config order.
    pub quality_by_topic: Vec<(String, f64)>,
    /// `(relevance_bucket_label, count)` for the distribution chart.
    pub relevance_distribution: Vec<(String, usize)>,
}

/// Everything the Output Composer needs to render Markdown, HTML, and the
/// glossary section, assembled by the `compose_outputs` node from its final
/// `SharedState` (spec.md §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterContent {
    pub main_topic: String,
    pub generated_at: DateTime<Utc>,
    pub executive_summary: String,
    pub topics: Vec<TopicSection>,
    pub glossary: Vec<GlossarySection>,
    pub metrics: MetricsSummary,
    pub run_id: String,
}

/// Placeholder used when a topic produced zero articles (spec.md §4.3.5,
/// Scenario C).
pub const NO_ARTICLES_PLACEHOLDER: &str = "No articles available for this period.";
