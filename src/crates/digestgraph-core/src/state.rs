//! The data model (spec.md §3) and the typed `SharedState` container that
//! flows through the engine (§4.2). Mutation is serialized by the engine:
//! only the currently running node writes, and a node's writes replace its
//! owned sub-tree wholesale on retry (idempotent-at-node-granularity, per
//! §4.2).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One configured subtopic (spec.md §3). Immutable after load; `name` is
/// unique across a run (enforced by the `initialize` node).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicConfig {
    pub name: String,
    pub description: String,
    pub query: String,
    pub keywords: Vec<String>,
}

/// A candidate article retrieved by a Search Connector, validated before
/// entering state (malformed URLs are dropped at ingress, not stored here).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub relevance_score: Option<f64>,
}

impl Article {
    /// A short excerpt suitable for embedding in LLM prompts or JSON
    /// snapshots (spec.md §4.8: JSON elides article bodies beyond 500
    /// chars).
    pub fn short_content(&self, max_chars: usize) -> String {
        let text = self.content.as_deref().or(self.summary.as_deref()).unwrap_or("");
        truncate_chars(text, max_chars)
    }
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(max_chars).collect();
        s.push('\u{2026}');
        s
    }
}

/// The per-topic retrieval+filter result (spec.md §3). A topic with zero
/// usable articles is retained with `error = Some("no_articles")` and does
/// NOT fail the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicResult {
    pub topic: TopicConfig,
    /// Strictly sorted by `relevance_score` descending (testable property 3).
    pub articles: Vec<Article>,
    pub fetched_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl TopicResult {
    pub fn empty(topic: TopicConfig, error: impl Into<String>) -> Self {
        Self {
            topic,
            articles: Vec::new(),
            fetched_at: Utc::now(),
            error: Some(error.into()),
        }
    }
}

/// Narrative summary of one topic, produced by `summarize_topics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic_name: String,
    pub overview: String,
    pub key_findings: Vec<String>,
    pub notable_trends: Vec<String>,
    pub top_articles: Vec<Article>,
    pub quality_score: f64,
}

/// Issue categories a review can flag (spec.md §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReviewIssue {
    Factual,
    Relevance,
    Coverage,
    Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewVerdict {
    pub topic_name: String,
    pub score: f64,
    pub feedback: String,
    pub issues: Vec<ReviewIssue>,
}

/// Entity type vocabulary for the domain ontology (spec.md §3, §4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    CancerType,
    Treatment,
    Biomarker,
    Diagnostic,
    AiTechnology,
    ResearchConcept,
    Other,
}

impl EntityType {
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::CancerType => "cancer_type",
            EntityType::Treatment => "treatment",
            EntityType::Biomarker => "biomarker",
            EntityType::Diagnostic => "diagnostic",
            EntityType::AiTechnology => "ai_technology",
            EntityType::ResearchConcept => "research_concept",
            EntityType::Other => "other",
        }
    }
}

/// Canonical relation labels the knowledge graph can emit (spec.md §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Treats,
    Diagnoses,
    BiomarkerFor,
    Analyzes,
    Detects,
    AssociatedWith,
    UsedIn,
    Evaluates,
    Targets,
    Predicts,
    Identifies,
    Monitors,
    Classifies,
    Other,
}

/// A single entity in the knowledge graph registry, keyed by
/// `(surface_form, entity_type)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub surface_form: String,
    pub entity_type: EntityType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KGEntity {
    pub surface_form: String,
    pub entity_type: EntityType,
    pub frequency: u32,
    pub contexts: Vec<String>,
}

impl KGEntity {
    pub fn key(&self) -> EntityKey {
        EntityKey {
            surface_form: self.surface_form.clone(),
            entity_type: self.entity_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KGRelation {
    pub source: EntityKey,
    pub relation: RelationKind,
    pub target: EntityKey,
    pub evidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub entity_type: EntityType,
    pub importance: f64,
    pub definition: String,
    pub related: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeGraph {
    pub entities: Vec<KGEntity>,
    pub relations: Vec<KGRelation>,
    pub glossary: Vec<GlossaryEntry>,
}

/// Output artifacts written by `compose_outputs` (spec.md §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputPaths {
    pub html_path: Option<String>,
    pub md_path: Option<String>,
    pub json_path: Option<String>,
    pub kg_path: Option<String>,
    pub cover_path: Option<String>,
    pub charts: HashMap<String, String>,
    pub flux_prompts_path: Option<String>,
}

/// One accumulated, non-fatal error (spec.md §7: "never raise").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedError {
    pub stage: String,
    pub topic: Option<String>,
    pub message: String,
    pub retryable: bool,
    pub at: DateTime<Utc>,
}

impl RecordedError {
    pub fn new(stage: impl Into<String>, topic: Option<String>, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            stage: stage.into(),
            topic,
            message: message.into(),
            retryable,
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Metrics {
    pub total_articles: usize,
    pub avg_quality: f64,
    /// Populated by the engine's per-node timer (SPEC_FULL.md §3 expansion).
    #[serde(with = "duration_map_millis")]
    pub duration_per_stage: HashMap<String, Duration>,
}

mod duration_map_millis {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(map: &HashMap<String, Duration>, s: S) -> std::result::Result<S::Ok, S::Error> {
        let as_millis: HashMap<&String, u128> = map.iter().map(|(k, v)| (k, v.as_millis())).collect();
        as_millis.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<HashMap<String, Duration>, D::Error> {
        let as_millis: HashMap<String, u64> = HashMap::deserialize(d)?;
        Ok(as_millis.into_iter().map(|(k, v)| (k, Duration::from_millis(v))).collect())
    }
}

/// The typed record passed through every node (spec.md §3, §4.2). Created
/// empty by `SharedState::new`, progressively populated by `initialize` and
/// every node after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedState {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub main_topic: String,
    pub topics_config: Vec<TopicConfig>,
    pub topic_results: HashMap<String, TopicResult>,
    /// Ordered to match `topics_config` order (spec.md §3, §5 ordering
    /// guarantee) — NOT insertion/completion order.
    pub topic_summaries: Vec<TopicSummary>,
    pub executive_summary: String,
    pub reviews: HashMap<String, ReviewVerdict>,
    pub knowledge_graph: KnowledgeGraph,
    pub outputs: OutputPaths,
    pub errors: Vec<RecordedError>,
    pub current_stage: String,
    pub metrics: Metrics,
}

impl SharedState {
    pub fn new(main_topic: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            main_topic: main_topic.into(),
            topics_config: Vec::new(),
            topic_results: HashMap::new(),
            topic_summaries: Vec::new(),
            executive_summary: String::new(),
            reviews: HashMap::new(),
            knowledge_graph: KnowledgeGraph::default(),
            outputs: OutputPaths::default(),
            errors: Vec::new(),
            current_stage: String::new(),
            metrics: Metrics::default(),
        }
    }

    pub fn record_error(&mut self, stage: impl Into<String>, topic: Option<String>, message: impl Into<String>, retryable: bool) {
        self.errors.push(RecordedError::new(stage, topic, message, retryable));
    }

    /// Reorders `topic_summaries` to follow `topics_config` order,
    /// regardless of the completion order of the fan-out tasks that
    /// produced them (spec.md §5 ordering guarantee).
    pub fn reorder_topic_summaries(&mut self) {
        let order: HashMap<&str, usize> = self
            .topics_config
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.as_str(), i))
            .collect();
        self.topic_summaries
            .sort_by_key(|s| order.get(s.topic_name.as_str()).copied().unwrap_or(usize::MAX));
    }
}
