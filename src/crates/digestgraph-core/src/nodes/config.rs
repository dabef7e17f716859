//! Tunable pipeline parameters (spec.md §4.3, §6 feature flags), all with
//! the defaults the spec names explicitly.

use std::path::PathBuf;

use digestgraph_output::StylePreset;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// `fetch_all_topics`: max articles per topic (spec.md §4.3.2, default 10).
    pub max_articles_per_topic: usize,
    /// `fetch_all_topics`: recency window in days (spec.md §4.3.2, default 30).
    pub days_back: u32,
    /// `score_and_filter`: retain the top K articles by relevance (default 10).
    pub top_k: usize,
    /// `score_and_filter`: discard articles below this relevance (default 0.3).
    pub relevance_threshold: f64,
    /// `summarize_topics`: fan-out concurrency bound (spec.md §5, default 5).
    pub summarize_fan_out: usize,
    /// `review`: a summary scoring below this is re-summarized once (default 0.5).
    pub review_threshold: f64,
    /// `extract_graph`: glossary size, top N entities by importance (default 15).
    pub glossary_size: usize,
    /// Where `compose_outputs` writes artifacts.
    pub output_dir: PathBuf,
    /// Feature flags (spec.md §6 Inputs: `enable_cover_image`, `enable_charts`).
    pub enable_cover_image: bool,
    pub enable_charts: bool,
    pub cover_style: StylePreset,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_articles_per_topic: 10,
            days_back: 30,
            top_k: 10,
            relevance_threshold: 0.3,
            summarize_fan_out: 5,
            review_threshold: 0.5,
            glossary_size: 15,
            output_dir: PathBuf::from("output"),
            enable_cover_image: true,
            enable_charts: true,
            cover_style: StylePreset::Professional,
        }
    }
}
