//! Output Composer (spec.md §4.8, Component C8): writes the Markdown, HTML,
//! JSON snapshot, and knowledge-graph JSON artifacts for one run to a
//! configured output directory, timestamped so repeated runs never collide.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::chart::render_charts;
use crate::error::Result;
use crate::html::render_html;
use crate::image::{CoverImageProducer, StylePreset};
use crate::json::{elide_article_bodies, to_pretty_string};
use crate::markdown::render_markdown;
use crate::types::NewsletterContent;

/// Paths to every artifact written for one run.
#[derive(Debug, Clone)]
pub struct ComposedOutputs {
    pub markdown_path: PathBuf,
    pub html_path: PathBuf,
    pub json_path: PathBuf,
    pub knowledge_graph_path: Option<PathBuf>,
    pub cover_image_path: Option<PathBuf>,
    /// The prompt sent (or that would be sent) to the cover image API,
    /// persisted for offline regeneration (spec.md §4.3.8).
    pub image_prompt_path: Option<PathBuf>,
}

pub struct OutputComposer {
    output_dir: PathBuf,
    cover_producer: CoverImageProducer,
}

impl OutputComposer {
    pub fn new(output_dir: impl Into<PathBuf>, cover_producer: CoverImageProducer) -> Self {
        Self { output_dir: output_dir.into(), cover_producer }
    }

    /// Writes Markdown, HTML, and the elided JSON snapshot (and, if
    /// provided, the knowledge-graph JSON) under `output_dir`, with each
    /// filename stamped by `content.generated_at` (spec.md §6: distinct
    /// filenames per run, `run_results_{ts}.json` etc.).
    /// `enable_cover`/`enable_charts` correspond to the `enable_cover_image`/
    /// `enable_charts` feature flags (spec.md §6 Inputs); when false, that
    /// producer is never invoked and the corresponding output section is
    /// omitted rather than attempted and discarded.
    pub async fn compose(
        &self,
        content: &NewsletterContent,
        raw_snapshot: &Value,
        knowledge_graph: Option<&Value>,
        style: StylePreset,
        subtopics: &[String],
        enable_cover: bool,
        enable_charts: bool,
    ) -> Result<ComposedOutputs> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let stamp = timestamp_suffix(content.generated_at);

        let cover_bytes = if enable_cover {
            self.cover_producer
                .produce(style, &content.main_topic, subtopics, &content.executive_summary)
                .await
        } else {
            None
        };
        let cover_image_path = match &cover_bytes {
            Some(bytes) => {
                let path = self.output_dir.join(format!("cover_{stamp}.png"));
                tokio::fs::write(&path, bytes).await?;
                Some(path)
            }
            None => None,
        };
        let cover_base64 = cover_bytes.as_deref().map(|b| BASE64.encode(b));

        let image_prompt_path = if enable_cover {
            let prompt = self.cover_producer.prompt_for(style, &content.main_topic, subtopics, &content.executive_summary);
            let path = self.output_dir.join(format!("cover_prompt_{stamp}.txt"));
            tokio::fs::write(&path, prompt).await?;
            Some(path)
        } else {
            None
        };

        let chart_bytes = if enable_charts { render_charts(&content.metrics) } else { HashMap::new() };
        let charts_base64: HashMap<String, String> =
            chart_bytes.iter().map(|(name, bytes)| (name.clone(), BASE64.encode(bytes))).collect();

        let markdown_path = self.output_dir.join(format!("newsletter_{stamp}.md"));
        tokio::fs::write(&markdown_path, render_markdown(content)).await?;

        let html_path = self.output_dir.join(format!("newsletter_{stamp}.html"));
        let html = render_html(content, cover_base64.as_deref(), &charts_base64);
        tokio::fs::write(&html_path, html).await?;

        let json_path = self.output_dir.join(format!("run_results_{stamp}.json"));
        let elided = elide_article_bodies(raw_snapshot);
        tokio::fs::write(&json_path, to_pretty_string(&elided)?).await?;

        let knowledge_graph_path = match knowledge_graph {
            Some(kg) => {
                let path = self.output_dir.join(format!("knowledge_graph_{stamp}.json"));
                tokio::fs::write(&path, to_pretty_string(kg)?).await?;
                Some(path)
            }
            None => None,
        };

        Ok(ComposedOutputs { markdown_path, html_path, json_path, knowledge_graph_path, cover_image_path, image_prompt_path })
    }
}

fn timestamp_suffix(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn output_dir_exists(path: &Path) -> bool {
    path.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricsSummary;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_content() -> NewsletterContent {
        NewsletterContent {
            main_topic: "oncology-ai".into(),
            generated_at: Utc::now(),
            executive_summary: "Summary.".into(),
            topics: vec![],
            glossary: vec![],
            metrics: MetricsSummary::default(),
            run_id: "run-1".into(),
        }
    }

    #[tokio::test]
    async fn writes_markdown_html_and_json_without_cover_or_kg() {
        let dir = tempdir().unwrap();
        let composer = OutputComposer::new(dir.path(), CoverImageProducer::new(None));
        let snapshot = json!({"main_topic": "oncology-ai"});

        let outputs = composer
            .compose(&sample_content(), &snapshot, None, StylePreset::Professional, &[], true, true)
            .await
            .unwrap();

        assert!(tokio::fs::metadata(&outputs.markdown_path).await.is_ok());
        assert!(tokio::fs::metadata(&outputs.html_path).await.is_ok());
        assert!(tokio::fs::metadata(&outputs.json_path).await.is_ok());
        assert!(outputs.knowledge_graph_path.is_none());
        // no external image API and no system font is guaranteed in test
        // environments, but the fallback still always writes *some* PNG.
        assert!(outputs.cover_image_path.is_some());
    }

    #[tokio::test]
    async fn writes_knowledge_graph_json_when_provided() {
        let dir = tempdir().unwrap();
        let composer = OutputComposer::new(dir.path(), CoverImageProducer::new(None));
        let snapshot = json!({});
        let kg = json!({"entities": []});

        let outputs = composer
            .compose(&sample_content(), &snapshot, Some(&kg), StylePreset::Modern, &[], false, false)
            .await
            .unwrap();

        assert!(outputs.knowledge_graph_path.is_some());
        let written = tokio::fs::read_to_string(outputs.knowledge_graph_path.unwrap()).await.unwrap();
        assert!(written.contains("entities"));
    }
}
