//! `compose_outputs` (spec.md §4.3.8): assembles a `NewsletterContent` DTO
//! from the final `SharedState` and hands it to the Output Composer,
//! writing the resulting artifact paths back into `state.outputs`.

use std::sync::Arc;

use crate::engine::{BoxFuture, NodeFn, NodeOutcome};
use crate::error::Result as CoreResult;
use crate::nodes::context::PipelineContext;
use crate::state::SharedState;
use digestgraph_output::{ArticleRef, GlossarySection, MetricsSummary, NewsletterContent, ReviewBadge, TopicSection};

pub fn node(ctx: Arc<PipelineContext>) -> NodeFn {
    Arc::new(move |state: SharedState| {
        let ctx = Arc::clone(&ctx);
        Box::pin(run(ctx, state)) as BoxFuture<'static, CoreResult<NodeOutcome>>
    })
}

async fn run(ctx: Arc<PipelineContext>, mut state: SharedState) -> CoreResult<NodeOutcome> {
    let raw_snapshot = serde_json::to_value(&state)?;
    let knowledge_graph_json = serde_json::to_value(&state.knowledge_graph)?;

    let topics = state
        .topic_summaries
        .iter()
        .map(|summary| TopicSection {
            topic_name: summary.topic_name.clone(),
            overview: summary.overview.clone(),
            key_findings: summary.key_findings.clone(),
            notable_trends: summary.notable_trends.clone(),
            top_articles: summary
                .top_articles
                .iter()
                .map(|a| ArticleRef { title: a.title.clone(), url: a.url.clone(), source: a.source.clone(), relevance_score: a.relevance_score })
                .collect(),
            review: state.reviews.get(&summary.topic_name).map(|v| ReviewBadge {
                score: v.score,
                issues: v.issues.iter().map(|i| format!("{i:?}").to_lowercase()).collect(),
            }),
        })
        .collect();

    let glossary = state
        .knowledge_graph
        .glossary
        .iter()
        .map(|g| GlossarySection {
            term: g.term.clone(),
            entity_type_label: g.entity_type.label().to_string(),
            importance: g.importance,
            definition: g.definition.clone(),
            related: g.related.clone(),
        })
        .collect();

    let quality_by_topic = state.topic_summaries.iter().map(|s| (s.topic_name.clone(), s.quality_score)).collect();
    let relevance_distribution = relevance_buckets(&state);

    let content = NewsletterContent {
        main_topic: state.main_topic.clone(),
        generated_at: chrono::Utc::now(),
        executive_summary: state.executive_summary.clone(),
        topics,
        glossary,
        metrics: MetricsSummary {
            total_articles: state.metrics.total_articles,
            avg_quality: state.metrics.avg_quality,
            quality_by_topic,
            relevance_distribution,
        },
        run_id: state.run_id.to_string(),
    };

    let subtopics: Vec<String> = state.topics_config.iter().map(|t| t.name.clone()).collect();
    let knowledge_graph_arg = if state.knowledge_graph.entities.is_empty() { None } else { Some(&knowledge_graph_json) };

    let composed = ctx
        .output_composer
        .compose(&content, &raw_snapshot, knowledge_graph_arg, ctx.config.cover_style, &subtopics, ctx.config.enable_cover_image, ctx.config.enable_charts)
        .await
        .map_err(|e| crate::error::DigestGraphError::Config(e.to_string()))?;

    state.outputs.md_path = Some(composed.markdown_path.display().to_string());
    state.outputs.html_path = Some(composed.html_path.display().to_string());
    state.outputs.json_path = Some(composed.json_path.display().to_string());
    state.outputs.kg_path = composed.knowledge_graph_path.map(|p| p.display().to_string());
    state.outputs.cover_path = composed.cover_image_path.map(|p| p.display().to_string());
    state.outputs.flux_prompts_path = composed.image_prompt_path.map(|p| p.display().to_string());

    Ok(NodeOutcome::ok(state))
}

/// Buckets articles by relevance score into coarse labels for the
/// distribution chart (spec.md §4.9 distribution chart input).
fn relevance_buckets(state: &SharedState) -> Vec<(String, usize)> {
    let mut low = 0usize;
    let mut medium = 0usize;
    let mut high = 0usize;
    for result in state.topic_results.values() {
        for article in &result.articles {
            match article.relevance_score.unwrap_or(0.0) {
                s if s >= 0.7 => high += 1,
                s if s >= 0.4 => medium += 1,
                _ => low += 1,
            }
        }
    }
    vec![("low".to_string(), low), ("medium".to_string(), medium), ("high".to_string(), high)]
}
