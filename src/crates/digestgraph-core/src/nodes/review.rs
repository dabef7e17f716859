//! `review` (spec.md §4.3.6): scores each TopicSummary with a review
//! prompt, computes `metrics.avg_quality`, and re-summarizes once (bounded
//! retry, this stage only) any summary scoring below `review_threshold`.
//!
//! Design decision (spec.md §9 Open Question): the re-summarize retry
//! replaces the TopicSummary unconditionally once attempted — there is no
//! comparison against the original score. The spec requires exactly one
//! bounded retry "consuming one LLM call"; gating acceptance on an
//! improvement delta would require a second review call to re-score the
//! retry, which the spec does not provision for.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{BoxFuture, NodeFn, NodeOutcome};
use crate::error::Result as CoreResult;
use crate::nodes::context::PipelineContext;
use crate::nodes::summarize::summarize_one;
use crate::state::{ReviewIssue, ReviewVerdict, SharedState};
use digestgraph_llm::CompletionOptions;

pub fn node(ctx: Arc<PipelineContext>) -> NodeFn {
    Arc::new(move |state: SharedState| {
        let ctx = Arc::clone(&ctx);
        Box::pin(run(ctx, state)) as BoxFuture<'static, CoreResult<NodeOutcome>>
    })
}

async fn run(ctx: Arc<PipelineContext>, mut state: SharedState) -> CoreResult<NodeOutcome> {
    let topic_names: Vec<String> = state.topic_summaries.iter().map(|s| s.topic_name.clone()).collect();

    for topic_name in topic_names {
        let Some(index) = state.topic_summaries.iter().position(|s| s.topic_name == topic_name) else {
            continue;
        };
        let summary = state.topic_summaries[index].clone();

        let mut vars = HashMap::new();
        vars.insert("topic_name".to_string(), summary.topic_name.clone());
        vars.insert("overview".to_string(), summary.overview.clone());
        vars.insert("key_findings".to_string(), summary.key_findings.join("; "));

        let verdict = match ctx.prompts.render("reviewer", "review_summary", &vars) {
            Ok((rendered, parser)) => review_with_retry(&ctx, rendered, parser, &summary.topic_name).await,
            Err(_) => None,
        };

        let verdict = match verdict {
            Some(verdict) => verdict,
            None => {
                state.record_error("review", Some(summary.topic_name.clone()), "review_summary failed after retries, skipping review", false);
                continue;
            }
        };

        if verdict.score < ctx.config.review_threshold {
            let topic_description = state
                .topic_results
                .get(&summary.topic_name)
                .map(|r| r.topic.description.clone())
                .unwrap_or_default();
            let (mut retried, failed) = summarize_one(&ctx, summary.topic_name.clone(), topic_description, summary.top_articles.clone()).await;
            if failed {
                state.record_error("review", Some(summary.topic_name.clone()), "re-summarize retry after low review score also degraded", true);
            }
            retried.quality_score = verdict.score;
            state.topic_summaries[index] = retried;
        } else {
            state.topic_summaries[index].quality_score = verdict.score;
        }

        state.reviews.insert(summary.topic_name.clone(), verdict);
    }

    if !state.reviews.is_empty() {
        let total: f64 = state.reviews.values().map(|v| v.score).sum();
        state.metrics.avg_quality = total / state.reviews.len() as f64;
    }

    Ok(NodeOutcome::ok(state))
}

async fn review_with_retry(
    ctx: &Arc<PipelineContext>,
    rendered: digestgraph_llm::RenderedPrompt,
    parser: Box<dyn digestgraph_llm::ResponseParser>,
    topic_name: &str,
) -> Option<ReviewVerdict> {
    for _attempt in 0..3 {
        let value = ctx.gateway.complete(rendered.clone(), parser.as_ref(), CompletionOptions::default()).await.ok()?;
        let score = value.get("score").and_then(|v| v.as_f64());
        let feedback = value.get("feedback").and_then(|v| v.as_str());
        if let (Some(score), Some(feedback)) = (score, feedback) {
            let issues = value
                .get("issues")
                .and_then(|v| v.as_array())
                .map(|items| items.iter().filter_map(|v| v.as_str().and_then(parse_issue)).collect())
                .unwrap_or_default();
            return Some(ReviewVerdict { topic_name: topic_name.to_string(), score, feedback: feedback.to_string(), issues });
        }
    }
    None
}

fn parse_issue(raw: &str) -> Option<ReviewIssue> {
    match raw {
        "factual" => Some(ReviewIssue::Factual),
        "relevance" => Some(ReviewIssue::Relevance),
        "coverage" => Some(ReviewIssue::Coverage),
        "style" => Some(ReviewIssue::Style),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptRegistry;
    use crate::state::TopicSummary;
    use digestgraph_kg::{KnowledgeGraphBuilder, OntologyBundle};
    use digestgraph_llm::{ChatModel, LlmGateway, LlmGatewayConfig};
    use digestgraph_output::{CoverImageProducer, OutputComposer};
    use digestgraph_sources::{MetaRetriever, MetaRetrieverConfig};

    struct ScriptedModel {
        replies: std::sync::Mutex<Vec<&'static str>>,
    }

    #[async_trait::async_trait]
    impl ChatModel for ScriptedModel {
        async fn raw_complete(
            &self,
            _prompt: &digestgraph_llm::RenderedPrompt,
            _opts: &digestgraph_llm::CompletionOptions,
        ) -> digestgraph_llm::Result<String> {
            let mut replies = self.replies.lock().unwrap();
            Ok(if replies.is_empty() { "{}".to_string() } else { replies.remove(0).to_string() })
        }

        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn ctx(replies: Vec<&'static str>) -> Arc<PipelineContext> {
        let gateway = LlmGateway::with_model(LlmGatewayConfig::default(), Arc::new(ScriptedModel { replies: std::sync::Mutex::new(replies) }));
        Arc::new(PipelineContext::new(
            Arc::new(gateway),
            Arc::new(PromptRegistry::builtin()),
            Arc::new(MetaRetriever::new(vec![], vec![], MetaRetrieverConfig::default())),
            Arc::new(KnowledgeGraphBuilder::new(OntologyBundle::oncology_ai_default())),
            Arc::new(OutputComposer::new(std::env::temp_dir(), CoverImageProducer::new(None))),
        ))
    }

    fn summary(name: &str) -> TopicSummary {
        TopicSummary {
            topic_name: name.to_string(),
            overview: "overview".into(),
            key_findings: vec!["finding".into()],
            notable_trends: vec![],
            top_articles: vec![],
            quality_score: 0.0,
        }
    }

    #[tokio::test]
    async fn high_score_is_accepted_without_resummarizing() {
        let ctx = ctx(vec![r#"{"score": 0.9, "feedback": "solid", "issues": []}"#]);
        let mut state = SharedState::new("oncology-ai");
        state.topic_summaries = vec![summary("Trials")];

        let node_fn = node(ctx);
        let outcome = node_fn(state).await.unwrap();
        assert_eq!(outcome.state.topic_summaries[0].quality_score, 0.9);
        assert_eq!(outcome.state.topic_summaries[0].overview, "overview");
        assert!((outcome.state.metrics.avg_quality - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn low_score_triggers_one_resummarize_and_atomic_replace() {
        let ctx = ctx(vec![
            r#"{"score": 0.2, "feedback": "weak", "issues": ["coverage"]}"#,
            r#"{"overview": "Revised overview.", "key_findings": ["better finding"], "notable_trends": []}"#,
        ]);
        let mut state = SharedState::new("oncology-ai");
        state.topic_summaries = vec![summary("Trials")];

        let node_fn = node(ctx);
        let outcome = node_fn(state).await.unwrap();
        assert_eq!(outcome.state.topic_summaries[0].overview, "Revised overview.");
        assert_eq!(outcome.state.topic_summaries[0].quality_score, 0.2);
        assert_eq!(outcome.state.reviews["Trials"].issues, vec![ReviewIssue::Coverage]);
    }
}
