//! `summarize_topics` (spec.md §4.3.4): fans out one `summarize_topic` call
//! per topic with ≥1 article, bounded by `summarize_fan_out` (default 5).
//! Topics with zero articles are skipped entirely — no TopicSummary is
//! produced for them (Scenario C). Topics that already carry a summary on
//! entry (state restored from a checkpoint, spec.md Scenario D) are also
//! skipped, so a resumed run only re-summarizes the topics still pending.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::json;
use tokio::sync::Semaphore;

use crate::engine::{BoxFuture, NodeFn, NodeOutcome};
use crate::error::Result as CoreResult;
use crate::nodes::context::PipelineContext;
use crate::state::{Article, SharedState, TopicSummary};
use digestgraph_llm::CompletionOptions;

pub fn node(ctx: Arc<PipelineContext>) -> NodeFn {
    Arc::new(move |state: SharedState| {
        let ctx = Arc::clone(&ctx);
        Box::pin(run(ctx, state)) as BoxFuture<'static, CoreResult<NodeOutcome>>
    })
}

async fn run(ctx: Arc<PipelineContext>, mut state: SharedState) -> CoreResult<NodeOutcome> {
    let semaphore = Arc::new(Semaphore::new(ctx.config.summarize_fan_out.max(1)));
    let already_summarized: HashSet<&str> = state.topic_summaries.iter().map(|s| s.topic_name.as_str()).collect();

    let mut tasks = FuturesUnordered::new();
    for result in state.topic_results.values() {
        if result.articles.is_empty() || already_summarized.contains(result.topic.name.as_str()) {
            continue;
        }
        let ctx = Arc::clone(&ctx);
        let semaphore = Arc::clone(&semaphore);
        let topic_name = result.topic.name.clone();
        let topic_description = result.topic.description.clone();
        let articles = result.articles.clone();
        tasks.push(async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            summarize_one(&ctx, topic_name, topic_description, articles).await
        });
    }

    while let Some((summary, failed_parse)) = tasks.next().await {
        if failed_parse {
            state.record_error("summarize_topics", Some(summary.topic_name.clone()), "summarize_topic parse failed after retries, using degraded summary", false);
        }
        state.topic_summaries.push(summary);
    }

    state.reorder_topic_summaries();
    Ok(NodeOutcome::ok(state))
}

/// Returns `(summary, degraded)` where `degraded` marks the §4.3.4 fallback
/// path: overview is best-effort cleaned text, key_findings empty,
/// quality_score 0.
/// spec.md §3: `TopicSummary.top_articles` holds at most this many entries.
const TOP_ARTICLES_LIMIT: usize = 5;

pub(crate) async fn summarize_one(
    ctx: &Arc<PipelineContext>,
    topic_name: String,
    topic_description: String,
    articles: Vec<Article>,
) -> (TopicSummary, bool) {
    let articles_json = json!(articles
        .iter()
        .map(|a| json!({
            "title": a.title,
            "source": a.source,
            "content": a.short_content(500),
            "relevance": a.relevance_score.unwrap_or(0.0),
        }))
        .collect::<Vec<_>>())
    .to_string();

    let mut vars = HashMap::new();
    vars.insert("topic_name".to_string(), topic_name.clone());
    vars.insert("topic_description".to_string(), topic_description);
    vars.insert("articles_json".to_string(), articles_json);

    let rendered = match ctx.prompts.render("summarizer", "summarize_topic", &vars) {
        Ok(rendered) => rendered,
        Err(_) => return (degraded_summary(topic_name, "", articles), true),
    };
    let (rendered_prompt, parser) = rendered;

    for _attempt in 0..3 {
        match ctx.gateway.complete(rendered_prompt.clone(), parser.as_ref(), CompletionOptions::default()).await {
            Ok(value) => {
                let overview = value.get("overview").and_then(|v| v.as_str());
                if let Some(overview) = overview {
                    let key_findings = value
                        .get("key_findings")
                        .and_then(|v| v.as_array())
                        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                        .unwrap_or_default();
                    let notable_trends = value
                        .get("notable_trends")
                        .and_then(|v| v.as_array())
                        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                        .unwrap_or_default();
                    return (
                        TopicSummary {
                            topic_name,
                            overview: overview.to_string(),
                            key_findings,
                            notable_trends,
                            top_articles: articles.into_iter().take(TOP_ARTICLES_LIMIT).collect(),
                            quality_score: 0.0,
                        },
                        false,
                    );
                }
            }
            Err(_) => continue,
        }
    }

    let fallback_text = articles.first().and_then(|a| a.content.clone()).unwrap_or_default();
    (degraded_summary(topic_name, &fallback_text, articles), true)
}

fn degraded_summary(topic_name: String, raw_text: &str, articles: Vec<Article>) -> TopicSummary {
    TopicSummary {
        topic_name,
        overview: crate::state::truncate_chars(raw_text.trim(), 500),
        key_findings: Vec::new(),
        notable_trends: Vec::new(),
        top_articles: articles.into_iter().take(TOP_ARTICLES_LIMIT).collect(),
        quality_score: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptRegistry;
    use crate::state::{TopicConfig, TopicResult};
    use digestgraph_kg::{KnowledgeGraphBuilder, OntologyBundle};
    use digestgraph_llm::{ChatModel, LlmGateway, LlmGatewayConfig};
    use digestgraph_output::{CoverImageProducer, OutputComposer};
    use digestgraph_sources::{MetaRetriever, MetaRetrieverConfig};

    struct FixedModel {
        replies: std::sync::Mutex<Vec<&'static str>>,
    }

    #[async_trait::async_trait]
    impl ChatModel for FixedModel {
        async fn raw_complete(
            &self,
            _prompt: &digestgraph_llm::RenderedPrompt,
            _opts: &digestgraph_llm::CompletionOptions,
        ) -> digestgraph_llm::Result<String> {
            let mut replies = self.replies.lock().unwrap();
            Ok(if replies.is_empty() { "gibberish".to_string() } else { replies.remove(0).to_string() })
        }

        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    fn article(title: &str) -> Article {
        Article {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            source: None,
            content: Some("some content".into()),
            summary: None,
            published_date: None,
            relevance_score: Some(0.9),
        }
    }

    fn topic(name: &str) -> TopicConfig {
        TopicConfig { name: name.to_string(), description: "desc".into(), query: "q".into(), keywords: vec![] }
    }

    fn ctx_with_replies(replies: Vec<&'static str>) -> Arc<PipelineContext> {
        let gateway = LlmGateway::with_model(LlmGatewayConfig::default(), Arc::new(FixedModel { replies: std::sync::Mutex::new(replies) }));
        Arc::new(PipelineContext::new(
            Arc::new(gateway),
            Arc::new(PromptRegistry::builtin()),
            Arc::new(MetaRetriever::new(vec![], vec![], MetaRetrieverConfig::default())),
            Arc::new(KnowledgeGraphBuilder::new(OntologyBundle::oncology_ai_default())),
            Arc::new(OutputComposer::new(std::env::temp_dir(), CoverImageProducer::new(None))),
        ))
    }

    fn state_with_topic(name: &str, articles: Vec<Article>) -> SharedState {
        let mut state = SharedState::new("oncology-ai");
        state.topics_config = vec![topic(name)];
        state.topic_results.insert(
            name.to_string(),
            TopicResult { topic: topic(name), articles, fetched_at: chrono::Utc::now(), error: None },
        );
        state
    }

    #[tokio::test]
    async fn topics_with_no_articles_produce_no_summary() {
        let ctx = ctx_with_replies(vec![]);
        let mut state = SharedState::new("oncology-ai");
        state.topics_config = vec![topic("Empty")];
        state.topic_results.insert("Empty".to_string(), TopicResult::empty(topic("Empty"), "no_articles"));

        let node_fn = node(ctx);
        let outcome = node_fn(state).await.unwrap();
        assert!(outcome.state.topic_summaries.is_empty());
    }

    #[tokio::test]
    async fn valid_json_response_produces_a_summary() {
        let ctx = ctx_with_replies(vec![r#"{"overview": "An overview.", "key_findings": ["finding one"], "notable_trends": []}"#]);
        let state = state_with_topic("Trials", vec![article("A")]);

        let node_fn = node(ctx);
        let outcome = node_fn(state).await.unwrap();
        assert_eq!(outcome.state.topic_summaries.len(), 1);
        assert_eq!(outcome.state.topic_summaries[0].overview, "An overview.");
        assert_eq!(outcome.state.topic_summaries[0].key_findings, vec!["finding one".to_string()]);
    }

    #[tokio::test]
    async fn top_articles_are_truncated_to_five() {
        let ctx = ctx_with_replies(vec![r#"{"overview": "An overview.", "key_findings": [], "notable_trends": []}"#]);
        let articles: Vec<Article> = (0..10).map(|i| article(&format!("A{i}"))).collect();
        let state = state_with_topic("Trials", articles);

        let node_fn = node(ctx);
        let outcome = node_fn(state).await.unwrap();
        assert_eq!(outcome.state.topic_summaries[0].top_articles.len(), 5);
    }

    #[tokio::test]
    async fn already_summarized_topics_are_skipped() {
        let ctx = ctx_with_replies(vec!["garbage"]);
        let mut state = SharedState::new("oncology-ai");
        state.topics_config = vec![topic("Done"), topic("Pending")];
        state.topic_results.insert("Done".to_string(), TopicResult { topic: topic("Done"), articles: vec![article("A")], fetched_at: chrono::Utc::now(), error: None });
        state.topic_results.insert("Pending".to_string(), TopicResult { topic: topic("Pending"), articles: vec![article("B")], fetched_at: chrono::Utc::now(), error: None });
        state.topic_summaries.push(TopicSummary {
            topic_name: "Done".to_string(),
            overview: "already summarized".to_string(),
            key_findings: vec![],
            notable_trends: vec![],
            top_articles: vec![],
            quality_score: 1.0,
        });

        let node_fn = node(ctx);
        let outcome = node_fn(state).await.unwrap();
        assert_eq!(outcome.state.topic_summaries.len(), 2);
        let done = outcome.state.topic_summaries.iter().find(|s| s.topic_name == "Done").unwrap();
        assert_eq!(done.overview, "already summarized");
    }

    #[tokio::test]
    async fn unparseable_response_after_retries_degrades_gracefully() {
        let ctx = ctx_with_replies(vec!["garbage", "garbage", "garbage"]);
        let state = state_with_topic("Trials", vec![article("A")]);

        let node_fn = node(ctx);
        let outcome = node_fn(state).await.unwrap();
        assert_eq!(outcome.state.topic_summaries.len(), 1);
        assert_eq!(outcome.state.topic_summaries[0].quality_score, 0.0);
        assert!(outcome.state.topic_summaries[0].key_findings.is_empty());
        assert!(outcome.state.errors.iter().any(|e| !e.retryable));
    }
}
