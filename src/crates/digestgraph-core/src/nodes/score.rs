//! `score_and_filter` (spec.md §4.3.3): scores every article with the
//! `analyze_relevance` prompt, coercing non-numeric output; after 1 retry a
//! still-unparseable score becomes 0.0 and a non-retryable error is
//! recorded at article granularity. Sorts descending, retains top K above
//! `relevance_threshold`.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::engine::{BoxFuture, NodeFn, NodeOutcome};
use crate::error::Result as CoreResult;
use crate::nodes::context::PipelineContext;
use crate::state::{Article, SharedState};
use digestgraph_llm::CompletionOptions;

pub fn node(ctx: Arc<PipelineContext>) -> NodeFn {
    Arc::new(move |state: SharedState| {
        let ctx = Arc::clone(&ctx);
        Box::pin(run(ctx, state)) as BoxFuture<'static, CoreResult<NodeOutcome>>
    })
}

async fn run(ctx: Arc<PipelineContext>, mut state: SharedState) -> CoreResult<NodeOutcome> {
    let topic_names: Vec<String> = state.topic_results.keys().cloned().collect();
    let mut scored_errors: Vec<(String, String)> = Vec::new();

    for topic_name in topic_names {
        let (query, mut articles) = {
            let result = &state.topic_results[&topic_name];
            (result.topic.query.clone(), result.articles.clone())
        };
        if articles.is_empty() {
            continue;
        }

        let scored: Vec<(Article, bool)> = join_all(articles.drain(..).map(|article| score_one(&ctx, &query, article))).await;

        let mut kept = Vec::new();
        for (article, failed) in scored {
            if failed {
                scored_errors.push((topic_name.clone(), article.title.clone()));
            }
            kept.push(article);
        }

        kept.sort_by(|a, b| b.relevance_score.partial_cmp(&a.relevance_score).unwrap_or(std::cmp::Ordering::Equal));
        kept.retain(|a| a.relevance_score.unwrap_or(0.0) >= ctx.config.relevance_threshold);
        kept.truncate(ctx.config.top_k);

        if let Some(result) = state.topic_results.get_mut(&topic_name) {
            result.articles = kept;
        }
    }

    for (topic, title) in scored_errors {
        state.record_error("score_and_filter", Some(topic), format!("unparseable relevance score for '{title}'"), false);
    }

    let total_articles: usize = state.topic_results.values().map(|r| r.articles.len()).sum();
    state.metrics.total_articles = total_articles;

    Ok(NodeOutcome::ok(state))
}

/// Scores one article, retrying once on parse failure; returns
/// `(article_with_score, failed)` where `failed` means the score was
/// coerced to 0.0 after exhausting the retry (spec.md §4.3.3).
async fn score_one(ctx: &Arc<PipelineContext>, topic_query: &str, mut article: Article) -> (Article, bool) {
    let mut vars = HashMap::new();
    vars.insert("topic_query".to_string(), topic_query.to_string());
    vars.insert("article_title".to_string(), article.title.clone());
    vars.insert("article_excerpt".to_string(), article.short_content(500));

    let Ok((rendered, parser)) = ctx.prompts.render("scorer", "analyze_relevance", &vars) else {
        article.relevance_score = Some(0.0);
        return (article, true);
    };

    for _attempt in 0..2 {
        match ctx.gateway.complete(rendered.clone(), parser.as_ref(), CompletionOptions::default()).await {
            Ok(value) => {
                if let Some(score) = value.as_f64() {
                    article.relevance_score = Some(score);
                    return (article, false);
                }
            }
            Err(_) => continue,
        }
    }

    article.relevance_score = Some(0.0);
    (article, true)
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

    struct FixedScoreModel {
        replies: std::sync::Mutex<Vec<&'static str>>,
    }

    #[async_trait::async_trait]
    impl ChatModel for FixedScoreModel {
        async fn raw_complete(
            &self,
            _prompt: &digestgraph_llm::RenderedPrompt,
            _opts: &digestgraph_llm::CompletionOptions,
        ) -> digestgraph_llm::Result<String> {
            let mut replies = self.replies.lock().unwrap();
            Ok(if replies.is_empty() { "0.5".to_string() } else { replies.remove(0).to_string() })
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
            content: Some("content".into()),
            summary: None,
            published_date: None,
            relevance_score: None,
        }
    }

    fn topic(name: &str) -> TopicConfig {
        TopicConfig { name: name.to_string(), description: String::new(), query: "q".into(), keywords: vec![] }
    }

    fn ctx_with_replies(replies: Vec<&'static str>) -> Arc<PipelineContext> {
        let gateway = LlmGateway::with_model(
            LlmGatewayConfig::default(),
            Arc::new(FixedScoreModel { replies: std::sync::Mutex::new(replies) }),
        );
        Arc::new(PipelineContext::new(
            Arc::new(gateway),
            Arc::new(PromptRegistry::builtin()),
            Arc::new(MetaRetriever::new(vec![], vec![], MetaRetrieverConfig::default())),
            Arc::new(KnowledgeGraphBuilder::new(OntologyBundle::oncology_ai_default())),
            Arc::new(OutputComposer::new(std::env::temp_dir(), CoverImageProducer::new(None))),
        ))
    }

    #[tokio::test]
    async fn non_numeric_replies_score_zero_and_are_dropped_below_threshold() {
        let ctx = ctx_with_replies(vec!["very high", "very high"]);
        let mut state = SharedState::new("oncology-ai");
        state.topic_results.insert(
            "Trials".to_string(),
            TopicResult {
                topic: topic("Trials"),
                articles: vec![article("A")],
                fetched_at: chrono::Utc::now(),
                error: None,
            },
        );

        let node_fn = node(ctx);
        let outcome = node_fn(state).await.unwrap();
        assert!(outcome.state.topic_results["Trials"].articles.is_empty());
        assert!(outcome.state.errors.iter().any(|e| !e.retryable));
    }

    #[tokio::test]
    async fn articles_are_sorted_descending_by_relevance() {
        let ctx = ctx_with_replies(vec!["0.2", "0.9"]);
        let mut state = SharedState::new("oncology-ai");
        state.topic_results.insert(
            "Trials".to_string(),
            TopicResult {
                topic: topic("Trials"),
                articles: vec![article("A"), article("B")],
                fetched_at: chrono::Utc::now(),
                error: None,
            },
        );

        let node_fn = node(ctx);
        let outcome = node_fn(state).await.unwrap();
        let scores: Vec<f64> = outcome.state.topic_results["Trials"]
            .articles
            .iter()
            .map(|a| a.relevance_score.unwrap())
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }
}
