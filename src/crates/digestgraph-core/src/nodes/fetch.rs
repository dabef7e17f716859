//! `fetch_all_topics` (spec.md §4.3.2): invokes the Meta-Retriever per
//! topic, pre-filters articles lacking both title and content, and retains
//! a topic with zero usable articles as `error = Some("no_articles")`
//! rather than failing the run.

use std::sync::Arc;

use futures::future::join_all;

use crate::engine::{BoxFuture, NodeFn, NodeOutcome};
use crate::error::Result;
use crate::nodes::context::PipelineContext;
use crate::state::{Article, SharedState, TopicResult};

pub fn node(ctx: Arc<PipelineContext>) -> NodeFn {
    Arc::new(move |state: SharedState| {
        let ctx = Arc::clone(&ctx);
        Box::pin(run(ctx, state)) as BoxFuture<'static, Result<NodeOutcome>>
    })
}

async fn run(ctx: Arc<PipelineContext>, mut state: SharedState) -> Result<NodeOutcome> {
    let topics = state.topics_config.clone();
    let max_articles = ctx.config.max_articles_per_topic;
    let days_back = ctx.config.days_back;

    let tasks = topics.into_iter().map(|topic| {
        let retriever = Arc::clone(&ctx.meta_retriever);
        async move {
            let result = retriever.search(&topic.query, max_articles, days_back).await;
            (topic, result)
        }
    });

    for (topic, result) in join_all(tasks).await {
        match result {
            Ok(articles) if !articles.is_empty() => {
                let mut articles: Vec<Article> = articles
                    .into_iter()
                    .filter(|a| !a.title.trim().is_empty() || a.content.as_deref().is_some_and(|c| !c.trim().is_empty()))
                    .map(|a| Article {
                        title: a.title,
                        url: a.url,
                        source: a.source,
                        content: a.content,
                        summary: a.summary,
                        published_date: a.published_date,
                        relevance_score: None,
                    })
                    .collect();
                articles.sort_by(|a, b| b.published_date.cmp(&a.published_date));

                if articles.is_empty() {
                    state.topic_results.insert(topic.name.clone(), TopicResult::empty(topic, "no_articles"));
                } else {
                    state.topic_results.insert(
                        topic.name.clone(),
                        TopicResult { topic, articles, fetched_at: chrono::Utc::now(), error: None },
                    );
                }
            }
            Ok(_) => {
                state.topic_results.insert(topic.name.clone(), TopicResult::empty(topic, "no_articles"));
            }
            Err(err) => {
                state.record_error("fetch_all_topics", Some(topic.name.clone()), err.to_string(), false);
                state.topic_results.insert(topic.name.clone(), TopicResult::empty(topic, "no_articles"));
            }
        }
    }

    Ok(NodeOutcome::ok(state))
}
