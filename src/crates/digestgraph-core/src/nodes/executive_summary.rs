//! `executive_summary` (spec.md §4.3.5): a single free-prose prompt over
//! all TopicSummaries, ≤500 words, no fan-out. With zero TopicSummaries
//! (Scenario C), uses the placeholder text directly rather than calling
//! the LLM at all.

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::{BoxFuture, NodeFn, NodeOutcome};
use crate::error::Result as CoreResult;
use crate::nodes::context::PipelineContext;
use crate::state::SharedState;
use digestgraph_llm::CompletionOptions;
use digestgraph_output::NO_ARTICLES_PLACEHOLDER;

pub fn node(ctx: Arc<PipelineContext>) -> NodeFn {
    Arc::new(move |state: SharedState| {
        let ctx = Arc::clone(&ctx);
        Box::pin(run(ctx, state)) as BoxFuture<'static, CoreResult<NodeOutcome>>
    })
}

async fn run(ctx: Arc<PipelineContext>, mut state: SharedState) -> CoreResult<NodeOutcome> {
    if state.topic_summaries.is_empty() {
        state.executive_summary = NO_ARTICLES_PLACEHOLDER.to_string();
        return Ok(NodeOutcome::ok(state));
    }

    let topic_names = state.topic_summaries.iter().map(|s| s.topic_name.clone()).collect::<Vec<_>>().join(", ");
    let topic_overviews = state
        .topic_summaries
        .iter()
        .map(|s| format!("{}: {}", s.topic_name, s.overview))
        .collect::<Vec<_>>()
        .join("\n");

    let mut vars = HashMap::new();
    vars.insert("topic_names".to_string(), topic_names);
    vars.insert("topic_overviews".to_string(), topic_overviews);

    let Ok((rendered, parser)) = ctx.prompts.render("editor", "executive_summary", &vars) else {
        state.executive_summary = NO_ARTICLES_PLACEHOLDER.to_string();
        return Ok(NodeOutcome::ok(state));
    };

    for _attempt in 0..3 {
        if let Ok(value) = ctx.gateway.complete(rendered.clone(), parser.as_ref(), CompletionOptions::default()).await {
            if let Some(text) = value.as_str() {
                state.executive_summary = text.to_string();
                return Ok(NodeOutcome::ok(state));
            }
        }
    }

    state.record_error("executive_summary", None, "executive summary generation failed after retries", false);
    state.executive_summary = state
        .topic_summaries
        .first()
        .map(|s| s.overview.clone())
        .unwrap_or_else(|| NO_ARTICLES_PLACEHOLDER.to_string());
    Ok(NodeOutcome::ok(state))
}
