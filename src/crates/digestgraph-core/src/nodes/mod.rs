//! Node Functions (spec.md §4.3): one submodule per pipeline stage, each
//! exposing a `node(ctx) -> NodeFn` constructor, plus [`build_pipeline`]
//! which wires them into the DAG named in spec.md §4 ("The DAG is:
//! `initialize → fetch_all_topics → score_and_filter → summarize_topics
//! (fan-out/fan-in) → executive_summary → review → extract_graph →
//! compose_outputs`").

pub mod compose_outputs;
pub mod config;
pub mod context;
pub mod executive_summary;
pub mod extract_graph;
pub mod fetch;
pub mod finalize;
pub mod initialize;
pub mod review;
pub mod score;
pub mod summarize;

pub use config::PipelineConfig;
pub use context::PipelineContext;

use std::sync::Arc;

use crate::engine::{NodePolicy, WorkflowEngine};
use crate::state::TopicConfig;

const FINALIZE_ON_FAILURE: &str = "finalize_on_failure";

/// Wires every node into the DAG and returns a ready-to-run engine. Takes
/// `topics` separately from `ctx` since `initialize` (spec.md §4.3.1) is
/// parameterized by the run's topic configuration rather than a leaf
/// service.
pub fn build_pipeline(ctx: &Arc<PipelineContext>, topics: Vec<TopicConfig>) -> WorkflowEngine {
    let mut engine = WorkflowEngine::new();

    engine.set_start("initialize");
    engine.register_node("initialize", initialize::node(topics), NodePolicy::fatal());
    engine.register_node("fetch_all_topics", fetch::node(Arc::clone(ctx)), NodePolicy::default());
    engine.register_node("score_and_filter", score::node(Arc::clone(ctx)), NodePolicy::default());
    engine.register_node("summarize_topics", summarize::node(Arc::clone(ctx)), NodePolicy::default());
    engine.register_node("executive_summary", executive_summary::node(Arc::clone(ctx)), NodePolicy::default());
    engine.register_node("review", review::node(Arc::clone(ctx)), NodePolicy::default());
    engine.register_node("extract_graph", extract_graph::node(Arc::clone(ctx)), NodePolicy::default());
    engine.register_node("compose_outputs", compose_outputs::node(Arc::clone(ctx)), NodePolicy::default());
    engine.register_node(FINALIZE_ON_FAILURE, finalize::node(Arc::clone(ctx)), NodePolicy::default());

    engine.add_edge("initialize", "fetch_all_topics");
    engine.add_edge("fetch_all_topics", "score_and_filter");
    engine.add_edge("score_and_filter", "summarize_topics");
    engine.add_edge("summarize_topics", "executive_summary");
    engine.add_edge("executive_summary", "review");
    engine.add_edge("review", "extract_graph");
    engine.add_edge("extract_graph", "compose_outputs");

    engine.add_conditional_edge(
        "initialize",
        Arc::new(|_state| FINALIZE_ON_FAILURE.to_string()),
        vec![FINALIZE_ON_FAILURE.to_string()],
    );

    engine
}
