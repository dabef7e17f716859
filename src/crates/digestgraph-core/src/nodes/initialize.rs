//! `initialize` (spec.md §4.3.1): loads topic configs, validates uniqueness
//! of `name` and non-empty `query`, fails fatally on zero topics.

use std::collections::HashSet;
use std::sync::Arc;

use crate::engine::{BoxFuture, NodeFn, NodeOutcome};
use crate::error::Result;
use crate::state::{SharedState, TopicConfig};

pub fn node(topics: Vec<TopicConfig>) -> NodeFn {
    Arc::new(move |mut state: SharedState| {
        let topics = topics.clone();
        Box::pin(async move { run(&mut state, topics) }) as BoxFuture<'static, Result<NodeOutcome>>
    })
}

fn run(state: &mut SharedState, topics: Vec<TopicConfig>) -> Result<NodeOutcome> {
    if topics.is_empty() {
        state.record_error("initialize", None, "zero topics configured", false);
        return Ok(NodeOutcome::failed(state.clone()));
    }

    let mut seen_names = HashSet::new();
    for topic in &topics {
        if topic.query.trim().is_empty() {
            state.record_error("initialize", Some(topic.name.clone()), "topic has an empty query", false);
            return Ok(NodeOutcome::failed(state.clone()));
        }
        if !seen_names.insert(topic.name.clone()) {
            state.record_error("initialize", Some(topic.name.clone()), "duplicate topic name", false);
            return Ok(NodeOutcome::failed(state.clone()));
        }
    }

    state.topics_config = topics;
    Ok(NodeOutcome::ok(state.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str, query: &str) -> TopicConfig {
        TopicConfig { name: name.to_string(), description: String::new(), query: query.to_string(), keywords: vec![] }
    }

    #[tokio::test]
    async fn zero_topics_fails_fatally() {
        let node_fn = node(vec![]);
        let outcome = node_fn(SharedState::new("oncology-ai")).await.unwrap();
        assert!(outcome.failed);
        assert!(outcome.state.errors.iter().any(|e| e.message.contains("zero topics")));
    }

    #[tokio::test]
    async fn duplicate_names_fail() {
        let node_fn = node(vec![topic("a", "q1"), topic("a", "q2")]);
        let outcome = node_fn(SharedState::new("oncology-ai")).await.unwrap();
        assert!(outcome.failed);
    }

    #[tokio::test]
    async fn valid_topics_populate_state() {
        let node_fn = node(vec![topic("a", "q1"), topic("b", "q2")]);
        let outcome = node_fn(SharedState::new("oncology-ai")).await.unwrap();
        assert!(!outcome.failed);
        assert_eq!(outcome.state.topics_config.len(), 2);
    }
}
