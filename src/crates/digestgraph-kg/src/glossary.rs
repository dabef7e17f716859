//! Glossary generation (spec.md §4.7 "Glossary generation"): for each of the
//! top-N entities by importance, ask a [`TermDefiner`] for a short
//! definition, falling back to a templated one on repeated parse failure.
//!
//! Definition generation is an async LLM call, and the Prompt Registry it
//! needs lives in `digestgraph-core` — which depends on this crate. Taking
//! `TermDefiner` as a parameter (rather than owning a gateway/registry here)
//! keeps this crate a leaf with no dependency on `digestgraph-core` or
//! `digestgraph-llm`, so `digestgraph-core::nodes` can depend on it without
//! a cycle.

use async_trait::async_trait;

use crate::types::{Entity, EntityType, GlossaryEntry, KnowledgeGraph};

#[async_trait]
pub trait TermDefiner: Send + Sync {
    /// Returns `(definition, related_terms)`. `contexts` holds up to 3
    /// excerpts (spec.md §4.7) and `domain` is the run's `main_topic`.
    async fn define(&self, term: &str, entity_type: EntityType, contexts: &[String], domain: &str) -> Option<(String, Vec<String>)>;
}

/// Builds glossary entries for the top `n` entities by importance. `domain`
/// is used both as the LLM prompt's `domain` variable and in the templated
/// fallback string.
pub async fn build_glossary(graph: &KnowledgeGraph, n: usize, definer: &dyn TermDefiner, domain: &str) -> Vec<GlossaryEntry> {
    let top = graph.top_by_importance(n);
    let mut entries = Vec::with_capacity(top.len());

    for entity in top {
        let contexts: Vec<String> = entity.contexts.iter().take(3).cloned().collect();
        let definition = match definer.define(&entity.surface_form, entity.entity_type, &contexts, domain).await {
            Some((definition, _related)) => definition,
            None => templated_fallback(entity, domain),
        };
        // spec.md §4.7: `related` is always the top-3 neighbor entities in
        // the graph by edge weight, independent of whether the definer call
        // above succeeded.
        let related = graph.top_neighbors(&entity.key(), 3);

        entries.push(GlossaryEntry {
            term: entity.surface_form.clone(),
            entity_type: entity.entity_type,
            importance: entity.importance,
            definition,
            related,
        });
    }
    entries
}

fn templated_fallback(entity: &Entity, domain: &str) -> String {
    format!("{} — a {} observed in contexts of {}.", entity.surface_form, entity.entity_type.label(), domain)
}
