//! JSON export of the full graph with metadata (spec.md §4.7 "Export").

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::types::{EntityType, KnowledgeGraph};

#[derive(Serialize)]
struct GraphExport<'a> {
    created_at: DateTime<Utc>,
    total_entities: usize,
    total_relations: usize,
    entities_by_type: std::collections::BTreeMap<&'static str, usize>,
    entities: &'a [crate::types::Entity],
    relations: &'a [crate::types::Relation],
    glossary: &'a [crate::types::GlossaryEntry],
}

/// Serializes `graph` to a stable-ordered JSON value (entity and relation
/// vectors are sorted first so repeated exports of the same graph are
/// byte-identical, per the round-trip idempotence property).
pub fn to_json(graph: &KnowledgeGraph, created_at: DateTime<Utc>) -> Result<serde_json::Value> {
    let mut entities = graph.entities.clone();
    entities.sort_by(|a, b| a.entity_type.cmp(&b.entity_type).then_with(|| a.surface_form.cmp(&b.surface_form)));

    let mut relations = graph.relations.clone();
    relations.sort_by(|a, b| {
        a.source
            .surface_form
            .cmp(&b.source.surface_form)
            .then_with(|| a.target.surface_form.cmp(&b.target.surface_form))
            .then_with(|| format!("{:?}", a.relation).cmp(&format!("{:?}", b.relation)))
    });

    let mut entities_by_type = std::collections::BTreeMap::new();
    for entity_type in [
        EntityType::CancerType,
        EntityType::Treatment,
        EntityType::Biomarker,
        EntityType::Diagnostic,
        EntityType::AiTechnology,
        EntityType::ResearchConcept,
        EntityType::Other,
    ] {
        let count = entities.iter().filter(|e| e.entity_type == entity_type).count();
        entities_by_type.insert(entity_type.label(), count);
    }

    let export = GraphExport {
        created_at,
        total_entities: entities.len(),
        total_relations: relations.len(),
        entities_by_type,
        entities: &entities,
        relations: &relations,
        glossary: &graph.glossary,
    };

    Ok(serde_json::to_value(export)?)
}
