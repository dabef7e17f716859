//! The knowledge-graph data model (spec.md §3, §4.7).
//!
//! Deliberately independent of `digestgraph-core::state`: this crate has no
//! dependency on `digestgraph-core` so that `digestgraph-core::nodes` can
//! depend on it without a cycle. The `extract_graph` node copies these into
//! its own `state::KGEntity`/`state::KGRelation` once extraction completes,
//! the same pattern `digestgraph-sources::Article` uses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    CancerType,
    Treatment,
    Biomarker,
    Diagnostic,
    AiTechnology,
    ResearchConcept,
    Other,
}

impl EntityType {
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::CancerType => "cancer_type",
            EntityType::Treatment => "treatment",
            EntityType::Biomarker => "biomarker",
            EntityType::Diagnostic => "diagnostic",
            EntityType::AiTechnology => "ai_technology",
            EntityType::ResearchConcept => "research_concept",
            EntityType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Treats,
    Diagnoses,
    BiomarkerFor,
    Analyzes,
    Detects,
    AssociatedWith,
    UsedIn,
    Evaluates,
    Targets,
    Predicts,
    Identifies,
    Monitors,
    Classifies,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub surface_form: String,
    pub entity_type: EntityType,
}

/// One entity in the registry, keyed by `(surface_form, entity_type)`
/// (spec.md §3 uniqueness invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub surface_form: String,
    pub entity_type: EntityType,
    pub frequency: u32,
    pub contexts: Vec<String>,
    /// Populated by `KnowledgeGraphBuilder::build` (spec.md §4.7 step 4).
    pub importance: f64,
    pub in_degree: u32,
    pub out_degree: u32,
}

impl Entity {
    pub fn key(&self) -> EntityKey {
        EntityKey { surface_form: self.surface_form.clone(), entity_type: self.entity_type }
    }
}

/// `source != target` (spec.md §3 invariant). `typed = false` means the
/// relation fell back to `associated_with` for lack of a trigger lexeme
/// (spec.md §4.7 step 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub source: EntityKey,
    pub relation: RelationKind,
    pub target: EntityKey,
    pub evidence: String,
    pub typed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub entity_type: EntityType,
    pub importance: f64,
    pub definition: String,
    pub related: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeGraph {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
    /// Populated separately once glossary definitions are generated
    /// (`KnowledgeGraph::set_glossary`) — left empty by `build()` itself
    /// since definition generation is an async LLM call outside this crate.
    pub glossary: Vec<GlossaryEntry>,
}

impl KnowledgeGraph {
    pub fn entity(&self, key: &EntityKey) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.key() == key)
    }

    pub fn set_glossary(&mut self, glossary: Vec<GlossaryEntry>) {
        self.glossary = glossary;
    }

    /// Top `n` entities by `importance`, ties broken by frequency then
    /// surface form for deterministic ordering (spec.md §4.7 step 5).
    pub fn top_by_importance(&self, n: usize) -> Vec<&Entity> {
        let mut ranked: Vec<&Entity> = self.entities.iter().collect();
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.frequency.cmp(&a.frequency))
                .then_with(|| a.surface_form.cmp(&b.surface_form))
        });
        ranked.truncate(n);
        ranked
    }

    /// Top `n` neighbors of `key` by co-occurrence edge weight (spec.md
    /// §4.7: "`related` is computed as the top-3 neighbor entities in the
    /// graph by edge weight").
    pub fn top_neighbors(&self, key: &EntityKey, n: usize) -> Vec<String> {
        let mut weights: HashMap<EntityKey, u32> = HashMap::new();
        for relation in &self.relations {
            if &relation.source == key {
                *weights.entry(relation.target.clone()).or_insert(0) += 1;
            } else if &relation.target == key {
                *weights.entry(relation.source.clone()).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(EntityKey, u32)> = weights.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.surface_form.cmp(&b.0.surface_form)));
        ranked.into_iter().take(n).map(|(k, _)| k.surface_form).collect()
    }
}
