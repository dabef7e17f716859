//! The domain ontology bundle (spec.md §4.7, §6 "Ontology bundle"): entity
//! dictionaries per type plus relationship patterns with optional trigger
//! lexemes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{EntityType, RelationKind};

/// A pair of entity types that, when co-occurring in a sentence, can form a
/// `KGRelation` (spec.md §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationPattern {
    pub source_type: EntityType,
    pub target_type: EntityType,
    pub relation: RelationKind,
    /// Lexemes whose presence between the two entity spans upgrades the
    /// relation from `associated_with` to `relation` (spec.md §4.7 step 3).
    #[serde(default)]
    pub triggers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyBundle {
    pub entity_dictionaries: HashMap<EntityType, Vec<String>>,
    pub relationship_patterns: Vec<RelationPattern>,
}

impl OntologyBundle {
    /// The built-in bundle for a cancer-oncology-and-AI newsletter, the
    /// domain spec.md's worked example targets. Ships as the default so the
    /// pipeline runs without a user-supplied ontology file.
    pub fn oncology_ai_default() -> Self {
        let mut entity_dictionaries = HashMap::new();
        entity_dictionaries.insert(
            EntityType::CancerType,
            strs(&[
                "breast cancer",
                "lung cancer",
                "non-small cell lung cancer",
                "pancreatic cancer",
                "prostate cancer",
                "colorectal cancer",
                "melanoma",
                "lymphoma",
                "leukemia",
                "glioblastoma",
                "ovarian cancer",
            ]),
        );
        entity_dictionaries.insert(
            EntityType::Treatment,
            strs(&[
                "immunotherapy",
                "chemotherapy",
                "radiotherapy",
                "radiation therapy",
                "car-t cell therapy",
                "checkpoint inhibitor",
                "targeted therapy",
                "stem cell transplant",
                "immune checkpoint blockade",
                "monoclonal antibody",
            ]),
        );
        entity_dictionaries.insert(
            EntityType::Biomarker,
            strs(&["pd-l1", "her2", "brca1", "brca2", "egfr", "kras", "tp53", "ctdna", "msi-high"]),
        );
        entity_dictionaries.insert(
            EntityType::Diagnostic,
            strs(&[
                "liquid biopsy",
                "biopsy",
                "mri",
                "ct scan",
                "pet scan",
                "genomic sequencing",
                "whole genome sequencing",
                "mammography",
                "histopathology",
            ]),
        );
        entity_dictionaries.insert(
            EntityType::AiTechnology,
            strs(&[
                "deep learning",
                "machine learning",
                "convolutional neural network",
                "large language model",
                "natural language processing",
                "computer vision",
                "foundation model",
                "transformer model",
            ]),
        );
        entity_dictionaries.insert(
            EntityType::ResearchConcept,
            strs(&[
                "clinical trial",
                "randomized controlled trial",
                "overall survival",
                "progression-free survival",
                "tumor microenvironment",
                "biomarker discovery",
                "precision oncology",
            ]),
        );

        let relationship_patterns = vec![
            pattern(EntityType::Treatment, EntityType::CancerType, RelationKind::Treats, &["treats", "treated with", "treatment for", "used to treat"]),
            pattern(EntityType::Diagnostic, EntityType::CancerType, RelationKind::Diagnoses, &["diagnoses", "diagnosed with", "detects"]),
            pattern(EntityType::Biomarker, EntityType::CancerType, RelationKind::BiomarkerFor, &["biomarker for", "marker of", "indicative of"]),
            pattern(EntityType::AiTechnology, EntityType::Diagnostic, RelationKind::Analyzes, &["analyzes", "used to analyze", "interprets"]),
            pattern(EntityType::AiTechnology, EntityType::CancerType, RelationKind::Detects, &["detects", "identifies", "flags"]),
            pattern(EntityType::AiTechnology, EntityType::CancerType, RelationKind::Predicts, &["predicts", "forecasts"]),
            pattern(EntityType::AiTechnology, EntityType::Biomarker, RelationKind::Evaluates, &["evaluates", "assesses", "quantifies"]),
            pattern(EntityType::Treatment, EntityType::Biomarker, RelationKind::Targets, &["targets", "targeted against"]),
            pattern(EntityType::AiTechnology, EntityType::ResearchConcept, RelationKind::UsedIn, &["used in", "applied to", "applied within"]),
            pattern(EntityType::Diagnostic, EntityType::Biomarker, RelationKind::Identifies, &["identifies", "reveals"]),
            pattern(EntityType::ResearchConcept, EntityType::CancerType, RelationKind::AssociatedWith, &[]),
            pattern(EntityType::Treatment, EntityType::ResearchConcept, RelationKind::AssociatedWith, &[]),
        ];

        Self { entity_dictionaries, relationship_patterns }
    }
}

fn strs(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn pattern(source_type: EntityType, target_type: EntityType, relation: RelationKind, triggers: &[&str]) -> RelationPattern {
    RelationPattern { source_type, target_type, relation, triggers: strs(triggers) }
}
