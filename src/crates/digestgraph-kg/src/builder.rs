//! The Domain Knowledge Graph builder (spec.md §4.7): dictionary entity
//! extraction, relation inference, and centrality scoring over free text.

use std::collections::HashMap;

use crate::ontology::OntologyBundle;
use crate::segment::segment_sentences;
use crate::types::{Entity, EntityKey, EntityType, KnowledgeGraph, Relation, RelationKind};

/// Context excerpts kept per entity are capped so a frequently-mentioned
/// term doesn't grow the export file unboundedly.
const MAX_CONTEXTS_PER_ENTITY: usize = 10;

pub struct KnowledgeGraphBuilder {
    bundle: OntologyBundle,
    sorted_terms: Vec<DictionaryTerm>,
}

struct DictionaryTerm {
    tokens: Vec<String>,
    entity_type: EntityType,
    canonical: String,
}

struct Token {
    text_lower: String,
    start: usize,
    end: usize,
}

impl KnowledgeGraphBuilder {
    pub fn new(bundle: OntologyBundle) -> Self {
        let mut sorted_terms = Vec::new();
        for (entity_type, terms) in &bundle.entity_dictionaries {
            for term in terms {
                let tokens: Vec<String> = tokenize_term(term);
                if tokens.is_empty() {
                    continue;
                }
                sorted_terms.push(DictionaryTerm { tokens, entity_type: *entity_type, canonical: term.to_lowercase() });
            }
        }
        // Longest-match-wins (spec.md §4.7): multi-word terms first, then by
        // character length within the same word count.
        sorted_terms.sort_by(|a, b| {
            b.tokens.len().cmp(&a.tokens.len()).then_with(|| b.canonical.len().cmp(&a.canonical.len()))
        });
        Self { bundle, sorted_terms }
    }

    /// Runs the full build procedure (spec.md §4.7 steps 1-4) over `text`.
    /// Leaves `glossary` empty; generating definitions requires an LLM call
    /// and is orchestrated by the caller (see crate docs).
    pub fn build(&self, text: &str) -> KnowledgeGraph {
        let sentences = segment_sentences(text);

        let mut registry: HashMap<EntityKey, Entity> = HashMap::new();
        let mut relations: HashMap<(EntityKey, EntityKey, RelationKind), Relation> = HashMap::new();

        for sentence in &sentences {
            let tokens = tokenize_sentence(sentence);
            let occurrences = self.match_entities(&tokens);

            for occurrence in &occurrences {
                let key = EntityKey { surface_form: occurrence.canonical.clone(), entity_type: occurrence.entity_type };
                let entry = registry.entry(key.clone()).or_insert_with(|| Entity {
                    surface_form: occurrence.canonical.clone(),
                    entity_type: occurrence.entity_type,
                    frequency: 0,
                    contexts: Vec::new(),
                    importance: 0.0,
                    in_degree: 0,
                    out_degree: 0,
                });
                entry.frequency += 1;
                if entry.contexts.len() < MAX_CONTEXTS_PER_ENTITY {
                    entry.contexts.push(sentence.clone());
                }
            }

            for i in 0..occurrences.len() {
                for j in 0..occurrences.len() {
                    if i == j {
                        continue;
                    }
                    let a = &occurrences[i];
                    let b = &occurrences[j];
                    if a.canonical == b.canonical && a.entity_type == b.entity_type {
                        continue;
                    }
                    let Some(found) = self
                        .bundle
                        .relationship_patterns
                        .iter()
                        .find(|p| p.source_type == a.entity_type && p.target_type == b.entity_type)
                    else {
                        continue;
                    };

                    let (lo, hi) = if a.token_start <= b.token_start { (a, b) } else { (b, a) };
                    let between = sentence_between(sentence, lo.char_end, hi.char_start);
                    let trigger_present = found.triggers.iter().any(|t| between.to_lowercase().contains(&t.to_lowercase()));

                    let source_key = EntityKey { surface_form: a.canonical.clone(), entity_type: a.entity_type };
                    let target_key = EntityKey { surface_form: b.canonical.clone(), entity_type: b.entity_type };
                    let relation_kind = if trigger_present { found.relation } else { RelationKind::AssociatedWith };

                    relations
                        .entry((source_key.clone(), target_key.clone(), relation_kind))
                        .or_insert_with(|| Relation {
                            source: source_key,
                            relation: relation_kind,
                            target: target_key,
                            evidence: sentence.clone(),
                            typed: trigger_present,
                        });
                }
            }
        }

        for relation in relations.values() {
            if let Some(e) = registry.get_mut(&relation.source) {
                e.out_degree += 1;
            }
            if let Some(e) = registry.get_mut(&relation.target) {
                e.in_degree += 1;
            }
        }

        let max_freq = registry.values().map(|e| e.frequency).max().unwrap_or(1).max(1);
        let max_out = registry.values().map(|e| e.out_degree).max().unwrap_or(1).max(1);
        let max_in = registry.values().map(|e| e.in_degree).max().unwrap_or(1).max(1);
        for entity in registry.values_mut() {
            entity.importance = 0.4 * (entity.frequency as f64 / max_freq as f64)
                + 0.3 * (entity.out_degree as f64 / max_out as f64)
                + 0.3 * (entity.in_degree as f64 / max_in as f64);
        }

        KnowledgeGraph {
            entities: registry.into_values().collect(),
            relations: relations.into_values().collect(),
            glossary: Vec::new(),
        }
    }

    fn match_entities(&self, tokens: &[Token]) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let mut consumed = 1;
            for term in &self.sorted_terms {
                let len = term.tokens.len();
                if i + len > tokens.len() {
                    continue;
                }
                let matches = term.tokens.iter().zip(&tokens[i..i + len]).all(|(tt, tok)| tt == &tok.text_lower);
                if matches {
                    occurrences.push(Occurrence {
                        canonical: term.canonical.clone(),
                        entity_type: term.entity_type,
                        token_start: i,
                        char_start: tokens[i].start,
                        char_end: tokens[i + len - 1].end,
                    });
                    consumed = len;
                    break;
                }
            }
            i += consumed;
        }
        occurrences
    }
}

struct Occurrence {
    canonical: String,
    entity_type: EntityType,
    token_start: usize,
    char_start: usize,
    char_end: usize,
}

fn tokenize_term(term: &str) -> Vec<String> {
    term.split_whitespace().map(|w| w.to_lowercase()).collect()
}

fn tokenize_sentence(sentence: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = sentence.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_alphanumeric() {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '-') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token { text_lower: text.to_lowercase(), start, end: i });
        } else {
            i += 1;
        }
    }
    tokens
}

fn sentence_between(sentence: &str, char_start: usize, char_end: usize) -> String {
    if char_start >= char_end {
        return String::new();
    }
    sentence.chars().skip(char_start).take(char_end - char_start).collect()
}
