//! Domain Knowledge Graph (spec.md §4.7, Component C7): ontology-driven
//! entity extraction, relationship inference, centrality scoring, and
//! glossary generation over free text.
//!
//! This crate has no dependency on `digestgraph-core` or `digestgraph-llm`
//! — see `glossary`'s module docs for why — so it stays a leaf service
//! `digestgraph-core::nodes` can depend on directly.

pub mod builder;
pub mod error;
pub mod export;
pub mod glossary;
pub mod ontology;
pub mod segment;
pub mod types;

pub use builder::KnowledgeGraphBuilder;
pub use error::{KgError, Result};
pub use glossary::{build_glossary, TermDefiner};
pub use ontology::{OntologyBundle, RelationPattern};
pub use types::{Entity, EntityKey, EntityType, GlossaryEntry, KnowledgeGraph, Relation, RelationKind};
