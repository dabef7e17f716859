//! Output Composition (spec.md §4.8–§4.9, Components C8/C9): Markdown/HTML/
//! JSON newsletter rendering plus the cover-image and chart producers.
//!
//! Kept free of a dependency on `digestgraph-core` — [`types::NewsletterContent`]
//! is this crate's own DTO, filled in by the `compose_outputs` node from its
//! `SharedState` — so this stays a leaf crate the engine depends on, not the
//! other way around.

pub mod chart;
pub mod compose;
pub mod error;
pub mod html;
pub mod image;
pub mod json;
pub mod markdown;
pub mod types;

pub use compose::{ComposedOutputs, OutputComposer};
pub use error::{OutputError, Result};
pub use image::{CoverImageProducer, ImageApi, StylePreset};
pub use types::{ArticleRef, GlossarySection, MetricsSummary, NewsletterContent, ReviewBadge, TopicSection, NO_ARTICLES_PLACEHOLDER};
