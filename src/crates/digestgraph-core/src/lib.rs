//! # digestgraph-core
//!
//! The orchestration core of digestgraph: Shared State, the Workflow
//! Engine, the Prompt Registry, and the pipeline's Node Functions. Search
//! Connectors, the LLM Gateway, and checkpoint persistence are leaf
//! services supplied by sibling crates and wired together here.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use digestgraph_core::{nodes::{build_pipeline, PipelineContext}, state::SharedState};
//!
//! #[tokio::main]
//! async fn main() -> digestgraph_core::Result<()> {
//!     let ctx = PipelineContext::new(gateway, prompts, meta_retriever, kg_builder, output_composer);
//!     let engine = build_pipeline(&ctx, topics);
//!     let initial = SharedState::new("oncology-ai");
//!     let final_state = engine.run(initial, None, None).await?;
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod nodes;
pub mod prompts;
pub mod state;

pub use error::{DigestGraphError, Result};
