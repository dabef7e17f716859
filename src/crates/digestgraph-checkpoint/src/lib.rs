//! Checkpoint sink abstraction for the digestgraph workflow engine.
//!
//! A [`CheckpointSink`] persists an opaque JSON snapshot of the pipeline's
//! shared state keyed by `run_id`, so a cancelled or crashed run can resume
//! at the node it last completed. The sink deliberately does not know the
//! shape of the state it stores — `digestgraph-core` serializes
//! `SharedState` to `serde_json::Value` before handing it here, which keeps
//! this crate a leaf dependency with no knowledge of the engine above it.
//!
//! Two implementations are provided: [`InMemoryCheckpointSink`] for tests
//! and short-lived runs, and [`FileCheckpointSink`] for resumable runs
//! across process restarts.

mod error;
mod file;
mod memory;

pub use error::{CheckpointError, Result};
pub use file::FileCheckpointSink;
pub use memory::InMemoryCheckpointSink;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// A single persisted checkpoint: the name of the node that just completed
/// and the full state snapshot as of that moment.
#[derive(Debug, Clone)]
pub struct CheckpointEntry {
    pub node: String,
    pub snapshot: Value,
    pub saved_at: DateTime<Utc>,
}

/// Storage backend for workflow checkpoints.
///
/// Implementations MUST overwrite the previous entry for a `run_id` on each
/// `save` — only the latest checkpoint per run is retained, matching the
/// engine's "persist after each node completion" contract (run history
/// beyond resume is out of scope).
#[async_trait]
pub trait CheckpointSink: Send + Sync {
    /// Persist `snapshot` as the latest checkpoint for `run_id`, recording
    /// which node it was taken after.
    async fn save(&self, run_id: Uuid, node: &str, snapshot: &Value) -> Result<()>;

    /// Load the most recent checkpoint for `run_id`, if any.
    async fn load_latest(&self, run_id: Uuid) -> Result<Option<CheckpointEntry>>;

    /// Drop the checkpoint for `run_id`, if one exists. Called once a run
    /// completes so a resumed re-run of the same `run_id` starts clean.
    async fn clear(&self, run_id: Uuid) -> Result<()>;
}
