//! In-memory checkpoint storage — ephemeral, for tests and single-process runs
//! that don't need to survive a restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{CheckpointEntry, CheckpointSink, Result};

/// Thread-safe in-memory [`CheckpointSink`]. Data is lost when the process
/// exits.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCheckpointSink {
    entries: Arc<RwLock<HashMap<Uuid, CheckpointEntry>>>,
}

impl InMemoryCheckpointSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointSink for InMemoryCheckpointSink {
    async fn save(&self, run_id: Uuid, node: &str, snapshot: &Value) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            run_id,
            CheckpointEntry {
                node: node.to_string(),
                snapshot: snapshot.clone(),
                saved_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn load_latest(&self, run_id: Uuid) -> Result<Option<CheckpointEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&run_id).cloned())
    }

    async fn clear(&self, run_id: Uuid) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(&run_id);
        Ok(())
    }
}
