//! Filesystem-backed checkpoint storage — one JSON file per run, overwritten
//! on every save so only the latest state survives a crash.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{CheckpointEntry, CheckpointError, CheckpointSink, Result};

#[derive(Serialize, Deserialize)]
struct OnDiskCheckpoint {
    node: String,
    saved_at: chrono::DateTime<Utc>,
    snapshot: Value,
}

/// Persists checkpoints as `{dir}/{run_id}.json`.
#[derive(Debug, Clone)]
pub struct FileCheckpointSink {
    dir: PathBuf,
}

impl FileCheckpointSink {
    /// `dir` is created (including parents) on first use if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, run_id: Uuid) -> PathBuf {
        self.dir.join(format!("{run_id}.json"))
    }
}

#[async_trait]
impl CheckpointSink for FileCheckpointSink {
    async fn save(&self, run_id: Uuid, node: &str, snapshot: &Value) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let on_disk = OnDiskCheckpoint {
            node: node.to_string(),
            saved_at: Utc::now(),
            snapshot: snapshot.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&on_disk)?;
        let path = self.path_for(run_id);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    async fn load_latest(&self, run_id: Uuid) -> Result<Option<CheckpointEntry>> {
        let path = self.path_for(run_id);
        if !Path::new(&path).exists() {
            return Ok(None);
        }
        let bytes = tokio::fs::read(&path).await?;
        let on_disk: OnDiskCheckpoint = serde_json::from_slice(&bytes)
            .map_err(CheckpointError::Serialization)?;
        Ok(Some(CheckpointEntry {
            node: on_disk.node,
            snapshot: on_disk.snapshot,
            saved_at: on_disk.saved_at,
        }))
    }

    async fn clear(&self, run_id: Uuid) -> Result<()> {
        let path = self.path_for(run_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
