//! Persistence of pipeline outputs
//!
//! Artifacts, recommendations and sealed sample batches are written once,
//! keyed by timestamp. Rollback records form an append-only log.

use crate::deployment::gate::DeploymentRecommendation;
use crate::deployment::registry::RollbackRecord;
use crate::error::{DuctusError, Result};
use crate::services::vault::SealedBatch;
use crate::training::trainer::ArtifactRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

const ROLLBACK_LOG: &str = "rollbacks.jsonl";

/// Storage collaborator for pipeline outputs
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist a trained model record, returning its location
    async fn save_artifact(&self, record: &ArtifactRecord) -> Result<String>;

    /// Persist a deployment recommendation for audit
    async fn save_recommendation(&self, recommendation: &DeploymentRecommendation) -> Result<String>;

    /// Append one record to the rollback log
    async fn append_rollback(&self, record: &RollbackRecord) -> Result<()>;

    /// Every rollback record, oldest first
    async fn load_rollbacks(&self) -> Result<Vec<RollbackRecord>>;

    /// Persist an encrypted batch of samples
    async fn save_sealed_batch(&self, batch: &SealedBatch) -> Result<String>;
}

/// JSON files under a root directory
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<data dir>/ductus`
    pub fn default_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ductus")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write_json<T: Serialize + Sync>(
        &self,
        kind: &str,
        created_at: DateTime<Utc>,
        id: Uuid,
        value: &T,
    ) -> Result<String> {
        let dir = self.root.join(kind);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            DuctusError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let path = dir.join(file_name(created_at, id));
        let json = serde_json::to_string_pretty(value)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| DuctusError::Storage(format!("Failed to write {}: {}", path.display(), e)))?;

        debug!("Saved {} to {}", kind, path.display());
        Ok(path.display().to_string())
    }
}

/// Timestamp-keyed file name, sortable by creation time
fn file_name(created_at: DateTime<Utc>, id: Uuid) -> String {
    format!("{}-{}.json", created_at.format("%Y%m%dT%H%M%S%3fZ"), id)
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn save_artifact(&self, record: &ArtifactRecord) -> Result<String> {
        self.write_json("artifacts", record.created_at, record.id, record)
            .await
    }

    async fn save_recommendation(&self, recommendation: &DeploymentRecommendation) -> Result<String> {
        self.write_json(
            "recommendations",
            recommendation.created_at,
            recommendation.id,
            recommendation,
        )
        .await
    }

    async fn append_rollback(&self, record: &RollbackRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            DuctusError::Storage(format!("Failed to create {}: {}", self.root.display(), e))
        })?;

        let path = self.root.join(ROLLBACK_LOG);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| DuctusError::Storage(format!("Failed to open rollback log: {}", e)))?;

        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| DuctusError::Storage(format!("Failed to append rollback: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| DuctusError::Storage(format!("Failed to flush rollback log: {}", e)))?;
        Ok(())
    }

    async fn load_rollbacks(&self) -> Result<Vec<RollbackRecord>> {
        let path = self.root.join(ROLLBACK_LOG);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(DuctusError::Storage(format!(
                    "Failed to read rollback log: {}",
                    e
                )))
            }
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(DuctusError::from))
            .collect()
    }

    async fn save_sealed_batch(&self, batch: &SealedBatch) -> Result<String> {
        self.write_json("samples", batch.created_at, batch.id, batch)
            .await
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    artifacts: Vec<ArtifactRecord>,
    recommendations: Vec<DeploymentRecommendation>,
    rollbacks: Vec<RollbackRecord>,
    batches: Vec<SealedBatch>,
}

/// In-process store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    state: RwLock<MemoryState>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn artifacts(&self) -> Vec<ArtifactRecord> {
        self.state.read().await.artifacts.clone()
    }

    pub async fn recommendations(&self) -> Vec<DeploymentRecommendation> {
        self.state.read().await.recommendations.clone()
    }

    pub async fn batches(&self) -> Vec<SealedBatch> {
        self.state.read().await.batches.clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn save_artifact(&self, record: &ArtifactRecord) -> Result<String> {
        self.state.write().await.artifacts.push(record.clone());
        Ok(format!("memory://artifacts/{}", record.id))
    }

    async fn save_recommendation(&self, recommendation: &DeploymentRecommendation) -> Result<String> {
        self.state
            .write()
            .await
            .recommendations
            .push(recommendation.clone());
        Ok(format!("memory://recommendations/{}", recommendation.id))
    }

    async fn append_rollback(&self, record: &RollbackRecord) -> Result<()> {
        self.state.write().await.rollbacks.push(record.clone());
        Ok(())
    }

    async fn load_rollbacks(&self) -> Result<Vec<RollbackRecord>> {
        Ok(self.state.read().await.rollbacks.clone())
    }

    async fn save_sealed_batch(&self, batch: &SealedBatch) -> Result<String> {
        self.state.write().await.batches.push(batch.clone());
        Ok(format!("memory://samples/{}", batch.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_sorts_by_time() {
        let id = Uuid::nil();
        let early = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 11, 2, 3, 4, 5).unwrap();
        let a = file_name(early, id);
        let b = file_name(late, id);
        assert!(a.starts_with("20250102T030405000Z-"));
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_missing_rollback_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileArtifactStore::new(dir.path());
        assert!(store.load_rollbacks().await.unwrap().is_empty());
    }
}
