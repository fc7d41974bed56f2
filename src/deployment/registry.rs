//! Active-model registry with promotion history and rollback log

use crate::error::{DuctusError, Result};
use crate::training::trainer::TrainedModelArtifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackTrigger {
    /// Production accuracy fell below the degradation threshold
    Automatic,
    /// Requested by an operator
    Manual,
}

impl fmt::Display for RollbackTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackTrigger::Automatic => f.write_str("automatic"),
            RollbackTrigger::Manual => f.write_str("manual"),
        }
    }
}

/// Performance readings at the time of a rollback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollbackSignals {
    pub baseline_accuracy: f64,
    /// Last production reading, if any was taken
    pub current_accuracy: Option<f64>,
    /// `baseline * degradation_tolerance`
    pub threshold: f64,
}

/// Append-only rollback log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub trigger: RollbackTrigger,
    pub from_model: Uuid,
    pub to_model: Uuid,
    pub signals: RollbackSignals,
}

#[derive(Default)]
struct RegistryState {
    active: Option<TrainedModelArtifact>,
    /// Previously active models, most recent last
    history: Vec<TrainedModelArtifact>,
    rollbacks: Vec<RollbackRecord>,
}

/// Tracks which model serves production
#[derive(Default)]
pub struct ModelRegistry {
    state: RwLock<RegistryState>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry serving `model` from the start
    pub fn with_active(model: TrainedModelArtifact) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                active: Some(model),
                ..RegistryState::default()
            }),
        }
    }

    pub async fn active(&self) -> Option<TrainedModelArtifact> {
        self.state.read().await.active.clone()
    }

    pub async fn active_id(&self) -> Option<Uuid> {
        self.state.read().await.active.as_ref().map(|a| a.id())
    }

    /// Make `model` active, keeping the current one for rollback
    pub async fn promote(&self, model: TrainedModelArtifact) -> Option<Uuid> {
        let mut state = self.state.write().await;
        let previous = state.active.replace(model);
        let previous_id = previous.as_ref().map(|p| p.id());
        if let Some(previous) = previous {
            state.history.push(previous);
        }
        if let Some(active) = &state.active {
            info!(
                "Promoted model {} (accuracy {:.3})",
                active.id(),
                active.accuracy()
            );
        }
        previous_id
    }

    /// Restore the previously active model and log the rollback
    pub async fn rollback(
        &self,
        reason: impl Into<String>,
        trigger: RollbackTrigger,
        signals: RollbackSignals,
    ) -> Result<RollbackRecord> {
        let reason = reason.into();
        let mut state = self.state.write().await;
        let from_model = state
            .active
            .as_ref()
            .map(|active| active.id())
            .ok_or_else(|| DuctusError::InvalidOperation("no active model to roll back".to_string()))?;
        // Never leave production without a model
        let restored = state.history.pop().ok_or_else(|| {
            DuctusError::InvalidOperation(format!("no previous model to restore in place of {}", from_model))
        })?;

        let record = RollbackRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            reason,
            trigger,
            from_model,
            to_model: restored.id(),
            signals,
        };
        state.active = Some(restored);
        state.rollbacks.push(record.clone());

        warn!(
            "Rolled back model {} ({}): {}",
            record.from_model, record.trigger, record.reason
        );
        Ok(record)
    }

    pub async fn rollback_log(&self) -> Vec<RollbackRecord> {
        self.state.read().await.rollbacks.clone()
    }

    pub async fn history_len(&self) -> usize {
        self.state.read().await.history.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::training::model::{Prediction, ShapeClassifier};
    use crate::training::trainer::ArtifactRecord;
    use crate::types::{FeatureVector, ShapeLabel};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct Fixed;

    impl ShapeClassifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _features: &FeatureVector) -> Result<Prediction> {
            Ok(Prediction {
                label: ShapeLabel::Circle,
                confidence: 1.0,
            })
        }
    }

    pub(crate) fn artifact(accuracy: f64) -> TrainedModelArtifact {
        TrainedModelArtifact {
            record: ArtifactRecord {
                id: Uuid::new_v4(),
                backend: "fixed".to_string(),
                accuracy,
                train_count: 8,
                val_count: 2,
                feature_len: 4,
                label_counts: BTreeMap::new(),
                checksum: String::new(),
                created_at: Utc::now(),
                location: None,
            },
            model: Arc::new(Fixed),
        }
    }

    fn signals() -> RollbackSignals {
        RollbackSignals {
            baseline_accuracy: 0.8,
            current_accuracy: Some(0.7),
            threshold: 0.76,
        }
    }

    #[tokio::test]
    async fn test_promote_then_rollback_restores_previous() {
        let old = artifact(0.6);
        let new = artifact(0.8);
        let registry = ModelRegistry::with_active(old.clone());

        assert_eq!(registry.promote(new.clone()).await, Some(old.id()));
        assert_eq!(registry.active_id().await, Some(new.id()));

        let record = registry
            .rollback("accuracy dropped", RollbackTrigger::Automatic, signals())
            .await
            .unwrap();
        assert_eq!(record.from_model, new.id());
        assert_eq!(record.to_model, old.id());
        assert_eq!(registry.active_id().await, Some(old.id()));
        assert_eq!(registry.rollback_log().await.len(), 1);
        assert_eq!(registry.history_len().await, 0);
    }

    #[tokio::test]
    async fn test_rollback_without_history_keeps_active() {
        let only = artifact(0.7);
        let registry = ModelRegistry::new();
        registry.promote(only.clone()).await;

        let err = registry
            .rollback("manual", RollbackTrigger::Manual, signals())
            .await
            .unwrap_err();
        assert!(matches!(err, DuctusError::InvalidOperation(_)));
        assert_eq!(registry.active_id().await, Some(only.id()));
        assert!(registry.rollback_log().await.is_empty());

        let empty = ModelRegistry::new();
        let err = empty
            .rollback("again", RollbackTrigger::Manual, signals())
            .await
            .unwrap_err();
        assert!(matches!(err, DuctusError::InvalidOperation(_)));
    }
}
