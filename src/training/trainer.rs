//! Model trainer: split, train through the injected backend, validate.
//!
//! Status moves `idle → preparing → training → completed | failed`. Any
//! error during preparation, training or validation lands in `failed` and
//! is returned to the caller; no artifact is produced for a failed run.

use crate::config::PipelineConfig;
use crate::error::{DuctusError, Result};
use crate::training::model::{ClassifierBackend, ShapeClassifier};
use crate::training::progress::{ProgressSnapshot, ProgressTracker, TrainingStatus};
use crate::types::{FeatureVector, ShapeLabel};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Serializable description of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: Uuid,
    pub backend: String,
    /// Validation accuracy in `[0, 1]`
    pub accuracy: f64,
    pub train_count: usize,
    pub val_count: usize,
    pub feature_len: usize,
    pub label_counts: BTreeMap<ShapeLabel, usize>,
    /// SHA-256 over the training composition, hex encoded
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    /// Set once the artifact store has persisted the record
    pub location: Option<String>,
}

/// Trained model plus its record
#[derive(Clone)]
pub struct TrainedModelArtifact {
    pub record: ArtifactRecord,
    pub model: Arc<dyn ShapeClassifier>,
}

impl TrainedModelArtifact {
    pub fn id(&self) -> Uuid {
        self.record.id
    }

    pub fn accuracy(&self) -> f64 {
        self.record.accuracy
    }
}

impl fmt::Debug for TrainedModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModelArtifact")
            .field("record", &self.record)
            .field("model", &self.model.name())
            .finish()
    }
}

/// Train/validation driver around a [`ClassifierBackend`]
pub struct ModelTrainer {
    backend: Arc<dyn ClassifierBackend>,
    validation_split: f64,
    minimum_samples: usize,
    seed: u64,
    tracker: ProgressTracker<TrainingStatus>,
}

impl ModelTrainer {
    pub fn new(
        backend: Arc<dyn ClassifierBackend>,
        validation_split: f64,
        minimum_samples: usize,
        seed: u64,
    ) -> Self {
        Self {
            backend,
            validation_split,
            minimum_samples: minimum_samples.max(2),
            seed,
            tracker: ProgressTracker::new(TrainingStatus::Idle),
        }
    }

    pub fn from_config(backend: Arc<dyn ClassifierBackend>, config: &PipelineConfig) -> Self {
        Self::new(
            backend,
            config.validation_split,
            config.trainer.minimum_training_samples,
            config.seed,
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot<TrainingStatus>> {
        self.tracker.subscribe()
    }

    pub fn progress(&self) -> f64 {
        self.tracker.progress()
    }

    pub fn status(&self) -> TrainingStatus {
        self.tracker.status()
    }

    pub fn current_step(&self) -> String {
        self.tracker.current_step()
    }

    /// Train on `(features, label)` examples and validate on a held-out split
    pub async fn train(
        &mut self,
        examples: Vec<(FeatureVector, ShapeLabel)>,
    ) -> Result<TrainedModelArtifact> {
        self.tracker
            .reset(TrainingStatus::Preparing, "Preparing training data");

        match self.run(examples).await {
            Ok(artifact) => {
                self.tracker.finish(
                    TrainingStatus::Completed,
                    format!("Validation accuracy {:.1}%", artifact.accuracy() * 100.0),
                );
                info!(
                    "Training completed: model {} accuracy {:.3} ({} train / {} val)",
                    artifact.id(),
                    artifact.accuracy(),
                    artifact.record.train_count,
                    artifact.record.val_count
                );
                Ok(artifact)
            }
            Err(e) => {
                error!("Training failed: {}", e);
                self.tracker
                    .set_status(TrainingStatus::Failed, format!("Failed: {}", e));
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        mut examples: Vec<(FeatureVector, ShapeLabel)>,
    ) -> Result<TrainedModelArtifact> {
        if examples.len() < self.minimum_samples {
            return Err(DuctusError::InsufficientData {
                label: None,
                required: self.minimum_samples,
                available: examples.len(),
            });
        }

        let feature_len = examples[0].0.len();
        if feature_len == 0 {
            return Err(DuctusError::TrainingFailed(
                "feature vectors are empty".to_string(),
            ));
        }
        if let Some((bad, _)) = examples.iter().find(|(f, _)| f.len() != feature_len) {
            return Err(DuctusError::TrainingFailed(format!(
                "inconsistent feature length: {} vs {}",
                bad.len(),
                feature_len
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        examples.shuffle(&mut rng);

        let (train_set, val_set) = split(examples, self.validation_split);
        let (train_features, train_labels): (Vec<FeatureVector>, Vec<ShapeLabel>) =
            train_set.into_iter().unzip();

        let mut label_counts = BTreeMap::new();
        for label in &train_labels {
            *label_counts.entry(*label).or_insert(0) += 1;
        }
        debug!(
            "Split {} train / {} validation across {} labels",
            train_features.len(),
            val_set.len(),
            label_counts.len()
        );
        self.tracker.report(0.1, "Split training and validation sets");

        self.tracker.set_status(
            TrainingStatus::Training,
            format!("Training {} on {} samples", self.backend.name(), train_features.len()),
        );
        let model = self
            .backend
            .train(&train_features, &train_labels, &self.tracker.scope(0.1, 0.9))
            .await
            .map_err(|e| match e {
                DuctusError::TrainingFailed(_) => e,
                other => DuctusError::TrainingFailed(other.to_string()),
            })?;

        self.tracker.report(0.9, "Validating model");
        let accuracy = validation_accuracy(model.as_ref(), &val_set)?;

        let checksum = composition_checksum(
            self.backend.name(),
            &label_counts,
            train_features.len(),
            val_set.len(),
            feature_len,
        );

        Ok(TrainedModelArtifact {
            record: ArtifactRecord {
                id: Uuid::new_v4(),
                backend: self.backend.name().to_string(),
                accuracy,
                train_count: train_features.len(),
                val_count: val_set.len(),
                feature_len,
                label_counts,
                checksum,
                created_at: Utc::now(),
                location: None,
            },
            model,
        })
    }
}

/// Split at `validation_split`, keeping at least one example on each side
fn split<T>(mut items: Vec<T>, validation_split: f64) -> (Vec<T>, Vec<T>) {
    let n = items.len();
    let val = ((n as f64) * validation_split).round() as usize;
    let val = val.clamp(1, n.saturating_sub(1).max(1));
    let validation = items.split_off(n - val);
    (items, validation)
}

/// Fraction of examples whose predicted label matches exactly
pub fn validation_accuracy(
    model: &dyn ShapeClassifier,
    examples: &[(FeatureVector, ShapeLabel)],
) -> Result<f64> {
    if examples.is_empty() {
        return Ok(0.0);
    }
    let mut correct = 0usize;
    for (features, label) in examples {
        if model.predict(features)?.label == *label {
            correct += 1;
        }
    }
    Ok(correct as f64 / examples.len() as f64)
}

fn composition_checksum(
    backend: &str,
    label_counts: &BTreeMap<ShapeLabel, usize>,
    train_count: usize,
    val_count: usize,
    feature_len: usize,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(backend.as_bytes());
    for (label, count) in label_counts {
        hasher.update(format!("{}={};", label, count).as_bytes());
    }
    hasher.update(format!("{}/{}/{}", train_count, val_count, feature_len).as_bytes());
    format!("{:x}", hasher.finalize())
}
