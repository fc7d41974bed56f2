//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use ductus_core::deployment::ProductionSignal;
use ductus_core::training::{ArtifactRecord, Prediction};
use ductus_core::{
    FeatureVector, PipelineConfig, RawStroke, RealSample, Result, ShapeClassifier, ShapeLabel,
    StrokePoint, SyntheticStrokeGenerator, TrainedModelArtifact,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Small configuration so end-to-end runs stay fast
pub fn fast_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.minimum_samples_per_shape = 12;
    config.augmentation_multiplier = 1;
    config.evaluation.samples_per_scenario = 12;
    config
}

/// Captured-looking samples for every shape
pub fn captured_samples(per_shape: u32, seed: u64) -> Vec<RealSample> {
    let generator = SyntheticStrokeGenerator::human(seed);
    ShapeLabel::ALL
        .iter()
        .flat_map(|label| {
            generator
                .generate_family(*label, 1000, per_shape as usize)
                .into_iter()
                .map(move |(_, stroke)| RealSample::new(stroke, *label))
        })
        .collect()
}

/// The 30-point horizontal line from (50, 112) to (174, 112)
pub fn horizontal_line() -> RawStroke {
    RawStroke::new(
        (0..30)
            .map(|i| {
                let f = i as f64 / 29.0;
                StrokePoint::new(50.0 + 124.0 * f, 112.0, f * 0.6, 0.4 + 0.3 * f)
            })
            .collect(),
    )
}

/// Classifier that always answers the same label
pub struct ConstantClassifier(pub ShapeLabel);

impl ShapeClassifier for ConstantClassifier {
    fn name(&self) -> &str {
        "constant"
    }

    fn predict(&self, _features: &FeatureVector) -> Result<Prediction> {
        Ok(Prediction {
            label: self.0,
            confidence: 1.0,
        })
    }
}

/// Artifact wrapping an arbitrary classifier
pub fn artifact_with(model: Arc<dyn ShapeClassifier>, accuracy: f64) -> TrainedModelArtifact {
    TrainedModelArtifact {
        record: ArtifactRecord {
            id: uuid::Uuid::new_v4(),
            backend: model.name().to_string(),
            accuracy,
            train_count: 10,
            val_count: 2,
            feature_len: 0,
            label_counts: BTreeMap::new(),
            checksum: String::new(),
            created_at: chrono::Utc::now(),
            location: None,
        },
        model,
    }
}

/// Production signal reporting a fixed accuracy
pub struct FixedSignal(pub f64);

#[async_trait]
impl ProductionSignal for FixedSignal {
    async fn current_accuracy(&self) -> Result<f64> {
        Ok(self.0)
    }
}
