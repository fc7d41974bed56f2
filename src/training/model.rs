//! Classifier seams: the black-box training routine and the models it returns.

use crate::error::Result;
use crate::training::progress::{ProgressScope, TrainingStatus};
use crate::types::{FeatureVector, ShapeLabel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Classifier output for one stroke
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: ShapeLabel,
    /// Model confidence in `[0, 1]`
    pub confidence: f64,
}

/// Trained shape classifier
pub trait ShapeClassifier: Send + Sync {
    /// Short identifier used in logs and reports
    fn name(&self) -> &str;

    /// Predict the shape of one featurized stroke
    ///
    /// # Errors
    ///
    /// Returns [`crate::DuctusError::PredictionFailed`] when the input cannot
    /// be scored (e.g. wrong vector length).
    fn predict(&self, features: &FeatureVector) -> Result<Prediction>;
}

/// Opaque training routine: `train(features, labels) → model`.
///
/// Implementations own the numerical optimization. The pipeline only
/// prepares inputs, reports progress and validates the result.
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn train(
        &self,
        features: &[FeatureVector],
        labels: &[ShapeLabel],
        progress: &ProgressScope<TrainingStatus>,
    ) -> Result<Arc<dyn ShapeClassifier>>;
}
