//! Reference classifier backend: standardized nearest centroid.
//!
//! Deterministic and dependency-free, so the pipeline can run end-to-end in
//! the CLI and tests. Hosts with a real optimizer inject their own
//! [`ClassifierBackend`].

use crate::error::{DuctusError, Result};
use crate::training::model::{ClassifierBackend, Prediction, ShapeClassifier};
use crate::training::progress::{ProgressScope, TrainingStatus};
use crate::types::{FeatureVector, ShapeLabel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Dimensions with a spread below this are left unscaled
const MIN_SCALE: f64 = 1e-9;

/// Nearest-centroid model in z-scored feature space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroidModel {
    name: String,
    means: Vec<f64>,
    scales: Vec<f64>,
    centroids: Vec<(ShapeLabel, Vec<f64>)>,
}

impl NearestCentroidModel {
    /// Fit per-dimension standardization and one centroid per label
    pub fn fit(name: impl Into<String>, features: &[FeatureVector], labels: &[ShapeLabel]) -> Result<Self> {
        if features.is_empty() || features.len() != labels.len() {
            return Err(DuctusError::TrainingFailed(format!(
                "expected matching non-empty inputs, got {} vectors and {} labels",
                features.len(),
                labels.len()
            )));
        }

        let dim = features[0].len();
        if let Some(bad) = features.iter().find(|f| f.len() != dim) {
            return Err(DuctusError::TrainingFailed(format!(
                "inconsistent feature length: {} vs {}",
                bad.len(),
                dim
            )));
        }

        let n = features.len() as f64;
        let mut means = vec![0.0; dim];
        for f in features {
            for (m, v) in means.iter_mut().zip(f.as_slice()) {
                *m += v / n;
            }
        }

        let mut scales = vec![0.0; dim];
        for f in features {
            for ((s, v), m) in scales.iter_mut().zip(f.as_slice()).zip(&means) {
                *s += (v - m).powi(2) / n;
            }
        }
        for s in scales.iter_mut() {
            *s = if s.sqrt() > MIN_SCALE { s.sqrt() } else { 1.0 };
        }

        let mut sums: BTreeMap<ShapeLabel, (Vec<f64>, usize)> = BTreeMap::new();
        for (f, label) in features.iter().zip(labels) {
            let entry = sums.entry(*label).or_insert_with(|| (vec![0.0; dim], 0));
            for (i, v) in f.as_slice().iter().enumerate() {
                entry.0[i] += (v - means[i]) / scales[i];
            }
            entry.1 += 1;
        }

        let centroids = sums
            .into_iter()
            .map(|(label, (sum, count))| {
                (label, sum.into_iter().map(|v| v / count as f64).collect())
            })
            .collect();

        Ok(Self {
            name: name.into(),
            means,
            scales,
            centroids,
        })
    }

    pub fn dimension(&self) -> usize {
        self.means.len()
    }

    pub fn labels(&self) -> Vec<ShapeLabel> {
        self.centroids.iter().map(|(label, _)| *label).collect()
    }
}

impl ShapeClassifier for NearestCentroidModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        if features.len() != self.dimension() {
            return Err(DuctusError::PredictionFailed(format!(
                "{} expects {} features, got {}",
                self.name,
                self.dimension(),
                features.len()
            )));
        }

        let standardized: Vec<f64> = features
            .as_slice()
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (m, s))| (v - m) / s)
            .collect();

        let distances: Vec<(ShapeLabel, f64)> = self
            .centroids
            .iter()
            .map(|(label, centroid)| {
                let d2: f64 = centroid
                    .iter()
                    .zip(&standardized)
                    .map(|(c, v)| (c - v).powi(2))
                    .sum();
                (*label, d2.sqrt())
            })
            .collect();

        let (label, best) = distances
            .iter()
            .copied()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| DuctusError::PredictionFailed("model has no centroids".to_string()))?;

        if !best.is_finite() {
            return Err(DuctusError::PredictionFailed(
                "non-finite distance to nearest centroid".to_string(),
            ));
        }

        // Softmax over negative distances, shifted by the best for stability
        let total: f64 = distances.iter().map(|(_, d)| (best - d).exp()).sum();
        Ok(Prediction {
            label,
            confidence: 1.0 / total,
        })
    }
}

/// Backend producing [`NearestCentroidModel`]s
#[derive(Debug, Clone)]
pub struct NearestCentroidBackend {
    model_name: String,
}

impl NearestCentroidBackend {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
        }
    }
}

impl Default for NearestCentroidBackend {
    fn default() -> Self {
        Self::new("nearest-centroid")
    }
}

#[async_trait]
impl ClassifierBackend for NearestCentroidBackend {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn train(
        &self,
        features: &[FeatureVector],
        labels: &[ShapeLabel],
        progress: &ProgressScope<TrainingStatus>,
    ) -> Result<Arc<dyn ShapeClassifier>> {
        progress.report(0.0, "Fitting nearest-centroid model");
        let model = NearestCentroidModel::fit(self.model_name.clone(), features, labels)?;
        debug!(
            "Fitted {} centroids over {} dimensions",
            model.labels().len(),
            model.dimension()
        );
        progress.report(1.0, "Model fitted");
        Ok(Arc::new(model))
    }
}
