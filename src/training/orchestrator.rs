//! Training orchestrator
//!
//! Sequences one retraining run end to end:
//!
//! 1. consent check
//! 2. quality filtering and normalization of real strokes
//! 3. per-shape sufficiency check with synthetic fallback
//! 4. augmentation
//! 5. feature extraction
//! 6. training and validation through [`ModelTrainer`]
//!
//! Progress covers `0.0..0.3` for data preparation and `0.3..1.0` for
//! training, remapped from the trainer's own progress channel.

use crate::config::PipelineConfig;
use crate::error::{DuctusError, Result};
use crate::features::FeatureExtractor;
use crate::services::consent::{ConsentGate, ConsentPurpose};
use crate::services::storage::ArtifactStore;
use crate::services::vault::SampleVault;
use crate::stroke::{AugmentationEngine, DataQualityValidator, StrokeNormalizer, SyntheticStrokeGenerator};
use crate::training::model::ClassifierBackend;
use crate::training::progress::{ProgressSnapshot, ProgressTracker, TrainingStatus};
use crate::training::trainer::{ModelTrainer, TrainedModelArtifact};
use crate::types::{LabeledSample, RawStroke, SampleMetadata, SampleSource, ShapeLabel};
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const DATA_PREP_END: f64 = 0.3;
const DEFAULT_CACHE_CAPACITY: usize = 2048;

/// A captured stroke with the label the user intended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealSample {
    pub stroke: RawStroke,
    pub label: ShapeLabel,
}

impl RealSample {
    pub fn new(stroke: RawStroke, label: ShapeLabel) -> Self {
        Self { stroke, label }
    }
}

/// Real versus synthetic makeup of one label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelComposition {
    pub real: usize,
    pub synthetic: usize,
}

/// Counts and timings recorded for a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub real_samples: usize,
    /// Real strokes dropped by quality validation or normalization
    pub rejected_samples: usize,
    pub synthetic_samples: usize,
    pub augmented_samples: usize,
    /// Samples handed to the trainer (originals plus variants)
    pub total_samples: usize,
    pub per_label: BTreeMap<ShapeLabel, LabelComposition>,
    pub validation_accuracy: f64,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: TrainedModelArtifact,
    pub metrics: TrainingMetrics,
}

/// Owns every stage of a retraining run. `run` takes `&mut self`, so one
/// orchestrator never runs two trainings at once.
pub struct TrainingOrchestrator {
    config: PipelineConfig,
    consent: Arc<dyn ConsentGate>,
    validator: DataQualityValidator,
    normalizer: StrokeNormalizer,
    generator: SyntheticStrokeGenerator,
    augmenter: AugmentationEngine,
    extractor: FeatureExtractor,
    trainer: ModelTrainer,
    synthetic_cache: LruCache<(ShapeLabel, u32), RawStroke>,
    store: Option<Arc<dyn ArtifactStore>>,
    vault: Option<SampleVault>,
    tracker: ProgressTracker<TrainingStatus>,
}

impl TrainingOrchestrator {
    pub fn new(
        config: PipelineConfig,
        consent: Arc<dyn ConsentGate>,
        backend: Arc<dyn ClassifierBackend>,
    ) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            validator: DataQualityValidator::new(config.quality.clone()),
            normalizer: StrokeNormalizer::from_config(&config.stroke),
            generator: SyntheticStrokeGenerator::human(config.seed),
            augmenter: AugmentationEngine::new(config.seed.wrapping_add(1)),
            extractor: FeatureExtractor::from_config(&config.stroke),
            trainer: ModelTrainer::from_config(backend, &config),
            synthetic_cache: LruCache::new(capacity),
            store: None,
            vault: None,
            tracker: ProgressTracker::new(TrainingStatus::Idle),
            consent,
            config,
        }
    }

    /// Replace the synthetic generator (e.g. the idealized baseline mode)
    pub fn with_generator(mut self, generator: SyntheticStrokeGenerator) -> Self {
        self.generator = generator;
        self.synthetic_cache.clear();
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Archive accepted real samples through `vault` (requires a store)
    pub fn with_vault(mut self, vault: SampleVault) -> Self {
        self.vault = Some(vault);
        self
    }

    pub fn with_cache_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.synthetic_cache.resize(capacity);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
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

    pub fn cached_synthetic_strokes(&self) -> usize {
        self.synthetic_cache.len()
    }

    /// Run one full retraining
    pub async fn run(&mut self, samples: Vec<RealSample>) -> Result<TrainingOutcome> {
        let started = Instant::now();
        let started_at = Utc::now();
        self.tracker
            .reset(TrainingStatus::Preparing, "Checking consent");

        match self.run_stages(samples, started, started_at).await {
            Ok(outcome) => {
                self.tracker.finish(
                    TrainingStatus::Completed,
                    format!(
                        "Completed with validation accuracy {:.1}%",
                        outcome.metrics.validation_accuracy * 100.0
                    ),
                );
                info!(
                    "Training run completed in {} ms ({} samples)",
                    outcome.metrics.elapsed_ms, outcome.metrics.total_samples
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!("Training run failed: {}", e);
                self.tracker
                    .set_status(TrainingStatus::Failed, format!("Failed: {}", e));
                Err(e)
            }
        }
    }

    async fn run_stages(
        &mut self,
        samples: Vec<RealSample>,
        started: Instant,
        started_at: DateTime<Utc>,
    ) -> Result<TrainingOutcome> {
        if !self.consent.has_consent(ConsentPurpose::ModelTraining) {
            return Err(DuctusError::ConsentRequired(
                ConsentPurpose::ModelTraining.to_string(),
            ));
        }

        // Quality filter and normalize real strokes
        let real_samples = samples.len();
        let (accepted, rejected_samples) = self.prepare_real(samples);
        self.tracker.report(
            0.1,
            format!("Accepted {} of {} real strokes", accepted.len(), real_samples),
        );

        let mut per_label: BTreeMap<ShapeLabel, LabelComposition> = ShapeLabel::ALL
            .iter()
            .map(|label| (*label, LabelComposition::default()))
            .collect();
        for sample in &accepted {
            if let Some(entry) = per_label.get_mut(&sample.label) {
                entry.real += 1;
            }
        }

        if let (Some(vault), Some(store)) = (&self.vault, &self.store) {
            if !accepted.is_empty() {
                vault.archive(&accepted, store.as_ref()).await?;
            }
        }

        // Synthetic fallback for labels short of the minimum
        let mut corpus = accepted;
        let minimum = self.config.minimum_samples_per_shape;
        let mut synthetic_samples = 0;
        for label in ShapeLabel::ALL {
            let available = per_label.get(&label).map_or(0, |c| c.real);
            if available >= minimum {
                continue;
            }
            let shortfall = minimum - available;
            warn!(
                "Only {} real samples for {} (minimum {}); generating {} synthetic",
                available, label, minimum, shortfall
            );
            let generated = self.synthesize(label, shortfall)?;
            synthetic_samples += generated.len();
            if let Some(entry) = per_label.get_mut(&label) {
                entry.synthetic += generated.len();
            }
            corpus.extend(generated);
        }
        self.tracker
            .report(0.2, format!("Added {} synthetic strokes", synthetic_samples));

        // Augment
        let originals = corpus.len();
        let corpus = self
            .augmenter
            .expand_corpus(corpus, self.config.augmentation_multiplier);
        let augmented_samples = corpus.len() - originals;
        self.tracker
            .report(0.25, format!("Augmented corpus to {} samples", corpus.len()));

        // Featurize
        let features = self.extractor.extract_batch(&corpus);
        let examples: Vec<_> = features
            .into_iter()
            .zip(corpus.iter().map(|s| s.label))
            .collect();
        let total_samples = examples.len();
        self.tracker
            .report(DATA_PREP_END, format!("Extracted {} feature vectors", total_samples));

        // Train, forwarding the trainer's progress onto 0.3..1.0
        self.tracker
            .set_status(TrainingStatus::Training, "Training classifier");
        let scope = self.tracker.scope(DATA_PREP_END, 1.0);
        let mut trainer_rx = self.trainer.subscribe();
        let forward = async move {
            while trainer_rx.changed().await.is_ok() {
                let snap = trainer_rx.borrow_and_update().clone();
                scope.report(snap.fraction, snap.step);
                if snap.status.is_terminal() {
                    break;
                }
            }
        };
        let (trained, ()) = tokio::join!(self.trainer.train(examples), forward);
        let mut artifact = trained?;

        if let Some(store) = &self.store {
            let location = store.save_artifact(&artifact.record).await?;
            artifact.record.location = Some(location);
        }

        let metrics = TrainingMetrics {
            real_samples,
            rejected_samples,
            synthetic_samples,
            augmented_samples,
            total_samples,
            per_label,
            validation_accuracy: artifact.accuracy(),
            started_at,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        Ok(TrainingOutcome { artifact, metrics })
    }

    /// Validate and normalize real strokes; failures are counted, not fatal
    fn prepare_real(&self, samples: Vec<RealSample>) -> (Vec<LabeledSample>, usize) {
        let mut accepted = Vec::with_capacity(samples.len());
        let mut rejected = 0;

        for sample in samples {
            let prepared = self.validator.validate(&sample.stroke).and_then(|report| {
                let stroke = self.normalizer.normalize(&sample.stroke)?;
                Ok(LabeledSample::new(
                    stroke,
                    sample.label,
                    SampleMetadata::new(SampleSource::Real).with_quality(report.score),
                ))
            });

            match prepared {
                Ok(labeled) => accepted.push(labeled),
                Err(e) => {
                    debug!("Dropping {} sample: {}", sample.label, e);
                    rejected += 1;
                }
            }
        }

        if rejected > 0 {
            warn!("Rejected {} real samples during quality filtering", rejected);
        }
        (accepted, rejected)
    }

    /// Generate `count` normalized synthetic samples, reusing cached strokes
    fn synthesize(&mut self, label: ShapeLabel, count: usize) -> Result<Vec<LabeledSample>> {
        let mut out = Vec::with_capacity(count);
        for variation in 0..count as u32 {
            let key = (label, variation);
            let raw = match self.synthetic_cache.get(&key) {
                Some(stroke) => stroke.clone(),
                None => {
                    let stroke = self.generator.generate(label, variation);
                    self.synthetic_cache.put(key, stroke.clone());
                    stroke
                }
            };

            let report = self.validator.assess(&raw);
            let stroke = self.normalizer.normalize(&raw)?;
            out.push(LabeledSample::new(
                stroke,
                label,
                SampleMetadata::new(SampleSource::Synthetic)
                    .with_quality(report.score)
                    .with_variation(variation),
            ));
        }
        Ok(out)
    }
}
