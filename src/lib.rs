//! Ductus - Stroke Classifier Retraining Pipeline
//!
//! Retrains an on-device shape classifier from real user drawings and decides
//! whether the retrained model should replace the one in production:
//! - Stroke normalization, quality filtering and augmentation
//! - Human-like synthetic strokes when real samples are scarce
//! - Fixed-length feature extraction
//! - Training through an injected classifier backend
//! - Paired old-versus-new evaluation across imperfection scenarios
//! - Four-criteria deployment gate with risk assessment
//! - Production monitoring with automatic and manual rollback
//!
//! # Architecture
//!
//! - **Types**: Core data structures (RawStroke, NormalizedStroke, LabeledSample, ...)
//! - **Stroke**: Normalizer, quality validator, augmentation, synthetic generator
//! - **Features**: Feature extractor
//! - **Training**: Trainer, reference backend, training orchestrator, progress
//! - **Evaluation**: Scenarios, statistics, performance evaluator
//! - **Deployment**: Gate, risk, registry, monitor, integration orchestrator
//! - **Services**: Consent, encryption, storage and sample vault collaborators
//!
//! # Example
//!
//! ```ignore
//! use ductus_core::{
//!     IntegrationOrchestrator, ModelRegistry, NearestCentroidBackend, PipelineConfig,
//!     StaticConsent, TrainingOrchestrator,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::default();
//!     let mut training = TrainingOrchestrator::new(
//!         config.clone(),
//!         Arc::new(StaticConsent::granted()),
//!         Arc::new(NearestCentroidBackend::default()),
//!     );
//!     let outcome = training.run(captured_samples()).await?;
//!
//!     let registry = Arc::new(ModelRegistry::with_active(current_model()));
//!     let mut integration = IntegrationOrchestrator::new(config, registry);
//!     let recommendation = integration.evaluate_and_recommend(&outcome.artifact).await;
//!     println!("{}", recommendation.summary);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod deployment;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod services;
pub mod stroke;
pub mod training;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, PipelineConfig};
pub use deployment::{
    DeploymentRecommendation, DeploymentStatus, IntegrationOrchestrator, ModelRegistry,
    MonitorOutcome, ProductionMonitor, ProductionSignal, RollbackRecord,
};
pub use error::{DuctusError, Result};
pub use evaluation::{ComparisonReport, ImperfectionScenario, PerformanceEvaluator, ScenarioResult};
pub use features::FeatureExtractor;
pub use services::{
    ArtifactStore, ConsentGate, Encryptor, FileArtifactStore, MemoryArtifactStore,
    PassthroughEncryptor, SampleVault, StaticConsent,
};
pub use stroke::{AugmentationEngine, DataQualityValidator, StrokeNormalizer, SyntheticStrokeGenerator};
pub use training::{
    ClassifierBackend, ModelTrainer, NearestCentroidBackend, RealSample, ShapeClassifier,
    TrainedModelArtifact, TrainingOrchestrator, TrainingStatus,
};
pub use types::{
    AugmentationKind, FeatureVector, LabeledSample, NormalizedStroke, RawStroke, ShapeLabel,
    StrokePoint,
};
