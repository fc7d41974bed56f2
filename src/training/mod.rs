//! Model training: the black-box backend seam, the trainer that wraps it,
//! and the orchestrator that prepares data and drives a full run.

pub mod centroid;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod trainer;

pub use centroid::{NearestCentroidBackend, NearestCentroidModel};
pub use model::{ClassifierBackend, Prediction, ShapeClassifier};
pub use orchestrator::{RealSample, TrainingMetrics, TrainingOrchestrator, TrainingOutcome};
pub use progress::{ProgressScope, ProgressSnapshot, ProgressTracker, TrainingStatus};
pub use trainer::{ArtifactRecord, ModelTrainer, TrainedModelArtifact};
