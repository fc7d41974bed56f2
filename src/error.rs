//! Error types for the Ductus retraining pipeline
//!
//! This module provides structured error definitions using thiserror and a
//! conversion from anyhow::Error for propagation at the binary edge.

use crate::config::ConfigError;
use crate::types::ShapeLabel;
use thiserror::Error;

/// Main error type for Ductus operations
#[derive(Error, Debug)]
pub enum DuctusError {
    /// The data-collection consent gate was not granted
    #[error("Consent required for purpose: {0}")]
    ConsentRequired(String),

    /// Not enough samples to train (overall or for a specific shape)
    #[error("Insufficient data: need at least {required} samples, got {available}{}", label_suffix(.label))]
    InsufficientData {
        label: Option<ShapeLabel>,
        required: usize,
        available: usize,
    },

    /// A single sample failed the quality validator
    #[error("Quality check failed: {0}")]
    QualityCheckFailed(String),

    /// Stroke has no points
    #[error("Stroke contains no points")]
    EmptyStroke,

    /// Black-box training routine or trainer preparation failed
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// A model could not produce a prediction
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// Evaluation results are missing, so no recommendation can be made
    #[error("Missing test results: {0}")]
    MissingTestResults(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Artifact or record storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Encryption collaborator failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Operation was cancelled through its cancellation token
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid operation (e.g., rolling back with no previous model)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn label_suffix(label: &Option<ShapeLabel>) -> String {
    label.map(|l| format!(" for {l}")).unwrap_or_default()
}

impl DuctusError {
    /// Whether the caller can recover without aborting the surrounding run.
    ///
    /// Consent can be re-requested, missing data falls back to synthetic
    /// generation, and quality failures only drop the offending sample.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DuctusError::ConsentRequired(_)
                | DuctusError::InsufficientData { .. }
                | DuctusError::QualityCheckFailed(_)
        )
    }
}

/// Result type alias for Ductus operations
pub type Result<T> = std::result::Result<T, DuctusError>;

/// Convert anyhow::Error to DuctusError
impl From<anyhow::Error> for DuctusError {
    fn from(err: anyhow::Error) -> Self {
        DuctusError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DuctusError::TrainingFailed("backend crashed".to_string());
        assert_eq!(err.to_string(), "Training failed: backend crashed");
    }

    #[test]
    fn test_insufficient_data_display() {
        let err = DuctusError::InsufficientData {
            label: Some(ShapeLabel::Circle),
            required: 100,
            available: 12,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 100 samples, got 12 for circle"
        );

        let err = DuctusError::InsufficientData {
            label: None,
            required: 10,
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data: need at least 10 samples, got 0"
        );
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(DuctusError::ConsentRequired("training".into()).is_recoverable());
        assert!(DuctusError::QualityCheckFailed("too short".into()).is_recoverable());
        assert!(!DuctusError::TrainingFailed("x".into()).is_recoverable());
        assert!(!DuctusError::MissingTestResults("x".into()).is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json");
        assert!(json_err.is_err());

        let err: DuctusError = json_err.unwrap_err().into();
        assert!(matches!(err, DuctusError::Serialization(_)));
    }
}
