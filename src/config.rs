// Pipeline Configuration
//
// Defines the recognized options for retraining, evaluation gating and
// production monitoring, plus per-stage tuning sections.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Real samples required per shape before synthetic fallback kicks in
    pub minimum_samples_per_shape: usize,

    /// Fraction of samples held out for validation
    pub validation_split: f64,

    /// Augmented variants produced per sample
    pub augmentation_multiplier: usize,

    /// Minimum relative accuracy gain (0.10 = 10%)
    pub required_accuracy_improvement: f64,

    /// Minimum relative reduction in frustration (0.15 = 15%)
    pub required_user_satisfaction_improvement: f64,

    /// Minimum approximate significance confidence
    pub statistical_confidence_required: f64,

    /// Length of the post-deployment monitoring window
    pub max_rollback_window_hours: f64,

    /// Seed for shuffling, augmentation and synthetic generation
    pub seed: u64,

    pub stroke: StrokeConfig,
    pub quality: QualityConfig,
    pub trainer: TrainerConfig,
    pub evaluation: EvaluationConfig,
    pub monitoring: MonitoringConfig,
}

/// Normalization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    /// Point count of every normalized stroke
    pub target_points: usize,

    /// Points flattened into the classifier input block
    pub classifier_points: usize,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            target_points: 100,
            classifier_points: 32,
        }
    }
}

/// Data quality validator thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub min_points: usize,
    pub min_duration_secs: f64,
    pub min_pressure_std_dev: f64,
    /// Minimum mean absolute turning angle (radians)
    pub min_complexity: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            min_duration_secs: 0.1,
            min_pressure_std_dev: 0.005,
            min_complexity: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Fewer samples than this fails with insufficient data
    pub minimum_training_samples: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            minimum_training_samples: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Synthetic test strokes generated per imperfection scenario
    pub samples_per_scenario: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            samples_per_scenario: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Seconds between production accuracy checks
    pub check_interval_secs: u64,

    /// Rollback when current accuracy drops below baseline times this factor
    pub degradation_tolerance: f64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 300, // 5 minutes
            degradation_tolerance: 0.95,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            minimum_samples_per_shape: 150,
            validation_split: 0.2,
            augmentation_multiplier: 3,
            required_accuracy_improvement: 0.10,
            required_user_satisfaction_improvement: 0.15,
            statistical_confidence_required: 0.95,
            max_rollback_window_hours: 24.0,
            seed: 42,
            stroke: StrokeConfig::default(),
            quality: QualityConfig::default(),
            trainer: TrainerConfig::default(),
            evaluation: EvaluationConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Default location: `<config dir>/ductus/ductus.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ductus")
            .join("ductus.toml")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(ConfigError::ValidationError(
                "validation_split must be in (0, 1)".to_string(),
            ));
        }

        if self.augmentation_multiplier == 0 {
            return Err(ConfigError::ValidationError(
                "augmentation_multiplier must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            (
                "required_accuracy_improvement",
                self.required_accuracy_improvement,
            ),
            (
                "required_user_satisfaction_improvement",
                self.required_user_satisfaction_improvement,
            ),
            (
                "statistical_confidence_required",
                self.statistical_confidence_required,
            ),
            (
                "monitoring.degradation_tolerance",
                self.monitoring.degradation_tolerance,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.max_rollback_window_hours <= 0.0 || !self.max_rollback_window_hours.is_finite() {
            return Err(ConfigError::ValidationError(
                "max_rollback_window_hours must be positive".to_string(),
            ));
        }

        if self.stroke.target_points < 2 || self.stroke.classifier_points < 2 {
            return Err(ConfigError::ValidationError(
                "stroke.target_points and stroke.classifier_points must be at least 2"
                    .to_string(),
            ));
        }

        if self.monitoring.check_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "monitoring.check_interval_secs must be positive".to_string(),
            ));
        }

        if self.evaluation.samples_per_scenario < 2 {
            return Err(ConfigError::ValidationError(
                "evaluation.samples_per_scenario must be at least 2".to_string(),
            ));
        }

        Ok(())
    }

    /// Monitoring window as a Duration
    pub fn rollback_window(&self) -> Duration {
        Duration::from_secs_f64(self.max_rollback_window_hours * 3600.0)
    }

    /// Interval between production checks
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring.check_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stroke.target_points, 100);
        assert_eq!(config.rollback_window(), Duration::from_secs(86400));
        assert_eq!(config.check_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            minimum_samples_per_shape = 200
            validation_split = 0.25

            [stroke]
            target_points = 64
            "#,
        )
        .unwrap();

        assert_eq!(config.minimum_samples_per_shape, 200);
        assert_eq!(config.validation_split, 0.25);
        assert_eq!(config.stroke.target_points, 64);
        assert_eq!(config.stroke.classifier_points, 32);
        assert_eq!(config.augmentation_multiplier, 3);
    }

    #[test]
    fn test_invalid_split_rejected() {
        let result = PipelineConfig::from_toml("validation_split = 1.5");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let result = PipelineConfig::from_toml("statistical_confidence_required = 2.0");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = PipelineConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&rendered).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ductus.toml");
        std::fs::write(&path, "augmentation_multiplier = 5\n").unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.augmentation_multiplier, 5);

        let missing = PipelineConfig::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::IoError(_))));
    }
}
