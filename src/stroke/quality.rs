//! Data quality validation for captured strokes.
//!
//! Rejects degenerate captures (too few points, near-static presses, dragged
//! strokes with flat pressure, geometrically trivial paths) before they reach
//! the training corpus, and emits a continuous quality score for filtering and
//! reporting.

use crate::config::QualityConfig;
use crate::error::{DuctusError, Result};
use crate::stroke::geometry::{std_dev, turning_complexity};
use crate::types::RawStroke;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Sub-score saturation points: a stroke at or above each target earns the
/// full sub-score.
const POINT_COUNT_TARGET: f64 = 50.0;
const DURATION_TARGET_SECS: f64 = 1.0;
const PRESSURE_STD_DEV_TARGET: f64 = 0.1;
const COMPLEXITY_TARGET: f64 = 0.3;

const POINT_COUNT_WEIGHT: f64 = 0.2;
const DURATION_WEIGHT: f64 = 0.2;
const PRESSURE_WEIGHT: f64 = 0.3;
const COMPLEXITY_WEIGHT: f64 = 0.3;

/// Reason a stroke failed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "issue")]
pub enum QualityIssue {
    TooFewPoints { count: usize, minimum: usize },
    TooShort { duration_secs: f64, minimum: f64 },
    FlatPressure { std_dev: f64, minimum: f64 },
    TooSimple { complexity: f64, minimum: f64 },
    /// A coordinate, timestamp or pressure is NaN or infinite
    NonFiniteSample { index: usize },
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityIssue::TooFewPoints { count, minimum } => {
                write!(f, "{} points (minimum {})", count, minimum)
            }
            QualityIssue::TooShort {
                duration_secs,
                minimum,
            } => write!(f, "duration {:.3}s (minimum {:.3}s)", duration_secs, minimum),
            QualityIssue::FlatPressure { std_dev, minimum } => {
                write!(f, "pressure spread {:.4} (minimum {:.4})", std_dev, minimum)
            }
            QualityIssue::TooSimple {
                complexity,
                minimum,
            } => write!(f, "complexity {:.4} (minimum {:.4})", complexity, minimum),
            QualityIssue::NonFiniteSample { index } => {
                write!(f, "non-finite value at point {}", index)
            }
        }
    }
}

/// Measurements and score for one stroke
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub point_count: usize,
    pub duration_secs: f64,
    pub pressure_std_dev: f64,
    pub complexity: f64,
    /// Weighted sum of capped sub-scores, in `[0, 1]`
    pub score: f64,
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Threshold-based stroke validator
#[derive(Debug, Clone, Default)]
pub struct DataQualityValidator {
    config: QualityConfig,
}

impl DataQualityValidator {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Measure a stroke and list every threshold it misses
    pub fn assess(&self, stroke: &RawStroke) -> QualityReport {
        let point_count = stroke.len();
        let duration_secs = stroke.duration();
        let pressures: Vec<f64> = stroke.points.iter().map(|p| p.pressure).collect();
        let pressure_std_dev = std_dev(&pressures);
        let complexity = turning_complexity(&stroke.points);

        let mut issues = Vec::new();
        if let Some(index) = stroke
            .points
            .iter()
            .position(|p| ![p.x, p.y, p.t, p.pressure].iter().all(|v| v.is_finite()))
        {
            issues.push(QualityIssue::NonFiniteSample { index });
        }
        if point_count < self.config.min_points {
            issues.push(QualityIssue::TooFewPoints {
                count: point_count,
                minimum: self.config.min_points,
            });
        }
        if duration_secs < self.config.min_duration_secs {
            issues.push(QualityIssue::TooShort {
                duration_secs,
                minimum: self.config.min_duration_secs,
            });
        }
        if pressure_std_dev < self.config.min_pressure_std_dev {
            issues.push(QualityIssue::FlatPressure {
                std_dev: pressure_std_dev,
                minimum: self.config.min_pressure_std_dev,
            });
        }
        if complexity < self.config.min_complexity {
            issues.push(QualityIssue::TooSimple {
                complexity,
                minimum: self.config.min_complexity,
            });
        }

        QualityReport {
            point_count,
            duration_secs,
            pressure_std_dev,
            complexity,
            score: quality_score(point_count, duration_secs, pressure_std_dev, complexity),
            issues,
        }
    }

    /// Assess a stroke and fail if any threshold is missed
    ///
    /// # Errors
    ///
    /// Returns [`DuctusError::QualityCheckFailed`] listing every issue.
    pub fn validate(&self, stroke: &RawStroke) -> Result<QualityReport> {
        let report = self.assess(stroke);
        if report.passed() {
            Ok(report)
        } else {
            let reasons: Vec<String> = report.issues.iter().map(|i| i.to_string()).collect();
            debug!("Rejected stroke: {}", reasons.join("; "));
            Err(DuctusError::QualityCheckFailed(reasons.join("; ")))
        }
    }
}

/// Weighted quality score; each sub-score is capped at 1.0 so the total lies
/// in `[0, 1]` and never decreases when any input grows.
pub fn quality_score(
    point_count: usize,
    duration_secs: f64,
    pressure_std_dev: f64,
    complexity: f64,
) -> f64 {
    let capped = |value: f64, target: f64| (value.max(0.0) / target).min(1.0);

    POINT_COUNT_WEIGHT * capped(point_count as f64, POINT_COUNT_TARGET)
        + DURATION_WEIGHT * capped(duration_secs, DURATION_TARGET_SECS)
        + PRESSURE_WEIGHT * capped(pressure_std_dev, PRESSURE_STD_DEV_TARGET)
        + COMPLEXITY_WEIGHT * capped(complexity, COMPLEXITY_TARGET)
}
