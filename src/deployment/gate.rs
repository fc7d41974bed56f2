//! Deployment gate and recommendation record.
//!
//! A candidate is deployed only when all four criteria hold:
//!
//! - accuracy improvement ≥ required minimum
//! - user-satisfaction improvement ≥ required minimum
//! - approximate significance confidence ≥ required confidence
//! - robustness (mean per-scenario improvement) > 0
//!
//! Missing or non-finite signals fail every criterion they feed, so the gate
//! fails closed.

use crate::config::PipelineConfig;
use crate::deployment::risk::RiskAssessment;
use crate::evaluation::ComparisonReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimums a candidate has to reach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateThresholds {
    /// Relative accuracy gain as a fraction (0.10 = 10%)
    pub accuracy_improvement: f64,
    /// Relative frustration reduction as a fraction
    pub satisfaction_improvement: f64,
    pub confidence: f64,
}

impl GateThresholds {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            accuracy_improvement: config.required_accuracy_improvement,
            satisfaction_improvement: config.required_user_satisfaction_improvement,
            confidence: config.statistical_confidence_required,
        }
    }
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Evaluator outputs the gate looks at, all as fractions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateSignals {
    pub accuracy_improvement: f64,
    pub satisfaction_improvement: f64,
    pub confidence: f64,
    pub robustness: f64,
}

impl GateSignals {
    pub fn from_report(report: &ComparisonReport) -> Self {
        Self {
            accuracy_improvement: report.overall_improvement_pct / 100.0,
            satisfaction_improvement: report.satisfaction_improvement,
            confidence: report.significance.confidence,
            robustness: report.robustness,
        }
    }
}

/// Outcome of each criterion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateCriteria {
    pub accuracy: bool,
    pub satisfaction: bool,
    pub significance: bool,
    pub robustness: bool,
}

impl GateCriteria {
    pub fn evaluate(signals: Option<&GateSignals>, thresholds: &GateThresholds) -> Self {
        let Some(s) = signals else {
            return Self::default();
        };
        // NaN compares false, so broken signals fail their criterion
        Self {
            accuracy: s.accuracy_improvement >= thresholds.accuracy_improvement,
            satisfaction: s.satisfaction_improvement >= thresholds.satisfaction_improvement,
            significance: s.confidence >= thresholds.confidence,
            robustness: s.robustness > 0.0,
        }
    }

    pub fn all(&self) -> bool {
        self.accuracy && self.satisfaction && self.significance && self.robustness
    }

    pub fn met(&self) -> usize {
        [self.accuracy, self.satisfaction, self.significance, self.robustness]
            .iter()
            .filter(|c| **c)
            .count()
    }

    /// Fraction of the four criteria met
    pub fn confidence(&self) -> f64 {
        self.met() as f64 / 4.0
    }

    /// Names of the failing criteria
    pub fn failures(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if !self.accuracy {
            failed.push("accuracy");
        }
        if !self.satisfaction {
            failed.push("user satisfaction");
        }
        if !self.significance {
            failed.push("statistical significance");
        }
        if !self.robustness {
            failed.push("robustness");
        }
        failed
    }
}

/// How to return to the previous model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackPlan {
    /// Model restored on rollback, if one is active
    pub restore_model: Option<Uuid>,
    /// Rollback when accuracy falls below `baseline * degradation_tolerance`
    pub degradation_tolerance: f64,
    pub window_hours: f64,
    pub steps: Vec<String>,
}

/// What is watched after deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringPlan {
    pub baseline_accuracy: f64,
    pub check_interval_secs: u64,
    pub window_hours: f64,
    pub metrics: Vec<String>,
}

/// Go/no-go decision for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecommendation {
    pub id: Uuid,
    pub candidate: Option<Uuid>,
    pub should_deploy: bool,
    /// Fraction of gate criteria met
    pub confidence: f64,
    pub criteria: GateCriteria,
    pub signals: Option<GateSignals>,
    pub risk: RiskAssessment,
    pub rollback_plan: RollbackPlan,
    pub monitoring_plan: MonitoringPlan,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl DeploymentRecommendation {
    /// Human-readable one-paragraph summary
    pub fn describe(criteria: &GateCriteria, signals: Option<&GateSignals>, risk: &RiskAssessment) -> String {
        let Some(s) = signals else {
            return format!(
                "Do not deploy: evaluation results are missing. Overall risk {}.",
                risk.overall
            );
        };

        let figures = format!(
            "accuracy {:+.1}%, satisfaction {:+.1}%, confidence {:.2}, robustness {:+.3}",
            s.accuracy_improvement * 100.0,
            s.satisfaction_improvement * 100.0,
            s.confidence,
            s.robustness
        );

        if criteria.all() {
            format!(
                "Deploy: all criteria met ({}). Overall risk {}.",
                figures, risk.overall
            )
        } else {
            format!(
                "Do not deploy: {} below requirement ({}). Overall risk {}.",
                criteria.failures().join(", "),
                figures,
                risk.overall
            )
        }
    }
}
