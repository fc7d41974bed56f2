//! Risk assessment for a deployment candidate

use crate::deployment::gate::{GateSignals, GateThresholds};
use crate::evaluation::ImperfectionScenario;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskType {
    /// Gain is below or barely above the required minimum
    MarginalImprovement,
    /// Significance estimate is weak or missing
    StatisticalUncertainty,
    /// Users may not notice or may be disrupted by the change
    AdoptionRisk,
    /// Some scenario gets worse, or robustness is flat
    RegressionRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub kind: RiskType,
    pub severity: Severity,
    pub description: String,
    pub mitigation: String,
}

impl Risk {
    fn new(kind: RiskType, severity: Severity, description: String) -> Self {
        Self {
            kind,
            severity,
            description,
            mitigation: mitigation(kind).to_string(),
        }
    }
}

fn mitigation(kind: RiskType) -> &'static str {
    match kind {
        RiskType::MarginalImprovement => {
            "Collect more real samples and retrain before the next cycle"
        }
        RiskType::StatisticalUncertainty => {
            "Increase samples per scenario and re-run the evaluation"
        }
        RiskType::AdoptionRisk => "Roll out gradually and watch user feedback",
        RiskType::RegressionRisk => {
            "Target the regressed scenarios with augmentation and keep auto-rollback enabled"
        }
    }
}

/// Identified risks plus the overall (maximum) severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risks: Vec<Risk>,
    pub overall: Severity,
}

impl RiskAssessment {
    pub fn from_risks(risks: Vec<Risk>) -> Self {
        let overall = risks
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or(Severity::Low);
        Self { risks, overall }
    }

    pub fn has(&self, kind: RiskType) -> bool {
        self.risks.iter().any(|r| r.kind == kind)
    }
}

/// Enumerate risks for a candidate. `regressions` lists scenarios where the
/// candidate scores below the baseline.
pub fn assess(
    signals: Option<&GateSignals>,
    thresholds: &GateThresholds,
    regressions: &[ImperfectionScenario],
) -> RiskAssessment {
    let Some(s) = signals else {
        return RiskAssessment::from_risks(vec![Risk::new(
            RiskType::StatisticalUncertainty,
            Severity::Critical,
            "No evaluation results available".to_string(),
        )]);
    };

    let mut risks = Vec::new();

    if !(s.accuracy_improvement >= thresholds.accuracy_improvement * 1.5) {
        let severity = if s.accuracy_improvement >= thresholds.accuracy_improvement {
            Severity::Medium
        } else {
            Severity::High
        };
        risks.push(Risk::new(
            RiskType::MarginalImprovement,
            severity,
            format!(
                "Accuracy improvement {:.1}% against a {:.1}% minimum",
                s.accuracy_improvement * 100.0,
                thresholds.accuracy_improvement * 100.0
            ),
        ));
    }

    if !(s.confidence >= thresholds.confidence) {
        let severity = if s.confidence >= thresholds.confidence * 0.5 {
            Severity::Medium
        } else {
            Severity::High
        };
        risks.push(Risk::new(
            RiskType::StatisticalUncertainty,
            severity,
            format!(
                "Significance confidence {:.2} below required {:.2}",
                s.confidence, thresholds.confidence
            ),
        ));
    }

    if !(s.satisfaction_improvement >= thresholds.satisfaction_improvement) {
        risks.push(Risk::new(
            RiskType::AdoptionRisk,
            Severity::Medium,
            format!(
                "Frustration reduction {:.1}% may go unnoticed by users",
                s.satisfaction_improvement * 100.0
            ),
        ));
    }

    if !regressions.is_empty() || s.robustness < 0.0 {
        let severity = if s.robustness < 0.0 || s.accuracy_improvement < 0.0 {
            Severity::Critical
        } else {
            Severity::High
        };
        let names: Vec<&str> = regressions.iter().map(|r| r.as_str()).collect();
        let description = if names.is_empty() {
            format!("Mean per-scenario improvement is {:+.3}", s.robustness)
        } else {
            format!("Candidate regresses on: {}", names.join(", "))
        };
        risks.push(Risk::new(RiskType::RegressionRisk, severity, description));
    } else if !(s.robustness > 0.0) {
        // Flat: nothing got worse, but nothing got more robust either
        risks.push(Risk::new(
            RiskType::RegressionRisk,
            Severity::Medium,
            format!("Robustness is flat ({:+.3}); no scenario improved on average", s.robustness),
        ));
    }

    RiskAssessment::from_risks(risks)
}
