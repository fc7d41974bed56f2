//! Consent gate collaborator
//!
//! The pipeline never decides consent itself; it asks the host through
//! [`ConsentGate`] before touching user drawings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// What the collected data will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentPurpose {
    /// Using captured strokes to retrain the shape classifier
    ModelTraining,
    /// Recording production accuracy after a deployment
    PerformanceMonitoring,
}

impl ConsentPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentPurpose::ModelTraining => "model_training",
            ConsentPurpose::PerformanceMonitoring => "performance_monitoring",
        }
    }
}

impl fmt::Display for ConsentPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing a granted consent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub purpose: ConsentPurpose,
    pub data_types: Vec<String>,
    pub retention_days: u32,
}

/// Host-provided consent decision
#[cfg_attr(test, mockall::automock)]
pub trait ConsentGate: Send + Sync {
    fn has_consent(&self, purpose: ConsentPurpose) -> bool;

    /// Details of the consent, if one was granted
    fn consent_record(&self, purpose: ConsentPurpose) -> Option<ConsentRecord>;
}

/// Fixed consent decisions, for the CLI and tests
#[derive(Debug, Clone, Default)]
pub struct StaticConsent {
    granted: HashMap<ConsentPurpose, ConsentRecord>,
}

impl StaticConsent {
    /// Nothing granted
    pub fn denied() -> Self {
        Self::default()
    }

    /// Every purpose granted with stroke data and a 90-day retention
    pub fn granted() -> Self {
        Self::default()
            .grant(ConsentPurpose::ModelTraining, 90)
            .grant(ConsentPurpose::PerformanceMonitoring, 90)
    }

    pub fn grant(mut self, purpose: ConsentPurpose, retention_days: u32) -> Self {
        self.granted.insert(
            purpose,
            ConsentRecord {
                purpose,
                data_types: vec!["stroke_points".to_string(), "shape_labels".to_string()],
                retention_days,
            },
        );
        self
    }
}

impl ConsentGate for StaticConsent {
    fn has_consent(&self, purpose: ConsentPurpose) -> bool {
        self.granted.contains_key(&purpose)
    }

    fn consent_record(&self, purpose: ConsentPurpose) -> Option<ConsentRecord> {
        self.granted.get(&purpose).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_consent() {
        let denied = StaticConsent::denied();
        assert!(!denied.has_consent(ConsentPurpose::ModelTraining));
        assert!(denied.consent_record(ConsentPurpose::ModelTraining).is_none());

        let partial = StaticConsent::denied().grant(ConsentPurpose::ModelTraining, 30);
        assert!(partial.has_consent(ConsentPurpose::ModelTraining));
        assert!(!partial.has_consent(ConsentPurpose::PerformanceMonitoring));
        assert_eq!(
            partial
                .consent_record(ConsentPurpose::ModelTraining)
                .unwrap()
                .retention_days,
            30
        );
    }

    #[test]
    fn test_mock_gate() {
        let mut gate = MockConsentGate::new();
        gate.expect_has_consent()
            .withf(|p| *p == ConsentPurpose::ModelTraining)
            .times(1)
            .return_const(true);
        assert!(gate.has_consent(ConsentPurpose::ModelTraining));
    }
}
