//! Deployment decision, production monitoring and rollback.
//!
//! - **gate**: four-criteria go/no-go check and the recommendation record
//! - **risk**: severity-ranked risks with canned mitigations
//! - **registry**: active model, promotion history, rollback log
//! - **monitor**: timed production checks with auto and manual rollback
//! - **integration**: ties evaluation, gate, deployment and monitoring together

pub mod gate;
pub mod integration;
pub mod monitor;
pub mod registry;
pub mod risk;

pub use gate::{DeploymentRecommendation, GateCriteria, GateSignals, GateThresholds};
pub use integration::{DeploymentStatus, IntegrationOrchestrator};
pub use monitor::{MonitorOutcome, MonitorSettings, ProductionMonitor, ProductionSignal, RollbackHandle};
pub use registry::{ModelRegistry, RollbackRecord, RollbackTrigger};
pub use risk::{RiskAssessment, RiskType, Severity};
