//! Integration orchestrator: evaluation → recommendation → deployment →
//! monitoring, with rollback at any point after deployment.
//!
//! Status flow:
//!
//! ```text
//! idle → evaluating ─┬─ (no deploy) ──────────────────────→ completed
//!                    └→ deployed → monitoring ─┬──────────→ completed
//!                                              └──────────→ rolled_back
//! any stage error ─────────────────────────────────────────→ failed
//! ```

use crate::config::PipelineConfig;
use crate::deployment::gate::{
    DeploymentRecommendation, GateCriteria, GateSignals, GateThresholds, MonitoringPlan,
    RollbackPlan,
};
use crate::deployment::monitor::{
    MonitorOutcome, MonitorSettings, ProductionMonitor, ProductionSignal, RollbackHandle,
};
use crate::deployment::registry::{ModelRegistry, RollbackRecord, RollbackSignals, RollbackTrigger};
use crate::deployment::risk;
use crate::error::{DuctusError, Result};
use crate::evaluation::{ComparisonReport, PerformanceEvaluator};
use crate::services::storage::ArtifactStore;
use crate::training::progress::{ProgressSnapshot, ProgressTracker};
use crate::training::trainer::TrainedModelArtifact;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Idle,
    Evaluating,
    Deployed,
    Monitoring,
    Completed,
    Failed,
    /// Terminal: the candidate was replaced by the previous model
    RolledBack,
}

impl DeploymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeploymentStatus::Completed | DeploymentStatus::Failed | DeploymentStatus::RolledBack
        )
    }
}

pub struct IntegrationOrchestrator {
    config: PipelineConfig,
    thresholds: GateThresholds,
    evaluator: PerformanceEvaluator,
    registry: Arc<ModelRegistry>,
    store: Option<Arc<dyn ArtifactStore>>,
    tracker: ProgressTracker<DeploymentStatus>,
    /// Candidate promoted by `deploy` and not yet rolled back
    deployed: Option<Uuid>,
}

impl IntegrationOrchestrator {
    pub fn new(config: PipelineConfig, registry: Arc<ModelRegistry>) -> Self {
        Self {
            thresholds: GateThresholds::from_config(&config),
            evaluator: PerformanceEvaluator::from_config(&config),
            registry,
            store: None,
            tracker: ProgressTracker::new(DeploymentStatus::Idle),
            deployed: None,
            config,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_evaluator(mut self, evaluator: PerformanceEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot<DeploymentStatus>> {
        self.tracker.subscribe()
    }

    pub fn progress(&self) -> f64 {
        self.tracker.progress()
    }

    pub fn status(&self) -> DeploymentStatus {
        self.tracker.status()
    }

    pub fn current_step(&self) -> String {
        self.tracker.current_step()
    }

    /// Build a recommendation for `candidate`. A missing report fails
    /// closed: every criterion fails and the summary says why.
    pub async fn recommend(
        &self,
        candidate: &TrainedModelArtifact,
        report: Option<&ComparisonReport>,
    ) -> DeploymentRecommendation {
        let signals = report.map(GateSignals::from_report);
        let criteria = GateCriteria::evaluate(signals.as_ref(), &self.thresholds);
        let regressions = report.map(|r| r.regressions()).unwrap_or_default();
        let risk = risk::assess(signals.as_ref(), &self.thresholds, &regressions);
        let summary = DeploymentRecommendation::describe(&criteria, signals.as_ref(), &risk);

        let baseline_accuracy = report
            .map(|r| r.overall_new_accuracy)
            .unwrap_or_else(|| candidate.accuracy());

        DeploymentRecommendation {
            id: Uuid::new_v4(),
            candidate: Some(candidate.id()),
            should_deploy: criteria.all(),
            confidence: criteria.confidence(),
            criteria,
            signals,
            risk,
            rollback_plan: RollbackPlan {
                restore_model: self.registry.active_id().await,
                degradation_tolerance: self.config.monitoring.degradation_tolerance,
                window_hours: self.config.max_rollback_window_hours,
                steps: vec![
                    "Restore the previously active model reference".to_string(),
                    "Append a rollback record with the triggering signals".to_string(),
                    "Mark the deployment as rolled back".to_string(),
                ],
            },
            monitoring_plan: MonitoringPlan {
                baseline_accuracy,
                check_interval_secs: self.config.monitoring.check_interval_secs,
                window_hours: self.config.max_rollback_window_hours,
                metrics: vec![
                    "production_accuracy".to_string(),
                    "rollback_requests".to_string(),
                ],
            },
            summary,
            created_at: Utc::now(),
        }
    }

    /// Compare `candidate` against the active model and recommend. Never
    /// returns an error: evaluation failures produce a no-deploy record.
    pub async fn evaluate_and_recommend(
        &mut self,
        candidate: &TrainedModelArtifact,
    ) -> DeploymentRecommendation {
        self.tracker.reset(
            DeploymentStatus::Evaluating,
            format!("Evaluating candidate {}", candidate.id()),
        );

        let report = match self.registry.active().await {
            Some(baseline) => {
                match self
                    .evaluator
                    .compare(Arc::clone(&baseline.model), Arc::clone(&candidate.model))
                    .await
                {
                    Ok(report) => Some(report),
                    Err(e) => {
                        warn!("Evaluation failed, recommending no deployment: {}", e);
                        None
                    }
                }
            }
            None => {
                warn!("No active model to compare against; recommending no deployment");
                None
            }
        };
        self.tracker.report(0.5, "Evaluation finished");

        let recommendation = self.recommend(candidate, report.as_ref()).await;
        info!(
            "Deployment recommendation for {}: deploy={} confidence={:.2} risk={}",
            candidate.id(),
            recommendation.should_deploy,
            recommendation.confidence,
            recommendation.risk.overall
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.save_recommendation(&recommendation).await {
                warn!("Failed to persist recommendation {}: {}", recommendation.id, e);
            }
        }

        if recommendation.should_deploy {
            self.tracker
                .set_status(DeploymentStatus::Evaluating, "Awaiting deployment");
        } else {
            self.tracker
                .finish(DeploymentStatus::Completed, recommendation.summary.clone());
        }
        recommendation
    }

    /// Promote an approved candidate
    pub async fn deploy(
        &mut self,
        candidate: TrainedModelArtifact,
        recommendation: &DeploymentRecommendation,
    ) -> Result<()> {
        if !recommendation.should_deploy {
            return Err(DuctusError::InvalidOperation(format!(
                "recommendation {} does not approve deployment",
                recommendation.id
            )));
        }
        if recommendation.candidate != Some(candidate.id()) {
            return Err(DuctusError::InvalidOperation(format!(
                "recommendation {} is for a different candidate",
                recommendation.id
            )));
        }

        let id = candidate.id();
        self.registry.promote(candidate).await;
        self.deployed = Some(id);
        self.tracker
            .set_status(DeploymentStatus::Deployed, format!("Deployed model {}", id));
        self.tracker.report(0.6, format!("Deployed model {}", id));
        Ok(())
    }

    /// Build the production monitor for the current deployment
    pub fn start_monitoring(
        &self,
        recommendation: &DeploymentRecommendation,
        signal: Arc<dyn ProductionSignal>,
        cancel: CancellationToken,
    ) -> (ProductionMonitor, RollbackHandle) {
        let settings =
            MonitorSettings::from_config(&self.config, recommendation.monitoring_plan.baseline_accuracy);
        ProductionMonitor::new(settings, signal, Arc::clone(&self.registry), cancel)
    }

    /// Drive a monitor to completion and record its outcome
    pub async fn supervise(&mut self, monitor: ProductionMonitor) -> Result<MonitorOutcome> {
        self.tracker
            .set_status(DeploymentStatus::Monitoring, "Monitoring production accuracy");

        match monitor.run().await {
            Ok(outcome) => {
                match &outcome {
                    MonitorOutcome::RolledBack(record) => {
                        self.deployed = None;
                        self.persist_rollback(record).await;
                        self.tracker
                            .finish(DeploymentStatus::RolledBack, outcome.describe());
                    }
                    MonitorOutcome::Stable { .. } | MonitorOutcome::Cancelled { .. } => {
                        self.tracker
                            .finish(DeploymentStatus::Completed, outcome.describe());
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                self.tracker
                    .set_status(DeploymentStatus::Failed, format!("Monitoring failed: {}", e));
                Err(e)
            }
        }
    }

    /// Explicit rollback outside a running monitor. Only the candidate this
    /// orchestrator deployed can be rolled back, and only once.
    ///
    /// # Errors
    ///
    /// Returns [`DuctusError::InvalidOperation`] when the deployment already
    /// finished, nothing was deployed, or the active model is no longer the
    /// deployed candidate.
    pub async fn rollback(&mut self, reason: impl Into<String>) -> Result<RollbackRecord> {
        let status = self.status();
        if status.is_terminal() {
            return Err(DuctusError::InvalidOperation(format!(
                "deployment already finished ({:?})",
                status
            )));
        }
        let deployed = self
            .deployed
            .ok_or_else(|| DuctusError::InvalidOperation("no deployed candidate to roll back".to_string()))?;
        let active = self.registry.active().await;
        if active.as_ref().map(|a| a.id()) != Some(deployed) {
            return Err(DuctusError::InvalidOperation(format!(
                "active model is no longer the deployed candidate {}",
                deployed
            )));
        }

        let baseline = active.map(|a| a.accuracy()).unwrap_or_default();
        let record = self
            .registry
            .rollback(
                reason,
                RollbackTrigger::Manual,
                RollbackSignals {
                    baseline_accuracy: baseline,
                    current_accuracy: None,
                    threshold: baseline * self.config.monitoring.degradation_tolerance,
                },
            )
            .await?;

        self.deployed = None;
        self.persist_rollback(&record).await;
        self.tracker
            .finish(DeploymentStatus::RolledBack, format!("Rolled back: {}", record.reason));
        Ok(record)
    }

    async fn persist_rollback(&self, record: &RollbackRecord) {
        if let Some(store) = &self.store {
            if let Err(e) = store.append_rollback(record).await {
                warn!("Failed to persist rollback record {}: {}", record.id, e);
            }
        }
    }
}
