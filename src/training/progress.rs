//! Progress and status publication for long-running pipeline stages.
//!
//! A [`ProgressTracker`] owns a `tokio::sync::watch` channel carrying the
//! latest [`ProgressSnapshot`]. UI consumers either poll the read-only
//! accessors or `subscribe()` for change notifications. Within one run the
//! published fraction never decreases; only `reset` starts a new run at zero.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle of a training run (trainer and training orchestrator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    Idle,
    Preparing,
    Training,
    Completed,
    Failed,
}

impl TrainingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrainingStatus::Completed | TrainingStatus::Failed)
    }
}

/// Point-in-time view of a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot<S> {
    /// Completed fraction in `[0, 1]`
    pub fraction: f64,
    pub status: S,
    /// Human-readable description of the current step
    pub step: String,
}

/// Shared publisher of progress snapshots
#[derive(Debug, Clone)]
pub struct ProgressTracker<S> {
    tx: Arc<watch::Sender<ProgressSnapshot<S>>>,
}

impl<S> ProgressTracker<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot {
            fraction: 0.0,
            status: initial,
            step: String::new(),
        });
        Self { tx: Arc::new(tx) }
    }

    /// Receiver notified on every published change
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot<S>> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> ProgressSnapshot<S> {
        self.tx.borrow().clone()
    }

    pub fn progress(&self) -> f64 {
        self.tx.borrow().fraction
    }

    pub fn status(&self) -> S {
        self.tx.borrow().status.clone()
    }

    pub fn current_step(&self) -> String {
        self.tx.borrow().step.clone()
    }

    /// Start a new run: fraction back to zero
    pub fn reset(&self, status: S, step: impl Into<String>) {
        let step = step.into();
        self.tx.send_modify(|snap| {
            snap.fraction = 0.0;
            snap.status = status;
            snap.step = step;
        });
    }

    /// Publish a new fraction; values below the current one are ignored
    pub fn report(&self, fraction: f64, step: impl Into<String>) {
        let step = step.into();
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.tx.send_modify(|snap| {
            snap.fraction = snap.fraction.max(fraction);
            snap.step = step;
        });
    }

    /// Change status (and step) without touching the fraction
    pub fn set_status(&self, status: S, step: impl Into<String>) {
        let step = step.into();
        self.tx.send_modify(|snap| {
            snap.status = status;
            snap.step = step;
        });
    }

    /// Mark the run finished at 100%
    pub fn finish(&self, status: S, step: impl Into<String>) {
        let step = step.into();
        self.tx.send_modify(|snap| {
            snap.fraction = 1.0;
            snap.status = status;
            snap.step = step;
        });
    }

    /// Sub-range view mapping a child's `[0, 1]` onto `[start, end]`
    pub fn scope(&self, start: f64, end: f64) -> ProgressScope<S> {
        ProgressScope {
            tracker: self.clone(),
            start,
            end,
        }
    }
}

/// Remapped view onto a tracker
#[derive(Debug, Clone)]
pub struct ProgressScope<S> {
    tracker: ProgressTracker<S>,
    start: f64,
    end: f64,
}

impl<S> ProgressScope<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Report child progress in `[0, 1]`
    pub fn report(&self, fraction: f64, step: impl Into<String>) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.tracker
            .report(self.start + fraction * (self.end - self.start), step);
    }

    /// Map a child fraction to the parent range without publishing
    pub fn map(&self, fraction: f64) -> f64 {
        self.start + fraction.clamp(0.0, 1.0) * (self.end - self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotone() {
        let tracker = ProgressTracker::new(TrainingStatus::Idle);
        tracker.report(0.5, "half");
        tracker.report(0.2, "regress");
        assert_eq!(tracker.progress(), 0.5);
        assert_eq!(tracker.current_step(), "regress");

        tracker.report(7.0, "overflow");
        assert_eq!(tracker.progress(), 1.0);

        tracker.reset(TrainingStatus::Preparing, "new run");
        assert_eq!(tracker.progress(), 0.0);
        assert_eq!(tracker.status(), TrainingStatus::Preparing);
    }

    #[test]
    fn test_scope_remaps_range() {
        let tracker = ProgressTracker::new(TrainingStatus::Training);
        let scope = tracker.scope(0.3, 1.0);
        scope.report(0.5, "training");
        assert!((tracker.progress() - 0.65).abs() < 1e-12);
        assert!((scope.map(1.0) - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let tracker = ProgressTracker::new(TrainingStatus::Idle);
        let mut rx = tracker.subscribe();

        tracker.set_status(TrainingStatus::Training, "fitting");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status, TrainingStatus::Training);

        tracker.finish(TrainingStatus::Completed, "done");
        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.fraction, 1.0);
        assert!(snap.status.is_terminal());
    }
}
