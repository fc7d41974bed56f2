//! Post-deployment production monitor.
//!
//! Checks production accuracy on a fixed interval for a bounded window.
//! The loop can be cancelled at any sleep boundary, and a manual rollback
//! request preempts the wait for the next check.

use crate::config::PipelineConfig;
use crate::deployment::registry::{ModelRegistry, RollbackRecord, RollbackSignals, RollbackTrigger};
use crate::error::{DuctusError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Source of live accuracy readings
#[async_trait]
pub trait ProductionSignal: Send + Sync {
    async fn current_accuracy(&self) -> Result<f64>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub baseline_accuracy: f64,
    pub degradation_tolerance: f64,
    pub check_interval: Duration,
    pub window: Duration,
}

impl MonitorSettings {
    pub fn from_config(config: &PipelineConfig, baseline_accuracy: f64) -> Self {
        Self {
            baseline_accuracy,
            degradation_tolerance: config.monitoring.degradation_tolerance,
            check_interval: config.check_interval(),
            window: config.rollback_window(),
        }
    }

    /// Accuracy below which the model is rolled back
    pub fn threshold(&self) -> f64 {
        self.baseline_accuracy * self.degradation_tolerance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorOutcome {
    /// Window elapsed without degradation
    Stable { checks: usize },
    RolledBack(RollbackRecord),
    /// Stopped through the cancellation token
    Cancelled { checks: usize },
}

impl MonitorOutcome {
    pub fn describe(&self) -> String {
        match self {
            MonitorOutcome::Stable { checks } => {
                format!("Monitoring window completed after {} checks without degradation", checks)
            }
            MonitorOutcome::RolledBack(record) => {
                format!("Rolled back ({}): {}", record.trigger, record.reason)
            }
            MonitorOutcome::Cancelled { checks } => {
                format!("Monitoring cancelled after {} checks", checks)
            }
        }
    }
}

/// Sends out-of-band manual rollback requests to a running monitor
#[derive(Debug, Clone)]
pub struct RollbackHandle {
    tx: mpsc::Sender<String>,
}

impl RollbackHandle {
    pub async fn request(&self, reason: impl Into<String>) -> Result<()> {
        self.tx
            .send(reason.into())
            .await
            .map_err(|_| DuctusError::InvalidOperation("monitor is no longer running".to_string()))
    }
}

enum MonitorEvent {
    Cancelled,
    Manual(String),
    Due,
    Reading(Result<f64>),
}

pub struct ProductionMonitor {
    settings: MonitorSettings,
    signal: Arc<dyn ProductionSignal>,
    registry: Arc<ModelRegistry>,
    manual_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
}

impl ProductionMonitor {
    pub fn new(
        settings: MonitorSettings,
        signal: Arc<dyn ProductionSignal>,
        registry: Arc<ModelRegistry>,
        cancel: CancellationToken,
    ) -> (Self, RollbackHandle) {
        let (tx, manual_rx) = mpsc::channel(4);
        (
            Self {
                settings,
                signal,
                registry,
                manual_rx,
                cancel,
            },
            RollbackHandle { tx },
        )
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Run until the window ends, a rollback happens, or cancellation
    pub async fn run(mut self) -> Result<MonitorOutcome> {
        let start = Instant::now();
        let deadline = start + self.settings.window;
        let mut next_check = start + self.settings.check_interval;
        let mut checks = 0usize;
        let mut last_reading: Option<f64> = None;
        let mut manual_open = true;

        info!(
            "Monitoring production for {:?} every {:?} (threshold {:.3})",
            self.settings.window,
            self.settings.check_interval,
            self.settings.threshold()
        );

        loop {
            let wake = next_check.min(deadline);
            let event = loop {
                tokio::select! {
                    biased;

                    _ = self.cancel.cancelled() => break MonitorEvent::Cancelled,

                    request = self.manual_rx.recv(), if manual_open => match request {
                        Some(reason) => break MonitorEvent::Manual(reason),
                        None => manual_open = false,
                    },

                    _ = sleep_until(wake) => break MonitorEvent::Due,
                }
            };

            let event = match event {
                MonitorEvent::Due => {
                    if next_check > deadline {
                        info!("Monitoring window closed after {} checks", checks);
                        return Ok(MonitorOutcome::Stable { checks });
                    }
                    next_check += self.settings.check_interval;

                    // A slow signal must not hold off cancellation or a manual request
                    let signal = Arc::clone(&self.signal);
                    let read = signal.current_accuracy();
                    tokio::pin!(read);
                    loop {
                        tokio::select! {
                            biased;

                            _ = self.cancel.cancelled() => break MonitorEvent::Cancelled,

                            request = self.manual_rx.recv(), if manual_open => match request {
                                Some(reason) => break MonitorEvent::Manual(reason),
                                None => manual_open = false,
                            },

                            reading = &mut read => break MonitorEvent::Reading(reading),
                        }
                    }
                }
                other => other,
            };

            match event {
                MonitorEvent::Cancelled => {
                    info!("Production monitor cancelled after {} checks", checks);
                    return Ok(MonitorOutcome::Cancelled { checks });
                }
                MonitorEvent::Manual(reason) => {
                    let record = self
                        .rollback(reason, RollbackTrigger::Manual, last_reading)
                        .await?;
                    return Ok(MonitorOutcome::RolledBack(record));
                }
                MonitorEvent::Reading(Ok(accuracy)) => {
                    checks += 1;
                    last_reading = Some(accuracy);
                    debug!("Production accuracy check {}: {:.3}", checks, accuracy);

                    if !(accuracy >= self.settings.threshold()) {
                        let reason = format!(
                            "Accuracy {:.3} fell below {:.3} (baseline {:.3} x {:.2})",
                            accuracy,
                            self.settings.threshold(),
                            self.settings.baseline_accuracy,
                            self.settings.degradation_tolerance
                        );
                        let record = self
                            .rollback(reason, RollbackTrigger::Automatic, last_reading)
                            .await?;
                        return Ok(MonitorOutcome::RolledBack(record));
                    }
                }
                MonitorEvent::Reading(Err(e)) => warn!("Production accuracy check failed: {}", e),
                MonitorEvent::Due => {}
            }
        }
    }

    async fn rollback(
        &self,
        reason: String,
        trigger: RollbackTrigger,
        current_accuracy: Option<f64>,
    ) -> Result<RollbackRecord> {
        self.registry
            .rollback(
                reason,
                trigger,
                RollbackSignals {
                    baseline_accuracy: self.settings.baseline_accuracy,
                    current_accuracy,
                    threshold: self.settings.threshold(),
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::registry::tests::artifact;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed series of readings, repeating the last one
    struct ScriptedSignal {
        readings: Mutex<Vec<Result<f64>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSignal {
        fn new(readings: Vec<Result<f64>>) -> Arc<Self> {
            Arc::new(Self {
                readings: Mutex::new(readings),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ProductionSignal for ScriptedSignal {
        async fn current_accuracy(&self) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut readings = self.readings.lock().unwrap();
            if readings.len() > 1 {
                readings.remove(0)
            } else {
                match readings.first() {
                    Some(Ok(v)) => Ok(*v),
                    _ => Err(DuctusError::Other("no reading".to_string())),
                }
            }
        }
    }

    fn settings(window_ms: u64) -> MonitorSettings {
        MonitorSettings {
            baseline_accuracy: 0.8,
            degradation_tolerance: 0.95,
            check_interval: Duration::from_millis(10),
            window: Duration::from_millis(window_ms),
        }
    }

    async fn registry_with_two_models() -> Arc<ModelRegistry> {
        let registry = Arc::new(ModelRegistry::with_active(artifact(0.6)));
        registry.promote(artifact(0.8)).await;
        registry
    }

    #[tokio::test]
    async fn test_stable_window() {
        let registry = registry_with_two_models().await;
        let signal = ScriptedSignal::new(vec![Ok(0.79)]);
        let (monitor, _handle) =
            ProductionMonitor::new(settings(55), signal.clone(), registry.clone(), CancellationToken::new());

        let outcome = monitor.run().await.unwrap();
        assert!(matches!(outcome, MonitorOutcome::Stable { checks } if checks == 5));
        assert!(registry.rollback_log().await.is_empty());
    }

    #[tokio::test]
    async fn test_degradation_triggers_single_rollback() {
        let registry = registry_with_two_models().await;
        let signal = ScriptedSignal::new(vec![Ok(0.78), Err(DuctusError::Other("offline".into())), Ok(0.70)]);
        let (monitor, _handle) =
            ProductionMonitor::new(settings(1_000), signal.clone(), registry.clone(), CancellationToken::new());

        let outcome = monitor.run().await.unwrap();
        let MonitorOutcome::RolledBack(record) = outcome else {
            panic!("expected rollback, got {:?}", outcome);
        };
        assert_eq!(record.trigger, RollbackTrigger::Automatic);
        assert_eq!(record.signals.current_accuracy, Some(0.70));
        assert!((record.signals.threshold - 0.76).abs() < 1e-12);
        assert_eq!(registry.rollback_log().await.len(), 1);
        assert_eq!(signal.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_manual_rollback_preempts_sleep() {
        let registry = registry_with_two_models().await;
        let signal = ScriptedSignal::new(vec![Ok(0.9)]);
        let mut slow = settings(60_000);
        slow.check_interval = Duration::from_secs(30);
        let (monitor, handle) =
            ProductionMonitor::new(slow, signal.clone(), registry.clone(), CancellationToken::new());

        let task = tokio::spawn(monitor.run());
        handle.request("operator request").await.unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let MonitorOutcome::RolledBack(record) = outcome else {
            panic!("expected manual rollback");
        };
        assert_eq!(record.trigger, RollbackTrigger::Manual);
        assert_eq!(record.reason, "operator request");
        assert_eq!(signal.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancellation_stops_loop() {
        let registry = registry_with_two_models().await;
        let cancel = CancellationToken::new();
        let mut slow = settings(60_000);
        slow.check_interval = Duration::from_secs(30);
        let (monitor, _handle) =
            ProductionMonitor::new(slow, ScriptedSignal::new(vec![Ok(0.9)]), registry.clone(), cancel.clone());

        let task = tokio::spawn(monitor.run());
        cancel.cancel();
        let outcome = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(outcome, MonitorOutcome::Cancelled { checks: 0 });
        assert!(registry.rollback_log().await.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_stop_monitoring() {
        let registry = registry_with_two_models().await;
        let (monitor, handle) = ProductionMonitor::new(
            settings(35),
            ScriptedSignal::new(vec![Ok(0.8)]),
            registry,
            CancellationToken::new(),
        );
        drop(handle);
        let outcome = monitor.run().await.unwrap();
        assert!(matches!(outcome, MonitorOutcome::Stable { checks: 3 }));
    }

    /// Never answers within a test's lifetime
    struct HungSignal;

    #[async_trait]
    impl ProductionSignal for HungSignal {
        async fn current_accuracy(&self) -> Result<f64> {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(0.9)
        }
    }

    #[tokio::test]
    async fn test_manual_rollback_preempts_hung_signal_read() {
        let registry = registry_with_two_models().await;
        let (monitor, handle) =
            ProductionMonitor::new(settings(60_000), Arc::new(HungSignal), registry.clone(), CancellationToken::new());

        let task = tokio::spawn(monitor.run());
        // Let the first check start and block on the signal
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.request("signal unresponsive").await.unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let MonitorOutcome::RolledBack(record) = outcome else {
            panic!("expected manual rollback");
        };
        assert_eq!(record.trigger, RollbackTrigger::Manual);
        assert_eq!(record.signals.current_accuracy, None);
        assert_eq!(registry.rollback_log().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_during_hung_signal_read() {
        let registry = registry_with_two_models().await;
        let cancel = CancellationToken::new();
        let (monitor, _handle) =
            ProductionMonitor::new(settings(60_000), Arc::new(HungSignal), registry.clone(), cancel.clone());

        let task = tokio::spawn(monitor.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        let outcome = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(outcome, MonitorOutcome::Cancelled { checks: 0 });
        assert!(registry.rollback_log().await.is_empty());
    }
}
