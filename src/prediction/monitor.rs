//! Predictive monitor
//!
//! Background loop that forecasts failures from error counters and runs
//! preventive remediation through the selector and executor.
//!
//! Counters start from the most recent build signal and grow with each
//! recorded error. Submitting a new signal starts a new window. A
//! successful preventive run consumes the errors of its class that the
//! tick saw, so a handled condition does not fire again on the next tick.
//!
//! Ticks never overlap: `tick` flips the state from `Idle` to `Running`
//! with a single compare-exchange and returns `Skipped` if that fails.
//! The state goes back to `Idle` when the tick ends, whether it
//! completed, failed or panicked.

use crate::errors::{RemedyError, Result};
use crate::health::{HealthLevel, HealthTracker};
use crate::learning::store::LearningStore;
use crate::learning::types::LearningEntry;
use crate::patterns::types::{ErrorContext, FaultCategory, Severity};
use crate::prediction::signals::classify_output;
use crate::prediction::types::{
    ErrorCounters, MonitorConfig, MonitorState, Prediction, PredictionClass, TickOutcome, TickReport,
};
use crate::tools::executor::RemediationExecutor;
use crate::tools::registry::CapabilityRegistry;
use crate::tools::selector::ToolSelector;
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shortest and longest forecast horizon in minutes
const MIN_HORIZON_MINUTES: u32 = 5;
const MAX_HORIZON_MINUTES: u32 = 120;


/// Resets the monitor state when a tick ends
struct RunningGuard<'a>(&'a AtomicU8);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(MonitorState::Idle as u8, Ordering::Release);
    }
}

/// Predictive monitor
pub struct PredictiveMonitor {
    state: AtomicU8,
    window: Mutex<ErrorCounters>,
    capabilities: Arc<CapabilityRegistry>,
    selector: ToolSelector,
    executor: Arc<RemediationExecutor>,
    learning: Arc<LearningStore>,
    health: Arc<HealthTracker>,
    config: MonitorConfig,
    shutdown_token: CancellationToken,
}

impl PredictiveMonitor {
    pub fn new(
        capabilities: Arc<CapabilityRegistry>,
        selector: ToolSelector,
        executor: Arc<RemediationExecutor>,
        learning: Arc<LearningStore>,
        health: Arc<HealthTracker>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            state: AtomicU8::new(MonitorState::Idle as u8),
            window: Mutex::new(ErrorCounters::default()),
            capabilities,
            selector,
            executor,
            learning,
            health,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Start a new window from build/validation output
    pub fn submit_signal(&self, output: impl AsRef<str>) {
        let counters = classify_output(output.as_ref());
        *self.window.lock() = counters;
    }

    /// Count one observed error toward the current window
    pub fn record_error(&self, category: FaultCategory) {
        if let Some(class) = PredictionClass::for_category(category) {
            self.window.lock().add(class, 1);
        }
    }

    /// Counters the next tick will see
    pub fn counters(&self) -> ErrorCounters {
        *self.window.lock()
    }

    pub fn state(&self) -> MonitorState {
        MonitorState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Run one tick unless another is in progress
    pub async fn tick(&self) -> TickOutcome {
        if self
            .state
            .compare_exchange(
                MonitorState::Idle as u8,
                MonitorState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            debug!("Predictive tick already running; skipped");
            return TickOutcome::Skipped;
        }
        let _guard = RunningGuard(&self.state);

        match AssertUnwindSafe(self.run_tick()).catch_unwind().await {
            Ok(Ok(report)) => {
                info!(
                    predictions = report.predictions.len(),
                    preventive_runs = report.preventive_runs.len(),
                    "Predictive tick completed"
                );
                TickOutcome::Completed(report)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Predictive tick failed");
                TickOutcome::Failed(e.to_string())
            }
            Err(_) => {
                let err = RemedyError::PredictionTickFailure("tick panicked".to_string());
                warn!(error = %err, "Predictive tick failed");
                TickOutcome::Failed(err.to_string())
            }
        }
    }

    async fn run_tick(&self) -> Result<TickReport> {
        let counters = self.counters();
        let health = self.health.snapshot();
        let predictions = forecast(&counters, health.level, &self.config);

        let mut report = TickReport {
            counters,
            predictions: predictions.clone(),
            preventive_runs: Vec::new(),
        };

        let mut undispatched = Vec::new();
        for prediction in predictions
            .iter()
            .filter(|p| p.probability > self.config.confidence_floor)
        {
            info!(
                class = %prediction.pattern_class,
                probability = prediction.probability,
                minutes = prediction.estimated_minutes_to_failure,
                "Failure predicted"
            );

            let category = prediction.pattern_class.category();
            let capability = match self.selector.select(&self.capabilities, category, &health) {
                Ok(capability) => capability,
                Err(e) => {
                    warn!(class = %prediction.pattern_class, error = %e, "No preventive action");
                    undispatched.push(prediction.pattern_class);
                    continue;
                }
            };

            let context = preventive_context(prediction);
            let result = self.executor.execute(&capability, &context).await;

            let entry = LearningEntry::resolution(category, None, result.success)
                .with_metadata("action", capability.name.as_str())
                .with_metadata("preventive", true)
                .with_metadata("patternClass", prediction.pattern_class.as_str());
            if let Err(e) = self.learning.append(entry) {
                warn!(error = %e, "Preventive outcome not persisted");
            }
            self.health.adjust(result.success);
            if result.success {
                self.window
                    .lock()
                    .consume(prediction.pattern_class, counters.get(prediction.pattern_class));
            }

            report.preventive_runs.push(result);
        }

        if report.preventive_runs.is_empty() && !undispatched.is_empty() {
            let classes: Vec<&str> = undispatched.iter().map(|c| c.as_str()).collect();
            return Err(RemedyError::PredictionTickFailure(format!(
                "no capability for {}",
                classes.join(", ")
            )));
        }

        Ok(report)
    }

    /// Start the background loop
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Stop the background loop
    pub fn stop(&self) {
        self.shutdown_token.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    async fn run(&self) {
        info!(interval_secs = self.config.interval_secs, "Starting predictive monitor");

        let mut ticker = interval(Duration::from_secs(self.config.interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping predictive monitor");
                    break;
                }
            }
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

/// Forecast failures from counters, ranked by probability times severity weight
pub fn forecast(counters: &ErrorCounters, level: HealthLevel, config: &MonitorConfig) -> Vec<Prediction> {
    let mut ranked: Vec<(f64, Prediction)> = PredictionClass::all()
        .into_iter()
        .filter_map(|class| {
            let policy = config.policies.get(class);
            let count = counters.get(class);
            if count <= policy.threshold {
                return None;
            }

            let cap = u64::from(policy.cap.min(100));
            let probability = count.saturating_mul(policy.multiplier).min(cap) as u8;

            let prediction = Prediction {
                pattern_class: class,
                probability,
                estimated_minutes_to_failure: horizon_minutes(policy.base_minutes, level),
                recommended_prevention: class.recommended_prevention().to_string(),
            };
            Some((f64::from(probability) * policy.severity_weight, prediction))
        })
        .collect();

    // Stable sort keeps class order for equal rank
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(_, p)| p).collect()
}

fn horizon_minutes(base: u32, level: HealthLevel) -> u32 {
    let minutes = match level {
        HealthLevel::Poor => base / 2,
        HealthLevel::Excellent => base.saturating_mul(2),
        _ => base,
    };
    minutes.clamp(MIN_HORIZON_MINUTES, MAX_HORIZON_MINUTES)
}

fn preventive_context(prediction: &Prediction) -> ErrorContext {
    ErrorContext::new(format!(
        "Predicted {} ({}%): {}",
        prediction.pattern_class, prediction.probability, prediction.recommended_prevention
    ))
    .with_category(prediction.pattern_class.category())
    .with_severity(Severity::Medium)
    .with_metadata("preventive", serde_json::Value::Bool(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthConfig;
    use crate::learning::statistics::StatisticsTracker;
    use crate::patterns::registry::FaultPatternRegistry;
    use crate::tools::executor::{CapabilityInvoker, ExecutorConfig};
    use crate::tools::types::RemediationAction;
    use async_trait::async_trait;

    struct SleepyInvoker(u64);

    #[async_trait]
    impl CapabilityInvoker for SleepyInvoker {
        async fn invoke(&self, _action: &RemediationAction, _context: &ErrorContext) -> Result<String> {
            tokio::time::sleep(Duration::from_millis(self.0)).await;
            Ok("ok".to_string())
        }
    }

    fn monitor_with(capabilities: CapabilityRegistry, delay_ms: u64) -> (PredictiveMonitor, Arc<LearningStore>) {
        let capabilities = Arc::new(capabilities);
        let executor = Arc::new(RemediationExecutor::new(
            capabilities.clone(),
            Arc::new(SleepyInvoker(delay_ms)),
            Arc::new(StatisticsTracker::new()),
            ExecutorConfig::default(),
        ));
        let learning = Arc::new(LearningStore::in_memory(Arc::new(FaultPatternRegistry::empty())));
        let monitor = PredictiveMonitor::new(
            capabilities,
            ToolSelector::default(),
            executor,
            learning.clone(),
            Arc::new(HealthTracker::new(HealthConfig::default())),
            MonitorConfig::default(),
        );
        (monitor, learning)
    }

    fn type_errors(count: u64) -> ErrorCounters {
        let mut counters = ErrorCounters::default();
        counters.add(PredictionClass::TypeErrorCascade, count);
        counters
    }

    #[test]
    fn test_six_type_errors_predict_sixty() {
        let predictions = forecast(&type_errors(6), HealthLevel::Good, &MonitorConfig::default());
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].pattern_class, PredictionClass::TypeErrorCascade);
        assert_eq!(predictions[0].probability, 60);
        assert_eq!(predictions[0].estimated_minutes_to_failure, 30);
    }

    #[test]
    fn test_threshold_must_be_exceeded() {
        assert!(forecast(&type_errors(5), HealthLevel::Good, &MonitorConfig::default()).is_empty());
    }

    #[test]
    fn test_probability_capped() {
        let predictions = forecast(&type_errors(50), HealthLevel::Good, &MonitorConfig::default());
        assert_eq!(predictions[0].probability, 90);
    }

    #[test]
    fn test_horizon_scales_with_health() {
        let config = MonitorConfig::default();
        let poor = forecast(&type_errors(6), HealthLevel::Poor, &config);
        let excellent = forecast(&type_errors(6), HealthLevel::Excellent, &config);
        assert_eq!(poor[0].estimated_minutes_to_failure, 15);
        assert_eq!(excellent[0].estimated_minutes_to_failure, 60);

        // Dependency base 10 halved to 5 stays at the floor; 120 ceiling holds
        assert_eq!(horizon_minutes(6, HealthLevel::Poor), 5);
        assert_eq!(horizon_minutes(100, HealthLevel::Excellent), 120);
    }

    #[test]
    fn test_ranked_by_weighted_probability() {
        let mut counters = type_errors(9); // 90 * 0.7 = 63
        counters.add(PredictionClass::DependencyConflict, 3); // 75 * 1.0 = 75
        let predictions = forecast(&counters, HealthLevel::Good, &MonitorConfig::default());

        assert_eq!(predictions[0].pattern_class, PredictionClass::DependencyConflict);
        assert_eq!(predictions[1].pattern_class, PredictionClass::TypeErrorCascade);
    }

    #[tokio::test]
    async fn test_recorded_errors_trigger_preventive_run() {
        let (monitor, learning) = monitor_with(CapabilityRegistry::new(), 1);
        for _ in 0..6 {
            monitor.record_error(FaultCategory::Type);
        }

        let TickOutcome::Completed(report) = monitor.tick().await else {
            panic!("tick did not complete");
        };
        assert_eq!(report.predictions[0].probability, 60);
        assert_eq!(report.preventive_runs.len(), 1);
        // linter-autofix (72) outranks type-checker (70) for type errors
        assert_eq!(report.preventive_runs[0].capability_name, "linter-autofix");
        assert_eq!(learning.len(), 1);
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[tokio::test]
    async fn test_new_signal_starts_new_window() {
        let (monitor, _) = monitor_with(CapabilityRegistry::new(), 1);
        monitor.record_error(FaultCategory::Import);
        monitor.submit_signal("error TS2322: Type 'a' is not assignable to type 'b'");

        let counters = monitor.counters();
        assert_eq!(counters.import_errors, 0);
        assert_eq!(counters.type_errors, 1);
    }

    #[tokio::test]
    async fn test_handled_condition_does_not_fire_again() {
        let (monitor, learning) = monitor_with(CapabilityRegistry::new(), 1);
        for _ in 0..3 {
            monitor.record_error(FaultCategory::Dependency);
        }

        assert!(monitor.tick().await.is_completed());
        assert_eq!(monitor.counters().dependency_errors, 0);

        let TickOutcome::Completed(report) = monitor.tick().await else {
            panic!("tick did not complete");
        };
        assert!(report.predictions.is_empty());
        assert!(report.preventive_runs.is_empty());
        assert_eq!(learning.len(), 1);

        // Errors arriving after the run count from zero
        for _ in 0..3 {
            monitor.record_error(FaultCategory::Dependency);
        }
        assert_eq!(monitor.counters().dependency_errors, 3);
    }

    #[tokio::test]
    async fn test_overlapping_tick_skipped() {
        let (monitor, _) = monitor_with(CapabilityRegistry::new(), 200);
        for _ in 0..6 {
            monitor.record_error(FaultCategory::Type);
        }

        let (first, second) = tokio::join!(monitor.tick(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            monitor.tick().await
        });

        assert!(first.is_completed());
        assert_eq!(second, TickOutcome::Skipped);
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[tokio::test]
    async fn test_failed_tick_returns_to_idle() {
        let (monitor, learning) = monitor_with(CapabilityRegistry::empty(), 1);
        for _ in 0..6 {
            monitor.record_error(FaultCategory::Type);
        }

        let outcome = monitor.tick().await;
        assert!(matches!(outcome, TickOutcome::Failed(ref msg) if msg.contains("TYPE_ERROR_CASCADE")));
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert!(learning.is_empty());

        // A failed tick does not block the next one
        assert!(matches!(monitor.tick().await, TickOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_quiet_tick_completes_empty() {
        let (monitor, _) = monitor_with(CapabilityRegistry::new(), 1);
        let TickOutcome::Completed(report) = monitor.tick().await else {
            panic!("tick did not complete");
        };
        assert!(report.predictions.is_empty());
        assert!(report.preventive_runs.is_empty());
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let (monitor, _) = monitor_with(CapabilityRegistry::new(), 1);
        let monitor = Arc::new(monitor);

        let handle = monitor.clone().start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        monitor.stop();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
