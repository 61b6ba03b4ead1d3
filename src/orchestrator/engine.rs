//! Orchestrator - single entry point of the diagnosis pipeline
//!
//! Sequences one event through:
//! - Pattern matching
//! - Learned-fix shortcut (high-confidence match with a proven fix)
//! - Capability selection and execution
//! - Learning ledger update and insight analyzers
//! - Health accumulation
//!
//! Every call returns an `OrchestrationResult`; errors and panics inside
//! the pipeline are folded into `success: false`.

use crate::config::EngineConfig;
use crate::errors::{RemedyError, Result};
use crate::health::{HealthSnapshot, HealthTracker};
use crate::learning::analyzers::{default_analyzers, run_analyzers, AnalyzerState, InsightAnalyzer, Observation};
use crate::learning::statistics::{Statistics, StatisticsTracker};
use crate::learning::store::LearningStore;
use crate::learning::types::NexusData;
use crate::orchestrator::types::{Event, OrchestrationResult};
use crate::patterns::matcher::PatternMatcher;
use crate::patterns::registry::FaultPatternRegistry;
use crate::patterns::types::{FaultCategory, FaultPattern, Match};
use crate::prediction::monitor::PredictiveMonitor;
use crate::tools::executor::{CapabilityInvoker, RemediationExecutor};
use crate::tools::registry::CapabilityRegistry;
use crate::tools::selector::ToolSelector;
use crate::tools::types::ExecutionResult;
use futures_util::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Learned-fix thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Minimum match confidence to apply a pattern's fix directly
    pub learned_fix_confidence: u8,
    /// Minimum observed success rate of that pattern
    pub learned_fix_success_rate: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            learned_fix_confidence: 90,
            learned_fix_success_rate: 80.0,
        }
    }
}

/// Diagnosis pipeline orchestrator
pub struct Orchestrator {
    patterns: Arc<FaultPatternRegistry>,
    matcher: PatternMatcher,
    capabilities: Arc<CapabilityRegistry>,
    selector: ToolSelector,
    executor: Arc<RemediationExecutor>,
    learning: Arc<LearningStore>,
    statistics: Arc<StatisticsTracker>,
    health: Arc<HealthTracker>,
    monitor: Arc<PredictiveMonitor>,
    analyzers: Vec<Box<dyn InsightAnalyzer>>,
    event_counts: Mutex<HashMap<String, u64>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Wire the pipeline from explicit registries and an invoker
    pub fn new(
        config: EngineConfig,
        patterns: Arc<FaultPatternRegistry>,
        capabilities: Arc<CapabilityRegistry>,
        invoker: Arc<dyn CapabilityInvoker>,
    ) -> Result<Self> {
        let learning = Arc::new(LearningStore::new(patterns.clone(), config.learning.clone())?);
        let statistics = Arc::new(StatisticsTracker::new());
        let health = Arc::new(HealthTracker::new(config.health.clone()));
        let selector = ToolSelector::new(config.selector.clone());

        let executor = Arc::new(RemediationExecutor::new(
            capabilities.clone(),
            invoker,
            statistics.clone(),
            config.executor.clone(),
        ));

        let monitor = Arc::new(PredictiveMonitor::new(
            capabilities.clone(),
            selector.clone(),
            executor.clone(),
            learning.clone(),
            health.clone(),
            config.monitor.clone(),
        ));

        Ok(Self {
            patterns,
            matcher: PatternMatcher::new(config.matcher.clone()),
            capabilities,
            selector,
            executor,
            learning,
            statistics,
            health,
            monitor,
            analyzers: default_analyzers(),
            event_counts: Mutex::new(HashMap::new()),
            config: config.orchestrator,
        })
    }

    /// Default config with the built-in pattern and capability catalogs
    pub fn with_defaults(invoker: Arc<dyn CapabilityInvoker>) -> Result<Self> {
        Self::new(
            EngineConfig::default(),
            Arc::new(FaultPatternRegistry::new()),
            Arc::new(CapabilityRegistry::new()),
            invoker,
        )
    }

    /// Process one event
    pub async fn process_event(&self, event: Event) -> OrchestrationResult {
        self.process_event_with_cancel(event, &CancellationToken::new()).await
    }

    /// Process one event, giving up before remediation if `cancel` is set
    pub async fn process_event_with_cancel(&self, event: Event, cancel: &CancellationToken) -> OrchestrationResult {
        let start = Instant::now();
        let event_type = event.event_type.clone();

        match AssertUnwindSafe(self.run_pipeline(event, cancel, start)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::error!(event_type = %event_type, error = %e, "Pipeline failed");
                OrchestrationResult::failed(e.to_string(), elapsed_ms(start), self.health.snapshot())
            }
            Err(_) => {
                tracing::error!(event_type = %event_type, "Pipeline panicked");
                OrchestrationResult::failed("pipeline panicked", elapsed_ms(start), self.health.snapshot())
            }
        }
    }

    async fn run_pipeline(
        &self,
        event: Event,
        cancel: &CancellationToken,
        start: Instant,
    ) -> Result<OrchestrationResult> {
        let context = event.to_error_context();

        let matches = self.matcher.match_context(&self.patterns, &context);
        let best = matches.first().cloned();
        let category = self.resolve_category(&event, context.category, best.as_ref());

        tracing::info!(
            event_type = %event.event_type,
            category = %category,
            matches = matches.len(),
            best = best.as_ref().map(|m| m.pattern_id.as_str()).unwrap_or("-"),
            "Event diagnosed"
        );

        if cancel.is_cancelled() {
            tracing::info!(event_type = %event.event_type, "Event cancelled before remediation");
            let mut result = OrchestrationResult::failed("cancelled", elapsed_ms(start), self.health.snapshot());
            result.category = Some(category);
            return Ok(result);
        }

        let occurrences = self.count_event(&event.event_type);
        let prior_failures = self.learning.failure_count(category);
        self.monitor.record_error(category);

        let pattern_id = best.as_ref().map(|m| m.pattern_id.clone());
        let mut executions: Vec<ExecutionResult> = Vec::new();
        let mut pattern_applied = None;
        let mut tool_used = None;
        let mut selection_error: Option<RemedyError> = None;

        // Learned fix: skip selection when the top match has a proven fix
        if let Some(m) = &best {
            if let Some(pattern) = self.learned_fix_candidate(m) {
                tracing::info!(pattern = %pattern.id, confidence = m.confidence, "Applying learned fix");
                let result = self.executor.execute_learned_fix(&pattern, &context).await;
                pattern_applied = Some(pattern.id.clone());
                executions.push(result);
            }
        }

        let resolved_by_learned_fix = executions.last().map(|r| r.success).unwrap_or(false);
        if !resolved_by_learned_fix {
            match self.selector.select(&self.capabilities, category, &self.health.snapshot()) {
                Ok(capability) => {
                    let result = self.executor.execute(&capability, &context).await;
                    tool_used = Some(capability.name.clone());
                    executions.push(result);
                }
                Err(e) => selection_error = Some(e),
            }
        }

        for result in &executions {
            if let Err(e) = self.learning.record_resolution(
                category,
                pattern_id.as_deref(),
                &result.capability_name,
                result.success,
            ) {
                tracing::warn!(error = %e, "Resolution not persisted");
            }
        }

        let success = executions.last().map(|r| r.success).unwrap_or(false);
        let observation = Observation {
            event_type: event.event_type.clone(),
            category,
            severity: context.severity,
            pattern_id: pattern_id.clone(),
            actions: executions.iter().map(|r| r.capability_name.clone()).collect(),
            success,
            duration_ms: executions.iter().map(|r| r.duration_ms).sum(),
        };
        let state = AnalyzerState {
            category_failures: prior_failures,
            event_occurrences: occurrences,
            latency_threshold_ms: self.learning.config().latency_threshold_ms,
            manual_recurrence_threshold: self.learning.config().manual_recurrence_threshold,
        };
        for insight in run_analyzers(&self.analyzers, &observation, &state) {
            tracing::info!(kind = insight.kind.as_str(), category = %category, "Insight recorded");
            if let Err(e) = self.learning.append(insight) {
                tracing::warn!(error = %e, "Insight not persisted");
            }
        }

        let health = self.health.record_outcome(success);

        let error = if success {
            None
        } else if let Some(e) = selection_error {
            Some(e.to_string())
        } else {
            executions
                .last()
                .and_then(|r| r.error_message.clone())
                .or_else(|| Some("remediation failed".to_string()))
        };

        let attempted = !executions.is_empty();
        let result = OrchestrationResult {
            success,
            tool_used,
            learning_applied: pattern_applied.is_some(),
            pattern_applied,
            execution_time_ms: elapsed_ms(start),
            health,
            errors_resolved: u64::from(success),
            total_errors: u64::from(attempted),
            remediation_attempted: attempted,
            category: Some(category),
            error,
        };

        tracing::info!(
            event_type = %event.event_type,
            success = result.success,
            tool = result.tool_used.as_deref().unwrap_or("-"),
            learning_applied = result.learning_applied,
            execution_time_ms = result.execution_time_ms,
            "Event processed"
        );

        Ok(result)
    }

    /// Explicit hint, then the matched pattern's category, then the event type
    fn resolve_category(&self, event: &Event, hint: Option<FaultCategory>, best: Option<&Match>) -> FaultCategory {
        hint.or_else(|| {
            best.and_then(|m| self.patterns.get(&m.pattern_id))
                .map(|p| p.category)
        })
        .or_else(|| FaultCategory::from_hint(&event.event_type))
        .unwrap_or(FaultCategory::Unknown)
    }

    fn learned_fix_candidate(&self, best: &Match) -> Option<FaultPattern> {
        if best.confidence < self.config.learned_fix_confidence {
            return None;
        }
        self.patterns
            .get(&best.pattern_id)
            .filter(|p| p.observed_success_rate >= self.config.learned_fix_success_rate)
    }

    fn count_event(&self, event_type: &str) -> u64 {
        let mut counts = self.event_counts.lock();
        let count = counts.entry(event_type.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Aggregate execution statistics
    pub fn get_statistics(&self) -> Statistics {
        self.statistics.statistics(&self.capabilities)
    }

    /// Ledger grouped by kind
    pub fn get_nexus_data(&self) -> NexusData {
        self.learning.nexus()
    }

    pub fn health(&self) -> HealthSnapshot {
        self.health.snapshot()
    }

    pub fn predictive_monitor(&self) -> Arc<PredictiveMonitor> {
        self.monitor.clone()
    }

    pub fn learning_store(&self) -> &Arc<LearningStore> {
        &self.learning
    }

    pub fn patterns(&self) -> &Arc<FaultPatternRegistry> {
        &self.patterns
    }

    pub fn capabilities(&self) -> &Arc<CapabilityRegistry> {
        &self.capabilities
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
