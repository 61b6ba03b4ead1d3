//! Remediation executor
//!
//! Invokes one remediation action under a deadline and converts every
//! failure mode (error, non-zero exit, panic, timeout) into an
//! `ExecutionResult`. Nothing raised by an invoker crosses this boundary.
//!
//! After each capability invocation the registry entry is updated:
//! `total_uses += 1`, `last_used_at = now`, and the success rate moves by
//! an exponential moving average. Learned-fix actions have no registry
//! entry and only feed the statistics tracker.

use crate::errors::{RemedyError, Result};
use crate::learning::statistics::StatisticsTracker;
use crate::patterns::types::{ErrorContext, FaultPattern};
use crate::tools::registry::CapabilityRegistry;
use crate::tools::types::{Capability, ExecutionResult, RemediationAction};
use async_trait::async_trait;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Something that can carry out a remediation action
#[async_trait]
pub trait CapabilityInvoker: Send + Sync {
    /// Run the action. `Ok` means the remediation succeeded.
    async fn invoke(&self, action: &RemediationAction, context: &ErrorContext) -> Result<String>;
}

/// Executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Deadline per invocation
    pub timeout_ms: u64,
    /// Weight of the newest sample in the success-rate moving average
    pub ema_weight: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            ema_weight: 0.1,
        }
    }
}

/// Remediation executor
pub struct RemediationExecutor {
    registry: Arc<CapabilityRegistry>,
    invoker: Arc<dyn CapabilityInvoker>,
    statistics: Arc<StatisticsTracker>,
    config: ExecutorConfig,
}

impl RemediationExecutor {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        invoker: Arc<dyn CapabilityInvoker>,
        statistics: Arc<StatisticsTracker>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            registry,
            invoker,
            statistics,
            config,
        }
    }

    /// Execute a capability with the configured timeout
    pub async fn execute(&self, capability: &Capability, context: &ErrorContext) -> ExecutionResult {
        self.execute_with_timeout(capability, context, self.timeout()).await
    }

    /// Execute a capability with a caller-supplied timeout
    pub async fn execute_with_timeout(
        &self,
        capability: &Capability,
        context: &ErrorContext,
        timeout: Duration,
    ) -> ExecutionResult {
        let action = RemediationAction::from_capability(capability);
        let result = self.run(&action, context, timeout).await;

        if self
            .registry
            .record_outcome(&capability.name, result.success, result.duration_ms, self.config.ema_weight)
            .is_none()
        {
            tracing::warn!(capability = %capability.name, "Executed capability is not registered");
        }
        self.statistics.record(&result);
        result
    }

    /// Apply a pattern's suggested fix directly
    pub async fn execute_learned_fix(&self, pattern: &FaultPattern, context: &ErrorContext) -> ExecutionResult {
        let action = RemediationAction::from_pattern(pattern);
        let result = self.run(&action, context, self.timeout()).await;
        self.statistics.record(&result);
        result
    }

    async fn run(&self, action: &RemediationAction, context: &ErrorContext, timeout: Duration) -> ExecutionResult {
        let start = Instant::now();
        let invocation = AssertUnwindSafe(self.invoker.invoke(action, context)).catch_unwind();

        // Dropping the invocation future on timeout cancels it
        let result = match tokio::time::timeout(timeout, invocation).await {
            Ok(Ok(Ok(_))) => ExecutionResult::success(&action.name, start.elapsed()),
            Ok(Ok(Err(e))) => ExecutionResult::failure(&action.name, failure_message(e), start.elapsed()),
            Ok(Err(_)) => ExecutionResult::failure(&action.name, "invoker panicked", start.elapsed()),
            Err(_) => ExecutionResult::timeout(&action.name, start.elapsed()),
        };

        if result.success {
            tracing::info!(action = %action.name, duration_ms = result.duration_ms, "Remediation succeeded");
        } else {
            tracing::warn!(
                action = %action.name,
                duration_ms = result.duration_ms,
                error = result.error_message.as_deref().unwrap_or(""),
                "Remediation failed"
            );
        }
        result
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeout_ms)
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

fn failure_message(err: RemedyError) -> String {
    match err {
        RemedyError::ExecutionFailure(message) => message,
        RemedyError::ExecutionTimeout { .. } => "timeout".to_string(),
        other => other.to_string(),
    }
}
