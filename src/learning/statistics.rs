//! Execution statistics
//!
//! Running totals over every execution result, reactive and preventive,
//! combined with the capability registry for `get_statistics`.

use crate::tools::registry::CapabilityRegistry;
use crate::tools::types::ExecutionResult;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Per-capability usage row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityUsage {
    pub name: String,
    pub total_uses: u64,
    pub success_rate: f64,
    pub avg_execution_cost_ms: f64,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Aggregate statistics exposed to collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_executions: u64,
    /// Share of successful executions (0-100)
    pub success_rate: f64,
    /// Mean execution time in milliseconds
    pub avg_execution_time: f64,
    pub capability_usage: Vec<CapabilityUsage>,
}

#[derive(Debug, Default, Clone)]
struct Totals {
    executions: u64,
    successes: u64,
    duration_ms: u64,
}

/// Statistics tracker
#[derive(Debug, Default)]
pub struct StatisticsTracker {
    totals: Mutex<Totals>,
}

impl StatisticsTracker {
    /// Create new statistics tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one execution result
    pub fn record(&self, result: &ExecutionResult) {
        let mut totals = self.totals.lock();
        totals.executions += 1;
        if result.success {
            totals.successes += 1;
        }
        totals.duration_ms = totals.duration_ms.saturating_add(result.duration_ms);
    }

    pub fn total_executions(&self) -> u64 {
        self.totals.lock().executions
    }

    /// Build the statistics view
    pub fn statistics(&self, registry: &CapabilityRegistry) -> Statistics {
        let totals = self.totals.lock().clone();

        let (success_rate, avg_execution_time) = if totals.executions == 0 {
            (0.0, 0.0)
        } else {
            (
                totals.successes as f64 / totals.executions as f64 * 100.0,
                totals.duration_ms as f64 / totals.executions as f64,
            )
        };

        let capability_usage = registry
            .snapshot()
            .into_iter()
            .map(|c| CapabilityUsage {
                name: c.name,
                total_uses: c.total_uses,
                success_rate: c.success_rate,
                avg_execution_cost_ms: c.avg_execution_cost_ms,
                last_used_at: c.last_used_at,
            })
            .collect();

        Statistics {
            total_executions: totals.executions,
            success_rate,
            avg_execution_time,
            capability_usage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_statistics() {
        let tracker = StatisticsTracker::new();
        let stats = tracker.statistics(&CapabilityRegistry::empty());
        assert_eq!(stats.total_executions, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.capability_usage.is_empty());
    }

    #[test]
    fn test_record_results() {
        let tracker = StatisticsTracker::new();
        tracker.record(&ExecutionResult::success("a", Duration::from_millis(100)));
        tracker.record(&ExecutionResult::failure("b", "x", Duration::from_millis(300)));

        let stats = tracker.statistics(&CapabilityRegistry::new());
        assert_eq!(stats.total_executions, 2);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(stats.avg_execution_time, 200.0);
        assert_eq!(stats.capability_usage.len(), 10);
    }
}
