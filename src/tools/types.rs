//! Capability and execution types
//!
//! Core types for remediation capabilities, the actions handed to an
//! invoker, and execution results.

use crate::patterns::types::{FaultCategory, FaultPattern};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Remediation capability with rolling usage statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
    /// Unique capability name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Categories this capability may be selected for
    pub eligible_categories: BTreeSet<FaultCategory>,

    /// Rolling success rate (0-100)
    #[serde(default)]
    pub success_rate: f64,

    /// Mean execution cost in milliseconds
    #[serde(default)]
    pub avg_execution_cost_ms: f64,

    #[serde(default)]
    pub total_uses: u64,

    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,

    /// Large blast radius (rebuilds, reinstalls, restarts)
    #[serde(default)]
    pub high_impact: bool,

    /// Command (argv) run by the command invoker
    #[serde(default)]
    pub command: Vec<String>,
}

impl Capability {
    /// Create capability with no usage history
    pub fn new<I>(name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = FaultCategory>,
    {
        Self {
            name: name.into(),
            description: String::new(),
            eligible_categories: categories.into_iter().collect(),
            success_rate: 50.0,
            avg_execution_cost_ms: 0.0,
            total_uses: 0,
            last_used_at: None,
            high_impact: false,
            command: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = rate.clamp(0.0, 100.0);
        self
    }

    pub fn with_cost_ms(mut self, cost_ms: f64) -> Self {
        self.avg_execution_cost_ms = cost_ms.max(0.0);
        self
    }

    pub fn high_impact(mut self) -> Self {
        self.high_impact = true;
        self
    }

    pub fn with_command<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = argv.into_iter().map(Into::into).collect();
        self
    }

    /// Check if capability handles a category
    pub fn handles(&self, category: FaultCategory) -> bool {
        self.eligible_categories.contains(&category)
    }
}

/// Where a remediation action came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum ActionSource {
    /// A registered capability chosen by the selector
    Capability,
    /// A pattern's suggested fix applied directly
    LearnedFix {
        #[serde(rename = "patternId")]
        pattern_id: String,
    },
}

/// Concrete action handed to an invoker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationAction {
    pub name: String,
    pub description: String,
    pub command: Vec<String>,
    #[serde(flatten)]
    pub source: ActionSource,
}

impl RemediationAction {
    /// Action that runs a capability
    pub fn from_capability(capability: &Capability) -> Self {
        Self {
            name: capability.name.clone(),
            description: capability.description.clone(),
            command: capability.command.clone(),
            source: ActionSource::Capability,
        }
    }

    /// Action that applies a pattern's suggested fix
    pub fn from_pattern(pattern: &FaultPattern) -> Self {
        Self {
            name: learned_fix_name(&pattern.id),
            description: pattern.suggested_fix.clone(),
            command: pattern.fix_command.clone(),
            source: ActionSource::LearnedFix {
                pattern_id: pattern.id.clone(),
            },
        }
    }

    pub fn is_capability(&self) -> bool {
        matches!(self.source, ActionSource::Capability)
    }
}

/// Name recorded for a learned-fix execution
pub fn learned_fix_name(pattern_id: &str) -> String {
    format!("learned-fix:{}", pattern_id)
}

/// Outcome of one remediation invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Capability (or learned fix) that was invoked
    pub capability_name: String,

    pub success: bool,

    pub duration_ms: u64,

    #[serde(default)]
    pub error_message: Option<String>,
}

impl ExecutionResult {
    /// Create successful result
    pub fn success(capability_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            capability_name: capability_name.into(),
            success: true,
            duration_ms: duration.as_millis() as u64,
            error_message: None,
        }
    }

    /// Create failed result
    pub fn failure(capability_name: impl Into<String>, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            capability_name: capability_name.into(),
            success: false,
            duration_ms: duration.as_millis() as u64,
            error_message: Some(error.into()),
        }
    }

    /// Create timed-out result
    pub fn timeout(capability_name: impl Into<String>, duration: Duration) -> Self {
        Self::failure(capability_name, "timeout", duration)
    }

    /// Success as a rate sample (100 or 0)
    pub fn success_sample(&self) -> f64 {
        if self.success {
            100.0
        } else {
            0.0
        }
    }
}
