//! Orchestrator request and response types

use crate::health::HealthSnapshot;
use crate::patterns::types::{ErrorContext, FaultCategory, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Incoming event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Build the error context under diagnosis.
    ///
    /// `data` may be a bare message string or an object with `message`
    /// (or `error`), `stack`, `category` and `severity`. Object fields of
    /// `context` become metadata and may also carry `category`/`severity`.
    pub fn to_error_context(&self) -> ErrorContext {
        let message = match &self.data {
            Value::String(message) => message.clone(),
            Value::Object(fields) => ["message", "error", "output"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| self.data.to_string()),
            Value::Null => self.event_type.clone(),
            other => other.to_string(),
        };

        let mut context = ErrorContext::new(message);

        if let Some(stack) = self.field("stack") {
            context = context.with_stack(stack);
        }
        if let Some(category) = self.field("category").and_then(|c| FaultCategory::from_hint(&c)) {
            context = context.with_category(category);
        }
        if let Some(severity) = self.field("severity").and_then(|s| Severity::parse(&s)) {
            context = context.with_severity(severity);
        }

        if let Some(Value::Object(extra)) = &self.context {
            for (key, value) in extra {
                context.metadata.insert(key.clone(), value.clone());
            }
        }
        context
            .metadata
            .insert("eventType".to_string(), Value::String(self.event_type.clone()));

        context
    }

    /// String field from `data`, falling back to `context`
    fn field(&self, key: &str) -> Option<String> {
        [Some(&self.data), self.context.as_ref()]
            .into_iter()
            .flatten()
            .find_map(|v| v.get(key).and_then(Value::as_str))
            .map(str::to_string)
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    pub success: bool,

    /// Capability chosen by the selector, if one ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,

    /// Pattern whose suggested fix was applied directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_applied: Option<String>,

    pub learning_applied: bool,

    pub execution_time_ms: u64,

    /// Cumulative health after this run
    pub health: HealthSnapshot,

    /// 1 when the remediation that ran succeeded
    pub errors_resolved: u64,

    /// 1 when remediation ran, 0 when the run ended before it.
    /// `0/1` is a failed remediation; `0/0` means nothing was attempted.
    pub total_errors: u64,

    /// False when the run ended before any remediation was invoked
    pub remediation_attempted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FaultCategory>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OrchestrationResult {
    /// Result for a run that never reached remediation
    pub fn failed(error: impl Into<String>, execution_time_ms: u64, health: HealthSnapshot) -> Self {
        Self {
            success: false,
            tool_used: None,
            pattern_applied: None,
            learning_applied: false,
            execution_time_ms,
            health,
            errors_resolved: 0,
            total_errors: 0,
            remediation_attempted: false,
            category: None,
            error: Some(error.into()),
        }
    }
}
