//! Prediction type definitions

use crate::patterns::types::FaultCategory;
use crate::tools::types::ExecutionResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure class the monitor forecasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionClass {
    TypeErrorCascade,
    SyntaxErrorSpike,
    ImportResolutionFailure,
    DependencyConflict,
}

impl PredictionClass {
    pub fn all() -> [PredictionClass; 4] {
        [
            PredictionClass::TypeErrorCascade,
            PredictionClass::SyntaxErrorSpike,
            PredictionClass::ImportResolutionFailure,
            PredictionClass::DependencyConflict,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionClass::TypeErrorCascade => "TYPE_ERROR_CASCADE",
            PredictionClass::SyntaxErrorSpike => "SYNTAX_ERROR_SPIKE",
            PredictionClass::ImportResolutionFailure => "IMPORT_RESOLUTION_FAILURE",
            PredictionClass::DependencyConflict => "DEPENDENCY_CONFLICT",
        }
    }

    /// Fault category whose selector path handles this class
    pub fn category(&self) -> FaultCategory {
        match self {
            PredictionClass::TypeErrorCascade => FaultCategory::Type,
            PredictionClass::SyntaxErrorSpike => FaultCategory::Syntax,
            PredictionClass::ImportResolutionFailure => FaultCategory::Import,
            PredictionClass::DependencyConflict => FaultCategory::Dependency,
        }
    }

    /// Class tracking a category's counter, if any
    pub fn for_category(category: FaultCategory) -> Option<PredictionClass> {
        match category {
            FaultCategory::Type => Some(PredictionClass::TypeErrorCascade),
            FaultCategory::Syntax => Some(PredictionClass::SyntaxErrorSpike),
            FaultCategory::Import => Some(PredictionClass::ImportResolutionFailure),
            FaultCategory::Dependency => Some(PredictionClass::DependencyConflict),
            _ => None,
        }
    }

    pub fn recommended_prevention(&self) -> &'static str {
        match self {
            PredictionClass::TypeErrorCascade => "Run the type checker before the next build",
            PredictionClass::SyntaxErrorSpike => "Run lint autofix on recently changed files",
            PredictionClass::ImportResolutionFailure => "Verify module paths and reinstall missing packages",
            PredictionClass::DependencyConflict => "Resolve peer dependency conflicts and run an audit",
        }
    }
}

impl fmt::Display for PredictionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error counts per predicted class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCounters {
    pub type_errors: u64,
    pub syntax_errors: u64,
    pub import_errors: u64,
    pub dependency_errors: u64,
}

impl ErrorCounters {
    pub fn get(&self, class: PredictionClass) -> u64 {
        match class {
            PredictionClass::TypeErrorCascade => self.type_errors,
            PredictionClass::SyntaxErrorSpike => self.syntax_errors,
            PredictionClass::ImportResolutionFailure => self.import_errors,
            PredictionClass::DependencyConflict => self.dependency_errors,
        }
    }

    pub fn add(&mut self, class: PredictionClass, count: u64) {
        let slot = match class {
            PredictionClass::TypeErrorCascade => &mut self.type_errors,
            PredictionClass::SyntaxErrorSpike => &mut self.syntax_errors,
            PredictionClass::ImportResolutionFailure => &mut self.import_errors,
            PredictionClass::DependencyConflict => &mut self.dependency_errors,
        };
        *slot = slot.saturating_add(count);
    }

    /// Remove up to `count` errors of one class
    pub fn consume(&mut self, class: PredictionClass, count: u64) {
        let slot = match class {
            PredictionClass::TypeErrorCascade => &mut self.type_errors,
            PredictionClass::SyntaxErrorSpike => &mut self.syntax_errors,
            PredictionClass::ImportResolutionFailure => &mut self.import_errors,
            PredictionClass::DependencyConflict => &mut self.dependency_errors,
        };
        *slot = slot.saturating_sub(count);
    }

    pub fn total(&self) -> u64 {
        PredictionClass::all().iter().map(|c| self.get(*c)).sum()
    }
}

/// Forecast of an impending failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub pattern_class: PredictionClass,
    /// Probability (0-100)
    pub probability: u8,
    pub estimated_minutes_to_failure: u32,
    pub recommended_prevention: String,
}

/// Per-class forecasting policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassPolicy {
    /// Counter must exceed this to raise a prediction
    pub threshold: u64,
    pub multiplier: u64,
    /// Probability ceiling (0-100)
    pub cap: u8,
    pub base_minutes: u32,
    /// Ranking weight applied to probability
    pub severity_weight: f64,
}

impl ClassPolicy {
    pub fn new(threshold: u64, multiplier: u64, cap: u8, base_minutes: u32, severity_weight: f64) -> Self {
        Self {
            threshold,
            multiplier,
            cap,
            base_minutes,
            severity_weight,
        }
    }
}

/// Policies for every class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassPolicies {
    pub type_error_cascade: ClassPolicy,
    pub syntax_error_spike: ClassPolicy,
    pub import_resolution_failure: ClassPolicy,
    pub dependency_conflict: ClassPolicy,
}

impl ClassPolicies {
    pub fn get(&self, class: PredictionClass) -> &ClassPolicy {
        match class {
            PredictionClass::TypeErrorCascade => &self.type_error_cascade,
            PredictionClass::SyntaxErrorSpike => &self.syntax_error_spike,
            PredictionClass::ImportResolutionFailure => &self.import_resolution_failure,
            PredictionClass::DependencyConflict => &self.dependency_conflict,
        }
    }

    pub fn get_mut(&mut self, class: PredictionClass) -> &mut ClassPolicy {
        match class {
            PredictionClass::TypeErrorCascade => &mut self.type_error_cascade,
            PredictionClass::SyntaxErrorSpike => &mut self.syntax_error_spike,
            PredictionClass::ImportResolutionFailure => &mut self.import_resolution_failure,
            PredictionClass::DependencyConflict => &mut self.dependency_conflict,
        }
    }
}

impl Default for ClassPolicies {
    fn default() -> Self {
        Self {
            type_error_cascade: ClassPolicy::new(5, 10, 90, 30, 0.7),
            syntax_error_spike: ClassPolicy::new(3, 15, 95, 15, 0.8),
            import_resolution_failure: ClassPolicy::new(3, 20, 95, 20, 0.9),
            dependency_conflict: ClassPolicy::new(2, 25, 98, 10, 1.0),
        }
    }
}

/// Predictive monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_secs: u64,
    /// Predictions above this probability trigger a preventive run
    pub confidence_floor: u8,
    pub policies: ClassPolicies,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            confidence_floor: 50,
            policies: ClassPolicies::default(),
        }
    }
}

/// Monitor scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MonitorState {
    Idle = 0,
    Running = 1,
}

impl MonitorState {
    pub(crate) fn from_u8(value: u8) -> MonitorState {
        if value == MonitorState::Running as u8 {
            MonitorState::Running
        } else {
            MonitorState::Idle
        }
    }
}

/// What one tick produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub counters: ErrorCounters,
    pub predictions: Vec<Prediction>,
    pub preventive_runs: Vec<ExecutionResult>,
}

/// Result of a tick request
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Completed(TickReport),
    /// Another tick was already running
    Skipped,
    Failed(String),
}

impl TickOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TickOutcome::Completed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_serde_screaming_snake() {
        let json = serde_json::to_string(&PredictionClass::TypeErrorCascade).unwrap();
        assert_eq!(json, "\"TYPE_ERROR_CASCADE\"");
    }

    #[test]
    fn test_class_category_round_trip() {
        for class in PredictionClass::all() {
            assert_eq!(PredictionClass::for_category(class.category()), Some(class));
        }
        assert_eq!(PredictionClass::for_category(FaultCategory::Build), None);
    }

    #[test]
    fn test_counters_consume_saturates() {
        let mut counters = ErrorCounters::default();
        counters.add(PredictionClass::TypeErrorCascade, 5);
        counters.add(PredictionClass::DependencyConflict, 1);

        counters.consume(PredictionClass::TypeErrorCascade, 3);
        assert_eq!(counters.type_errors, 2);
        counters.consume(PredictionClass::DependencyConflict, 4);
        assert_eq!(counters.dependency_errors, 0);
        assert_eq!(counters.total(), 2);
    }

    #[test]
    fn test_default_policies() {
        let config = MonitorConfig::default();
        let policy = config.policies.get(PredictionClass::TypeErrorCascade);
        assert_eq!((policy.multiplier, policy.cap), (10, 90));
        let policy = config.policies.get(PredictionClass::DependencyConflict);
        assert_eq!((policy.multiplier, policy.cap), (25, 98));
    }
}
