//! Insight analyzers
//!
//! Each analyzer looks at one processed event and may derive one insight
//! entry. Analyzers are pure: the caller appends whatever they return.
//! A panicking analyzer is dropped without affecting the others.

use crate::learning::types::{LearningEntry, LearningKind};
use crate::patterns::types::{FaultCategory, Severity};
use serde_json::json;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// What happened while processing one event
#[derive(Debug, Clone)]
pub struct Observation {
    pub event_type: String,
    pub category: FaultCategory,
    pub severity: Severity,
    pub pattern_id: Option<String>,
    /// Actions invoked for this event, in order
    pub actions: Vec<String>,
    pub success: bool,
    pub duration_ms: u64,
}

/// Historical state the analyzers may consult
#[derive(Debug, Clone, Default)]
pub struct AnalyzerState {
    /// Failed resolutions recorded for the observation's category, before this one
    pub category_failures: u64,
    /// Times this event type has been seen, this one included
    pub event_occurrences: u64,
    pub latency_threshold_ms: u64,
    pub manual_recurrence_threshold: u64,
}

/// Heuristic that derives an insight from one observation
pub trait InsightAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze(&self, observation: &Observation, state: &AnalyzerState) -> Option<LearningEntry>;
}

/// Records a capability gap when resolution fails
pub struct GapAnalyzer;

impl InsightAnalyzer for GapAnalyzer {
    fn name(&self) -> &'static str {
        "gap"
    }

    fn analyze(&self, observation: &Observation, _state: &AnalyzerState) -> Option<LearningEntry> {
        if observation.success {
            return None;
        }

        let mut entry = LearningEntry::new(LearningKind::Gap, observation.category, 0.0)
            .with_metadata("eventType", observation.event_type.as_str())
            .with_metadata("attempted", json!(observation.actions));
        if let Some(id) = &observation.pattern_id {
            entry = entry.with_pattern(id);
        }
        Some(entry)
    }
}

/// Records a risk when a critical failure goes unresolved
pub struct RiskAnalyzer;

impl RiskAnalyzer {
    /// Likelihood of recurrence (0-100): severity base plus 10 per prior failure
    pub fn probability(severity: Severity, prior_failures: u64) -> f64 {
        (severity.weight() * 50.0 + prior_failures as f64 * 10.0).clamp(0.0, 100.0)
    }

    /// Impact (0-100) from severity alone
    pub fn impact(severity: Severity) -> f64 {
        severity.weight() * 100.0
    }
}

impl InsightAnalyzer for RiskAnalyzer {
    fn name(&self) -> &'static str {
        "risk"
    }

    fn analyze(&self, observation: &Observation, state: &AnalyzerState) -> Option<LearningEntry> {
        if observation.success || observation.severity != Severity::Critical {
            return None;
        }

        let probability = Self::probability(observation.severity, state.category_failures);
        let mut entry = LearningEntry::new(LearningKind::Risk, observation.category, 0.0)
            .with_metadata("probability", probability)
            .with_metadata("impact", Self::impact(observation.severity))
            .with_metadata("historicalFailures", state.category_failures);
        if let Some(id) = &observation.pattern_id {
            entry = entry.with_pattern(id);
        }
        Some(entry)
    }
}

/// Records a synergy when one event used more than one action
pub struct SynergyAnalyzer;

impl InsightAnalyzer for SynergyAnalyzer {
    fn name(&self) -> &'static str {
        "synergy"
    }

    fn analyze(&self, observation: &Observation, _state: &AnalyzerState) -> Option<LearningEntry> {
        if observation.actions.len() < 2 {
            return None;
        }

        let rate = if observation.success { 100.0 } else { 0.0 };
        Some(
            LearningEntry::new(LearningKind::Synergy, observation.category, rate)
                .with_metadata("capabilities", json!(&observation.actions[..2])),
        )
    }
}

/// Records slow executions and recurring manual operations
pub struct OpportunityAnalyzer;

impl InsightAnalyzer for OpportunityAnalyzer {
    fn name(&self) -> &'static str {
        "opportunity"
    }

    fn analyze(&self, observation: &Observation, state: &AnalyzerState) -> Option<LearningEntry> {
        let rate = if observation.success { 100.0 } else { 0.0 };

        if observation.duration_ms > state.latency_threshold_ms {
            return Some(
                LearningEntry::new(LearningKind::Opportunity, observation.category, rate)
                    .with_metadata("reason", "latency")
                    .with_metadata("durationMs", observation.duration_ms)
                    .with_metadata("effort", "low")
                    .with_metadata("impact", "high"),
            );
        }

        if is_manual(&observation.event_type)
            && state.event_occurrences >= state.manual_recurrence_threshold
        {
            return Some(
                LearningEntry::new(LearningKind::Opportunity, observation.category, rate)
                    .with_metadata("reason", "recurring_manual_operation")
                    .with_metadata("eventType", observation.event_type.as_str())
                    .with_metadata("occurrences", state.event_occurrences)
                    .with_metadata("effort", "low")
                    .with_metadata("impact", "high"),
            );
        }

        None
    }
}

fn is_manual(event_type: &str) -> bool {
    event_type.trim().to_lowercase().starts_with("manual")
}

/// The standard analyzer set, in evaluation order
pub fn default_analyzers() -> Vec<Box<dyn InsightAnalyzer>> {
    vec![
        Box::new(GapAnalyzer),
        Box::new(RiskAnalyzer),
        Box::new(SynergyAnalyzer),
        Box::new(OpportunityAnalyzer),
    ]
}

/// Run every analyzer, dropping any that panics
pub fn run_analyzers(
    analyzers: &[Box<dyn InsightAnalyzer>],
    observation: &Observation,
    state: &AnalyzerState,
) -> Vec<LearningEntry> {
    analyzers
        .iter()
        .filter_map(|analyzer| {
            match catch_unwind(AssertUnwindSafe(|| analyzer.analyze(observation, state))) {
                Ok(entry) => entry,
                Err(_) => {
                    tracing::warn!(analyzer = analyzer.name(), "Insight analyzer panicked; dropped");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(success: bool) -> Observation {
        Observation {
            event_type: "build_error".to_string(),
            category: FaultCategory::Build,
            severity: Severity::Medium,
            pattern_id: None,
            actions: vec!["clean-rebuild".to_string()],
            success,
            duration_ms: 100,
        }
    }

    fn state() -> AnalyzerState {
        AnalyzerState {
            category_failures: 0,
            event_occurrences: 1,
            latency_threshold_ms: 5_000,
            manual_recurrence_threshold: 3,
        }
    }

    #[test]
    fn test_gap_only_on_failure() {
        assert!(GapAnalyzer.analyze(&observation(true), &state()).is_none());

        let entry = GapAnalyzer.analyze(&observation(false), &state()).unwrap();
        assert_eq!(entry.kind, LearningKind::Gap);
        assert_eq!(entry.category, FaultCategory::Build);
    }

    #[test]
    fn test_risk_requires_critical_failure() {
        let mut obs = observation(false);
        assert!(RiskAnalyzer.analyze(&obs, &state()).is_none());

        obs.severity = Severity::Critical;
        let mut st = state();
        st.category_failures = 2;
        let entry = RiskAnalyzer.analyze(&obs, &st).unwrap();
        assert_eq!(entry.metadata["probability"], json!(70.0));
        assert_eq!(entry.metadata["impact"], json!(100.0));

        obs.success = true;
        assert!(RiskAnalyzer.analyze(&obs, &st).is_none());
    }

    #[test]
    fn test_risk_probability_bounded() {
        assert_eq!(RiskAnalyzer::probability(Severity::Critical, 50), 100.0);
        assert_eq!(RiskAnalyzer::probability(Severity::Low, 0), 12.5);
    }

    #[test]
    fn test_synergy_needs_two_actions() {
        let mut obs = observation(true);
        assert!(SynergyAnalyzer.analyze(&obs, &state()).is_none());

        obs.actions = vec!["learned-fix:FP-1".to_string(), "clean-rebuild".to_string()];
        let entry = SynergyAnalyzer.analyze(&obs, &state()).unwrap();
        assert_eq!(entry.metadata["capabilities"], json!(["learned-fix:FP-1", "clean-rebuild"]));
    }

    #[test]
    fn test_opportunity_latency_and_recurrence() {
        let mut obs = observation(true);
        assert!(OpportunityAnalyzer.analyze(&obs, &state()).is_none());

        obs.duration_ms = 6_000;
        let entry = OpportunityAnalyzer.analyze(&obs, &state()).unwrap();
        assert_eq!(entry.metadata["reason"], "latency");

        obs.duration_ms = 10;
        obs.event_type = "manual_restart".to_string();
        let mut st = state();
        st.event_occurrences = 3;
        let entry = OpportunityAnalyzer.analyze(&obs, &st).unwrap();
        assert_eq!(entry.metadata["reason"], "recurring_manual_operation");
    }

    struct PanickingAnalyzer;

    impl InsightAnalyzer for PanickingAnalyzer {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn analyze(&self, _observation: &Observation, _state: &AnalyzerState) -> Option<LearningEntry> {
            panic!("analyzer bug")
        }
    }

    #[test]
    fn test_panicking_analyzer_dropped() {
        let analyzers: Vec<Box<dyn InsightAnalyzer>> =
            vec![Box::new(PanickingAnalyzer), Box::new(GapAnalyzer)];

        let entries = run_analyzers(&analyzers, &observation(false), &state());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, LearningKind::Gap);
    }
}
