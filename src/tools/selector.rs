//! Tool selector
//!
//! Picks one capability for a fault category from a fixed candidate
//! table. Score = success rate + situational bonus; ties go to the
//! candidate listed first. Categories without a table entry use the
//! fallback list. A candidate is only considered when its eligible
//! categories include the fault category, or `unknown` for the fallback
//! list.

use crate::errors::{RemedyError, Result};
use crate::health::HealthSnapshot;
use crate::patterns::types::FaultCategory;
use crate::tools::registry::CapabilityRegistry;
use crate::tools::types::Capability;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selector policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Ordered candidate names keyed by category name
    pub candidates: BTreeMap<String, Vec<String>>,
    /// Candidates for categories missing from `candidates`
    pub fallback: Vec<String>,
    /// Bonus for high-impact capabilities while health is degraded
    pub high_impact_bonus: f64,
    /// Bonus for cheap capabilities while health is low-energy
    pub low_cost_bonus: f64,
    pub low_cost_threshold_ms: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        let table: [(FaultCategory, &[&str]); 7] = [
            (FaultCategory::Syntax, &["linter-autofix", "type-checker"]),
            (FaultCategory::Type, &["type-checker", "linter-autofix"]),
            (FaultCategory::Import, &["import-path-resolver", "dependency-installer"]),
            (FaultCategory::Dependency, &["dependency-installer", "npm-audit-fix"]),
            (FaultCategory::Build, &["clean-rebuild", "cache-purge"]),
            (FaultCategory::Runtime, &["service-restart", "clean-rebuild", "cache-purge"]),
            (FaultCategory::Security, &["npm-audit-fix", "secrets-rotation-check"]),
        ];

        let candidates = table
            .iter()
            .map(|(category, names)| {
                (category.to_string(), names.iter().map(|n| n.to_string()).collect())
            })
            .collect();

        Self {
            candidates,
            fallback: vec!["diagnostic-snapshot".to_string(), "cache-purge".to_string()],
            high_impact_bonus: 10.0,
            low_cost_bonus: 5.0,
            low_cost_threshold_ms: 1_000.0,
        }
    }
}

/// Deterministic capability selector
#[derive(Debug, Clone, Default)]
pub struct ToolSelector {
    config: SelectorConfig,
}

impl ToolSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Candidate names for a category, in priority order
    pub fn candidates_for(&self, category: FaultCategory) -> &[String] {
        self.table_entry(category).unwrap_or(&self.config.fallback)
    }

    fn table_entry(&self, category: FaultCategory) -> Option<&[String]> {
        match self.config.candidates.get(category.as_str()) {
            Some(list) if category != FaultCategory::Unknown => Some(list),
            _ => None,
        }
    }

    /// Whether a candidate may be used for `category`
    fn is_eligible(&self, capability: &Capability, category: FaultCategory) -> bool {
        if capability.handles(category) {
            return true;
        }
        self.table_entry(category).is_none() && capability.handles(FaultCategory::Unknown)
    }

    /// Score a capability under the current health
    pub fn score(&self, capability: &Capability, health: &HealthSnapshot) -> f64 {
        let mut score = capability.success_rate;
        if health.is_degraded() && capability.high_impact {
            score += self.config.high_impact_bonus;
        }
        if health.is_low_energy() && capability.avg_execution_cost_ms < self.config.low_cost_threshold_ms {
            score += self.config.low_cost_bonus;
        }
        score
    }

    /// Select the best registered candidate for `category`
    pub fn select(
        &self,
        registry: &CapabilityRegistry,
        category: FaultCategory,
        health: &HealthSnapshot,
    ) -> Result<Capability> {
        let mut best: Option<(f64, Capability)> = None;

        for name in self.candidates_for(category) {
            let Some(capability) = registry.get(name) else {
                continue;
            };
            if !self.is_eligible(&capability, category) {
                tracing::debug!(
                    category = %category,
                    capability = %capability.name,
                    "Candidate not eligible for category"
                );
                continue;
            }
            let score = self.score(&capability, health);

            // Strictly greater: earlier candidates win ties
            let better = match &best {
                Some((best_score, _)) => score > *best_score,
                None => true,
            };
            if better {
                best = Some((score, capability));
            }
        }

        match best {
            Some((score, capability)) => {
                tracing::debug!(
                    category = %category,
                    capability = %capability.name,
                    score,
                    "Selected capability"
                );
                Ok(capability)
            }
            None => {
                tracing::warn!(category = %category, "No registered capability for category");
                Err(RemedyError::NoCapabilityAvailable {
                    category: category.to_string(),
                })
            }
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthConfig;

    fn healthy() -> HealthSnapshot {
        HealthSnapshot::with_score(75.0, &HealthConfig::default())
    }

    fn registry_of(caps: Vec<Capability>) -> CapabilityRegistry {
        CapabilityRegistry::from_capabilities(caps).unwrap()
    }

    #[test]
    fn test_highest_success_rate_wins() {
        let registry = CapabilityRegistry::new();
        let selector = ToolSelector::default();

        // linter-autofix (72) beats type-checker (70) for syntax
        let cap = selector.select(&registry, FaultCategory::Syntax, &healthy()).unwrap();
        assert_eq!(cap.name, "linter-autofix");
    }

    #[test]
    fn test_tie_goes_to_first_candidate() {
        let registry = registry_of(vec![
            Capability::new("type-checker", [FaultCategory::Type]).with_success_rate(70.0),
            Capability::new("linter-autofix", [FaultCategory::Type]).with_success_rate(70.0),
        ]);
        let selector = ToolSelector::default();

        let cap = selector.select(&registry, FaultCategory::Type, &healthy()).unwrap();
        assert_eq!(cap.name, "type-checker");
    }

    #[test]
    fn test_high_impact_bonus_when_degraded() {
        let registry = registry_of(vec![
            Capability::new("clean-rebuild", [FaultCategory::Build])
                .with_success_rate(60.0)
                .with_cost_ms(30_000.0)
                .high_impact(),
            Capability::new("cache-purge", [FaultCategory::Build])
                .with_success_rate(65.0)
                .with_cost_ms(30_000.0),
        ]);
        let selector = ToolSelector::default();

        let cap = selector.select(&registry, FaultCategory::Build, &healthy()).unwrap();
        assert_eq!(cap.name, "cache-purge");

        let degraded = HealthSnapshot::with_score(50.0, &HealthConfig::default());
        let cap = selector.select(&registry, FaultCategory::Build, &degraded).unwrap();
        assert_eq!(cap.name, "clean-rebuild");
    }

    #[test]
    fn test_low_cost_bonus_when_low_energy() {
        let registry = registry_of(vec![
            Capability::new("import-path-resolver", [FaultCategory::Import])
                .with_success_rate(60.0)
                .with_cost_ms(500.0),
            Capability::new("dependency-installer", [FaultCategory::Import])
                .with_success_rate(64.0)
                .with_cost_ms(20_000.0),
        ]);
        let selector = ToolSelector::default();

        // Poor health: resolver 60 + 5 = 65 beats installer 64 (no high-impact flag)
        let poor = HealthSnapshot::with_score(10.0, &HealthConfig::default());
        let cap = selector.select(&registry, FaultCategory::Import, &poor).unwrap();
        assert_eq!(cap.name, "import-path-resolver");
    }

    #[test]
    fn test_unknown_uses_fallback_list() {
        let registry = registry_of(vec![
            Capability::new("cache-purge", [FaultCategory::Unknown]).with_success_rate(40.0),
            Capability::new("npm-audit-fix", [FaultCategory::Security]).with_success_rate(99.0),
        ]);
        let selector = ToolSelector::default();

        let cap = selector.select(&registry, FaultCategory::Unknown, &healthy()).unwrap();
        assert_eq!(cap.name, "cache-purge");
    }

    #[test]
    fn test_no_candidate_registered() {
        let registry = registry_of(vec![Capability::new("cache-purge", [FaultCategory::Build])]);
        let selector = ToolSelector::default();

        let err = selector.select(&registry, FaultCategory::Security, &healthy()).unwrap_err();
        assert!(matches!(err, RemedyError::NoCapabilityAvailable { ref category } if category == "security"));
    }

    #[test]
    fn test_ineligible_candidate_is_passed_over() {
        let registry = registry_of(vec![
            Capability::new("clean-rebuild", [FaultCategory::Security]).with_success_rate(99.0),
            Capability::new("cache-purge", [FaultCategory::Build]).with_success_rate(40.0),
        ]);
        let selector = ToolSelector::default();

        let cap = selector.select(&registry, FaultCategory::Build, &healthy()).unwrap();
        assert_eq!(cap.name, "cache-purge");
    }

    #[test]
    fn test_only_ineligible_candidates_is_an_error() {
        let registry = registry_of(vec![Capability::new("clean-rebuild", [FaultCategory::Security])]);
        let selector = ToolSelector::default();

        let err = selector.select(&registry, FaultCategory::Build, &healthy()).unwrap_err();
        assert!(matches!(err, RemedyError::NoCapabilityAvailable { ref category } if category == "build"));
    }

    #[test]
    fn test_fallback_needs_unknown_eligibility() {
        let registry = registry_of(vec![
            Capability::new("diagnostic-snapshot", [FaultCategory::Build]).with_success_rate(90.0),
            Capability::new("cache-purge", [FaultCategory::Unknown]).with_success_rate(40.0),
        ]);
        let selector = ToolSelector::default();

        let cap = selector.select(&registry, FaultCategory::Unknown, &healthy()).unwrap();
        assert_eq!(cap.name, "cache-purge");
    }

    #[test]
    fn test_never_outside_candidate_list() {
        let registry = CapabilityRegistry::new();
        let selector = ToolSelector::default();
        for category in FaultCategory::all() {
            let cap = selector.select(&registry, category, &healthy()).unwrap();
            assert!(selector.candidates_for(category).contains(&cap.name));
        }
    }
}
