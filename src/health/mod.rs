//! System health score
//!
//! One bounded score (0-100) driven by remediation outcomes. The selector
//! reads it for its situational bonus and the predictive monitor scales
//! its time-to-failure horizon by it.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Health score configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub initial_score: f64,
    /// Points gained per resolved error
    pub success_gain: f64,
    /// Points lost per unresolved error
    pub failure_penalty: f64,
    /// Below this the level is `Poor`
    pub poor_below: f64,
    /// Below this the level is `Fair`
    pub fair_below: f64,
    /// At or above this the level is `Excellent`
    pub excellent_from: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            initial_score: 75.0,
            success_gain: 2.0,
            failure_penalty: 5.0,
            poor_below: 40.0,
            fair_below: 60.0,
            excellent_from: 85.0,
        }
    }
}

/// Coarse health level derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Poor,
    Fair,
    Good,
    Excellent,
}

/// Point-in-time view of system health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub score: f64,
    pub level: HealthLevel,
    pub errors_resolved: u64,
    pub total_errors: u64,
}

impl HealthSnapshot {
    /// Snapshot with a fixed score, for callers outside the pipeline
    pub fn with_score(score: f64, config: &HealthConfig) -> Self {
        let score = score.clamp(0.0, 100.0);
        Self {
            score,
            level: level_for(score, config),
            errors_resolved: 0,
            total_errors: 0,
        }
    }

    /// Degraded health: `Fair` or worse
    pub fn is_degraded(&self) -> bool {
        self.level <= HealthLevel::Fair
    }

    /// Low-energy health: `Poor`
    pub fn is_low_energy(&self) -> bool {
        self.level == HealthLevel::Poor
    }

    /// Resolved share of all errors seen (0-100)
    pub fn resolution_rate(&self) -> f64 {
        if self.total_errors == 0 {
            100.0
        } else {
            self.errors_resolved as f64 / self.total_errors as f64 * 100.0
        }
    }
}

fn level_for(score: f64, config: &HealthConfig) -> HealthLevel {
    if score < config.poor_below {
        HealthLevel::Poor
    } else if score < config.fair_below {
        HealthLevel::Fair
    } else if score >= config.excellent_from {
        HealthLevel::Excellent
    } else {
        HealthLevel::Good
    }
}

#[derive(Debug)]
struct HealthState {
    score: f64,
    errors_resolved: u64,
    total_errors: u64,
}

/// Shared health accumulator
#[derive(Debug)]
pub struct HealthTracker {
    config: HealthConfig,
    state: RwLock<HealthState>,
}

impl HealthTracker {
    pub fn new(config: HealthConfig) -> Self {
        let score = config.initial_score.clamp(0.0, 100.0);
        Self {
            config,
            state: RwLock::new(HealthState {
                score,
                errors_resolved: 0,
                total_errors: 0,
            }),
        }
    }

    /// Record the outcome of one processed error
    pub fn record_outcome(&self, resolved: bool) -> HealthSnapshot {
        {
            let mut state = self.state.write();
            state.total_errors += 1;
            if resolved {
                state.errors_resolved += 1;
                state.score = (state.score + self.config.success_gain).min(100.0);
            } else {
                state.score = (state.score - self.config.failure_penalty).max(0.0);
            }
        }
        self.snapshot()
    }

    /// Adjust the score without counting an error (preventive runs)
    pub fn adjust(&self, resolved: bool) {
        let mut state = self.state.write();
        if resolved {
            state.score = (state.score + self.config.success_gain / 2.0).min(100.0);
        } else {
            state.score = (state.score - self.config.failure_penalty / 2.0).max(0.0);
        }
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let state = self.state.read();
        HealthSnapshot {
            score: state.score,
            level: level_for(state.score, &self.config),
            errors_resolved: state.errors_resolved,
            total_errors: state.total_errors,
        }
    }

    pub fn config(&self) -> &HealthConfig {
        &self.config
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}
