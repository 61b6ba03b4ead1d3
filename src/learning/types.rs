//! Learning ledger types

use crate::patterns::types::FaultCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningKind {
    /// Observed remediation outcome
    Resolution,
    /// Category without an effective capability
    Gap,
    /// Critical failure left unresolved
    Risk,
    /// Two capabilities used for one event
    Synergy,
    /// Cheap improvement candidate
    Opportunity,
}

impl LearningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningKind::Resolution => "resolution",
            LearningKind::Gap => "gap",
            LearningKind::Risk => "risk",
            LearningKind::Synergy => "synergy",
            LearningKind::Opportunity => "opportunity",
        }
    }
}

/// Immutable ledger record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: LearningKind,
    pub category: FaultCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_pattern_id: Option<String>,
    /// Success rate observed for this outcome (0-100)
    pub outcome_success_rate: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl LearningEntry {
    /// Create new entry stamped now
    pub fn new(kind: LearningKind, category: FaultCategory, outcome_success_rate: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            category,
            related_pattern_id: None,
            outcome_success_rate: outcome_success_rate.clamp(0.0, 100.0),
            metadata: Map::new(),
        }
    }

    /// Resolution entry for one execution outcome
    pub fn resolution(category: FaultCategory, pattern_id: Option<String>, success: bool) -> Self {
        let mut entry = Self::new(
            LearningKind::Resolution,
            category,
            if success { 100.0 } else { 0.0 },
        );
        entry.related_pattern_id = pattern_id;
        entry
    }

    pub fn with_pattern(mut self, pattern_id: impl Into<String>) -> Self {
        self.related_pattern_id = Some(pattern_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether the outcome counts as a success
    pub fn succeeded(&self) -> bool {
        self.outcome_success_rate >= 50.0
    }
}

/// Ledger grouped for dashboards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NexusData {
    pub learnings: Vec<LearningEntry>,
    pub gaps: Vec<LearningEntry>,
    pub risks: Vec<LearningEntry>,
    pub synergies: Vec<LearningEntry>,
    pub opportunities: Vec<LearningEntry>,
}

impl NexusData {
    pub fn total(&self) -> usize {
        self.learnings.len()
            + self.gaps.len()
            + self.risks.len()
            + self.synergies.len()
            + self.opportunities.len()
    }
}
