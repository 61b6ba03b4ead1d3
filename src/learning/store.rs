//! Learning store
//!
//! Append-only ledger of outcomes and insights. Aggregates (pattern and
//! category success rates, failure counts) are recomputed by scanning
//! entries; entries are never edited after they are appended.

use crate::errors::{RemedyError, Result};
use crate::learning::persistence::LedgerPersistence;
use crate::learning::types::{LearningEntry, LearningKind, NexusData};
use crate::patterns::registry::FaultPatternRegistry;
use crate::patterns::types::FaultCategory;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Learning store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// JSON-lines ledger file; in-memory only when unset
    pub ledger_path: Option<PathBuf>,
    /// Executions slower than this produce an opportunity entry
    pub latency_threshold_ms: u64,
    /// Manual-operation events recurring this often produce an opportunity entry
    pub manual_recurrence_threshold: u64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            ledger_path: None,
            latency_threshold_ms: 5_000,
            manual_recurrence_threshold: 3,
        }
    }
}

/// Learning store
pub struct LearningStore {
    entries: RwLock<Vec<LearningEntry>>,
    patterns: Arc<FaultPatternRegistry>,
    persistence: Option<LedgerPersistence>,
    config: LearningConfig,
}

impl LearningStore {
    /// Create store, reloading the ledger file when one is configured
    pub fn new(patterns: Arc<FaultPatternRegistry>, config: LearningConfig) -> Result<Self> {
        let (persistence, entries) = match &config.ledger_path {
            Some(path) => {
                let persistence = LedgerPersistence::new(path)
                    .map_err(|e| RemedyError::LearningPersistenceFailure(format!("{:#}", e)))?;
                let entries = persistence
                    .load()
                    .map_err(|e| RemedyError::LearningPersistenceFailure(format!("{:#}", e)))?;
                (Some(persistence), entries)
            }
            None => (None, Vec::new()),
        };

        let store = Self {
            entries: RwLock::new(entries),
            patterns,
            persistence,
            config,
        };

        let reloaded = store.len();
        if reloaded > 0 {
            store.recompute_all_patterns();
            tracing::info!(entries = reloaded, "Reloaded learning ledger");
        }

        Ok(store)
    }

    /// Create store without a ledger file
    pub fn in_memory(patterns: Arc<FaultPatternRegistry>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            patterns,
            persistence: None,
            config: LearningConfig::default(),
        }
    }

    /// Append an entry.
    ///
    /// The in-memory append always stands. `Err` means only the ledger
    /// file write failed.
    pub fn append(&self, entry: LearningEntry) -> Result<()> {
        let pattern_id = match entry.kind {
            LearningKind::Resolution => entry.related_pattern_id.clone(),
            _ => None,
        };

        tracing::debug!(kind = entry.kind.as_str(), category = %entry.category, "Learning entry appended");

        // File order follows in-memory order
        let persisted = {
            let mut entries = self.entries.write();
            let persisted = match &self.persistence {
                Some(persistence) => persistence.append(&entry),
                None => Ok(()),
            };
            entries.push(entry);
            persisted
        };

        if let Some(id) = pattern_id {
            self.recompute_pattern(&id);
        }

        persisted.map_err(|e| {
            tracing::error!(error = %format!("{:#}", e), "Failed to persist learning entry");
            RemedyError::LearningPersistenceFailure(format!("{:#}", e))
        })
    }

    /// Record one remediation outcome
    pub fn record_resolution(
        &self,
        category: FaultCategory,
        pattern_id: Option<&str>,
        action: &str,
        success: bool,
    ) -> Result<()> {
        let entry = LearningEntry::resolution(category, pattern_id.map(str::to_string), success)
            .with_metadata("action", action);
        self.append(entry)
    }

    /// Mean outcome over resolution entries for a pattern
    pub fn success_rate_for_pattern(&self, pattern_id: &str) -> Option<f64> {
        mean(
            self.entries
                .read()
                .iter()
                .filter(|e| e.kind == LearningKind::Resolution)
                .filter(|e| e.related_pattern_id.as_deref() == Some(pattern_id))
                .map(|e| e.outcome_success_rate),
        )
    }

    /// Mean outcome over resolution entries for a category
    pub fn success_rate_for_category(&self, category: FaultCategory) -> Option<f64> {
        mean(
            self.entries
                .read()
                .iter()
                .filter(|e| e.kind == LearningKind::Resolution && e.category == category)
                .map(|e| e.outcome_success_rate),
        )
    }

    /// Failed resolutions recorded for a category
    pub fn failure_count(&self, category: FaultCategory) -> u64 {
        self.entries
            .read()
            .iter()
            .filter(|e| e.kind == LearningKind::Resolution && e.category == category && !e.succeeded())
            .count() as u64
    }

    /// All entries in append order
    pub fn entries(&self) -> Vec<LearningEntry> {
        self.entries.read().clone()
    }

    /// Entries of one kind in append order
    pub fn entries_of(&self, kind: LearningKind) -> Vec<LearningEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    /// Ledger grouped by kind
    pub fn nexus(&self) -> NexusData {
        let mut nexus = NexusData::default();
        for entry in self.entries.read().iter() {
            let bucket = match entry.kind {
                LearningKind::Resolution => &mut nexus.learnings,
                LearningKind::Gap => &mut nexus.gaps,
                LearningKind::Risk => &mut nexus.risks,
                LearningKind::Synergy => &mut nexus.synergies,
                LearningKind::Opportunity => &mut nexus.opportunities,
            };
            bucket.push(entry.clone());
        }
        nexus
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    fn recompute_pattern(&self, pattern_id: &str) {
        if let Some(rate) = self.success_rate_for_pattern(pattern_id) {
            if self.patterns.set_observed_success_rate(pattern_id, rate) {
                tracing::debug!(pattern = pattern_id, rate, "Pattern success rate updated");
            }
        }
    }

    fn recompute_all_patterns(&self) {
        let mut ids: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|e| e.kind == LearningKind::Resolution)
            .filter_map(|e| e.related_pattern_id.clone())
            .collect();
        ids.sort();
        ids.dedup();

        for id in ids {
            self.recompute_pattern(&id);
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u64), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::types::FaultPattern;
    use tempfile::TempDir;

    fn registry() -> Arc<FaultPatternRegistry> {
        Arc::new(
            FaultPatternRegistry::from_patterns(vec![FaultPattern::new(
                "FP-1",
                "boom",
                FaultCategory::Build,
                "",
                "rebuild",
            )
            .with_success_rate(85.0)])
            .unwrap(),
        )
    }

    #[test]
    fn test_resolution_recomputes_pattern_rate() {
        let patterns = registry();
        let store = LearningStore::in_memory(patterns.clone());

        store.record_resolution(FaultCategory::Build, Some("FP-1"), "x", true).unwrap();
        assert_eq!(patterns.get("FP-1").unwrap().observed_success_rate, 100.0);

        store.record_resolution(FaultCategory::Build, Some("FP-1"), "x", false).unwrap();
        assert_eq!(patterns.get("FP-1").unwrap().observed_success_rate, 50.0);
        assert_eq!(store.success_rate_for_pattern("FP-1"), Some(50.0));
    }

    #[test]
    fn test_category_aggregates() {
        let store = LearningStore::in_memory(registry());
        assert_eq!(store.success_rate_for_category(FaultCategory::Type), None);

        store.record_resolution(FaultCategory::Type, None, "x", false).unwrap();
        store.record_resolution(FaultCategory::Type, None, "x", false).unwrap();
        store.record_resolution(FaultCategory::Type, None, "x", true).unwrap();
        store.record_resolution(FaultCategory::Build, None, "x", false).unwrap();

        assert_eq!(store.failure_count(FaultCategory::Type), 2);
        let rate = store.success_rate_for_category(FaultCategory::Type).unwrap();
        assert!((rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_nexus_groups_by_kind() {
        let store = LearningStore::in_memory(registry());
        store.record_resolution(FaultCategory::Build, None, "x", true).unwrap();
        store.append(LearningEntry::new(LearningKind::Gap, FaultCategory::Build, 0.0)).unwrap();
        store.append(LearningEntry::new(LearningKind::Opportunity, FaultCategory::Build, 100.0)).unwrap();

        let nexus = store.nexus();
        assert_eq!(nexus.learnings.len(), 1);
        assert_eq!(nexus.gaps.len(), 1);
        assert_eq!(nexus.opportunities.len(), 1);
        assert!(nexus.risks.is_empty());
        assert_eq!(nexus.total(), store.len());
    }

    #[test]
    fn test_ledger_reload_restores_rates() {
        let temp = TempDir::new().unwrap();
        let config = LearningConfig {
            ledger_path: Some(temp.path().join("ledger.jsonl")),
            ..Default::default()
        };

        {
            let store = LearningStore::new(registry(), config.clone()).unwrap();
            store.record_resolution(FaultCategory::Build, Some("FP-1"), "x", false).unwrap();
            store.append(LearningEntry::new(LearningKind::Gap, FaultCategory::Build, 0.0)).unwrap();
        }

        let patterns = registry();
        let store = LearningStore::new(patterns.clone(), config).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(patterns.get("FP-1").unwrap().observed_success_rate, 0.0);
    }

    #[test]
    fn test_concurrent_appends_reload_in_same_order() {
        let temp = TempDir::new().unwrap();
        let config = LearningConfig {
            ledger_path: Some(temp.path().join("ledger.jsonl")),
            ..Default::default()
        };
        let store = Arc::new(LearningStore::new(registry(), config.clone()).unwrap());

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store
                            .append(LearningEntry::new(LearningKind::Gap, FaultCategory::Build, 0.0))
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let in_memory: Vec<_> = store.entries().into_iter().map(|e| e.id).collect();
        let reloaded: Vec<_> = LearningStore::new(registry(), config)
            .unwrap()
            .entries()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(in_memory.len(), 100);
        assert_eq!(reloaded, in_memory);
    }

    #[test]
    fn test_persistence_failure_keeps_entry() {
        let temp = TempDir::new().unwrap();
        let ledger = temp.path().join("ledger.jsonl");
        let config = LearningConfig {
            ledger_path: Some(ledger.clone()),
            ..Default::default()
        };
        let store = LearningStore::new(registry(), config).unwrap();

        // A directory where the ledger file should be makes every write fail
        std::fs::create_dir(&ledger).unwrap();

        let err = store
            .append(LearningEntry::new(LearningKind::Gap, FaultCategory::Build, 0.0))
            .unwrap_err();
        assert!(matches!(err, RemedyError::LearningPersistenceFailure(_)));
        assert_eq!(store.len(), 1);
    }
}
