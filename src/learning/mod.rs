//! Learning ledger and insight analyzers
//!
//! Outcomes are appended to an append-only ledger (optionally mirrored to
//! a JSON-lines file). Aggregate success rates are recomputed from it and
//! written back to the fault pattern registry.

pub mod types;
pub mod persistence;
pub mod store;
pub mod analyzers;
pub mod statistics;

pub use types::{LearningEntry, LearningKind, NexusData};
pub use persistence::LedgerPersistence;
pub use store::{LearningConfig, LearningStore};
pub use analyzers::{
    default_analyzers, run_analyzers, AnalyzerState, GapAnalyzer, InsightAnalyzer, Observation,
    OpportunityAnalyzer, RiskAnalyzer, SynergyAnalyzer,
};
pub use statistics::{CapabilityUsage, Statistics, StatisticsTracker};
