//! faultmender - build and runtime failure remediation
//!
//! Classifies error output against a catalog of fault patterns, picks and
//! runs a remediation capability, and learns from every outcome. A
//! predictive monitor watches error trends and runs fixes before a
//! failure cascade lands.
//!
//! # Architecture
//!
//! - **patterns**: fault pattern catalog and confidence matcher
//! - **tools**: capability registry, health-aware selector, executor
//! - **learning**: resolution ledger, insight analyzers, statistics
//! - **prediction**: trend forecasting and the preventive tick loop
//! - **orchestrator**: per-event pipeline tying the above together
//! - **reports**: scan artifacts and remediation plans

pub mod errors;
pub mod config;
pub mod telemetry;

pub mod patterns;
pub mod health;
pub mod tools;
pub mod learning;
pub mod prediction;
pub mod orchestrator;
pub mod reports;

// Re-export commonly used types
pub use config::EngineConfig;
pub use errors::{RemedyError, Result};
pub use health::{HealthLevel, HealthSnapshot, HealthTracker};
pub use learning::{LearningEntry, LearningKind, LearningStore, NexusData, Statistics};
pub use orchestrator::{Event, OrchestrationResult, Orchestrator};
pub use patterns::{ErrorContext, FaultCategory, FaultPattern, FaultPatternRegistry, Match, Severity};
pub use prediction::{Prediction, PredictionClass, PredictiveMonitor, TickOutcome};
pub use telemetry::{init_tracing, LoggingConfig};
pub use tools::{Capability, CapabilityInvoker, CapabilityRegistry, ExecutionResult, RemediationAction};
