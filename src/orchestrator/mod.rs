//! Event orchestration
//!
//! `Orchestrator::process_event` is the single ingest entry point; the
//! query side exposes statistics and the grouped learning ledger.

pub mod types;
pub mod engine;

pub use types::{Event, OrchestrationResult};
pub use engine::{Orchestrator, OrchestratorConfig};
