//! Remediation capabilities
//!
//! Provides capability selection and execution with:
//! - Capability registry (built-in catalog or JSON seed)
//! - Deterministic selector over a fixed candidate table
//! - Executor with timeout, panic capture and moving-average statistics
//! - Command invoker (argv only, killed on cancellation)

pub mod types;
pub mod registry;
pub mod selector;
pub mod executor;
pub mod process;

// Re-export commonly used types
pub use types::{ActionSource, Capability, ExecutionResult, RemediationAction};
pub use registry::CapabilityRegistry;
pub use selector::{SelectorConfig, ToolSelector};
pub use executor::{CapabilityInvoker, ExecutorConfig, RemediationExecutor};
pub use process::CommandInvoker;
