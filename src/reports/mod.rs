//! Report artifacts
//!
//! Analysis passes write timestamped JSON reports into one directory; the
//! remediation planner reads the latest of each kind and writes a plan.

pub mod types;
pub mod writer;
pub mod plan;
pub mod secrets;

pub use types::{
    InvalidReport, PlanAction, PlanInputs, Priority, RemediationPlan, ReportKind, ReportsConfig,
    SecretFinding, SecretsScanReport,
};
pub use writer::{validate_reports, ReportWriter};
pub use plan::{build_plan, RemediationPlanner};
pub use secrets::{scan_secrets, write_secrets_report};
