//! Report artifact types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of report artifact, used as the file name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    DependencyScan,
    Sbom,
    SecretsScan,
    RemediationPlan,
}

impl ReportKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            ReportKind::DependencyScan => "dependency_scan",
            ReportKind::Sbom => "sbom",
            ReportKind::SecretsScan => "secrets_scan",
            ReportKind::RemediationPlan => "remediation_plan",
        }
    }

    /// File name for a report written at `unix_millis`
    pub fn file_name(&self, unix_millis: i64) -> String {
        format!("{}_{}.json", self.prefix(), unix_millis)
    }

    /// Millisecond stamp of a file name of this kind
    pub fn parse_file_name(&self, name: &str) -> Option<i64> {
        name.strip_prefix(self.prefix())?
            .strip_prefix('_')?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Reports directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    pub reports_dir: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
        }
    }
}

/// Plan action priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// One recommended remediation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAction {
    pub kind: String,
    pub title: String,
    pub priority: Priority,
}

impl PlanAction {
    pub fn new(kind: impl Into<String>, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            kind: kind.into(),
            title: title.into(),
            priority,
        }
    }
}

/// Report files a plan was generated from; `None` serializes as `null`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInputs {
    pub dependency_scan: Option<String>,
    pub sbom: Option<String>,
    pub secrets_scan: Option<String>,
}

/// Remediation plan artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationPlan {
    pub generated_at: DateTime<Utc>,
    pub inputs: PlanInputs,
    pub actions: Vec<PlanAction>,
    /// Shell invocations for a human or pipeline to run
    pub commands: Vec<String>,
}

/// One secret-like token found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretFinding {
    pub rule: String,
    /// Path relative to the scanned root
    pub path: String,
    pub line: usize,
    /// Match with the secret part masked
    pub snippet: String,
}

/// Secrets scan artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsScanReport {
    pub ok: bool,
    pub scanned_files: usize,
    pub findings: Vec<SecretFinding>,
}

/// Report file that failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidReport {
    pub path: PathBuf,
    pub error: String,
}
