//! Remediation plan generation
//!
//! Reads the latest dependency scan, SBOM and secrets scan reports and
//! turns them into prioritized actions plus shell commands. Commands are
//! written into the plan only; nothing is executed here.

use crate::errors::Result;
use crate::reports::types::{PlanAction, PlanInputs, Priority, RemediationPlan, ReportKind};
use crate::reports::writer::ReportWriter;
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const AUDIT_FIX_COMMAND: &str = "npm audit fix";
pub const AUDIT_REPORT_COMMAND: &str = "npm audit --json";
pub const SECRETS_HISTORY_COMMAND: &str = "git secrets --scan-history";

/// Build a plan from already loaded reports
pub fn build_plan(
    dependency_scan: Option<&Value>,
    sbom: Option<&Value>,
    secrets_scan: Option<&Value>,
    inputs: PlanInputs,
) -> RemediationPlan {
    let mut actions = Vec::new();
    let mut commands = Vec::new();

    if let Some(report) = dependency_scan {
        if report.get("ok").and_then(Value::as_bool) == Some(false) {
            let title = match count_of(report, &["vulnerabilities", "advisories"]) {
                Some(n) => format!("Resolve {} vulnerable dependencies", n),
                None => "Resolve vulnerable dependencies".to_string(),
            };
            actions.push(PlanAction::new("dependency", title, Priority::High));
            commands.push(AUDIT_FIX_COMMAND.to_string());
            commands.push(AUDIT_REPORT_COMMAND.to_string());
        }
    }

    if let Some(report) = sbom {
        let disallowed = count_of(report, &["disallowedLicenses", "disallowed"]).unwrap_or(0);
        if disallowed > 0 {
            actions.push(PlanAction::new(
                "license",
                format!("Review {} packages with disallowed licenses", disallowed),
                Priority::Medium,
            ));
        }
    }

    if let Some(report) = secrets_scan {
        let findings = count_of(report, &["findings"]).unwrap_or(0);
        if findings > 0 {
            actions.push(PlanAction::new(
                "secrets",
                format!("Rotate {} exposed credentials and purge them from history", findings),
                Priority::Critical,
            ));
            commands.push(SECRETS_HISTORY_COMMAND.to_string());
        }
    }

    actions.sort_by(|a, b| b.priority.cmp(&a.priority));

    RemediationPlan {
        generated_at: Utc::now(),
        inputs,
        actions,
        commands,
    }
}

/// Element count of the first array (or number) found under `keys`
fn count_of(report: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| match report.get(*key)? {
        Value::Array(items) => Some(items.len() as u64),
        Value::Object(map) => Some(map.len() as u64),
        Value::Number(n) => n.as_u64(),
        _ => None,
    })
}

/// Generates plans from the reports directory
pub struct RemediationPlanner {
    writer: ReportWriter,
}

impl RemediationPlanner {
    pub fn new(writer: ReportWriter) -> Self {
        Self { writer }
    }

    /// Planner for a reports directory
    pub fn for_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(ReportWriter::new(dir)?))
    }

    /// Build a plan from the latest reports without writing it
    pub fn plan(&self) -> Result<RemediationPlan> {
        let dependency = self.writer.load_latest(ReportKind::DependencyScan)?;
        let sbom = self.writer.load_latest(ReportKind::Sbom)?;
        let secrets = self.writer.load_latest(ReportKind::SecretsScan)?;

        let inputs = PlanInputs {
            dependency_scan: dependency.as_ref().map(|(p, _)| file_name(p)),
            sbom: sbom.as_ref().map(|(p, _)| file_name(p)),
            secrets_scan: secrets.as_ref().map(|(p, _)| file_name(p)),
        };

        Ok(build_plan(
            dependency.as_ref().map(|(_, v)| v),
            sbom.as_ref().map(|(_, v)| v),
            secrets.as_ref().map(|(_, v)| v),
            inputs,
        ))
    }

    /// Build the plan and write it as `remediation_plan_<unixMillis>.json`
    pub fn generate(&self) -> Result<(PathBuf, RemediationPlan)> {
        let plan = self.plan()?;
        let path = self.writer.write(ReportKind::RemediationPlan, &plan)?;
        tracing::info!(
            actions = plan.actions.len(),
            commands = plan.commands.len(),
            "Remediation plan generated"
        );
        Ok((path, plan))
    }

    pub fn writer(&self) -> &ReportWriter {
        &self.writer
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
