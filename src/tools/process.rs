//! Command invoker
//!
//! Runs a remediation action's argv as a child process:
//! - argv arrays only, no shell interpolation
//! - the child is killed when the invocation future is dropped, so an
//!   executor timeout cancels the action instead of leaving it running

use crate::errors::{RemedyError, Result};
use crate::patterns::types::ErrorContext;
use crate::tools::executor::CapabilityInvoker;
use crate::tools::types::RemediationAction;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Maximum bytes of stderr carried into an error message
const MAX_ERROR_OUTPUT: usize = 2_048;

/// Invoker that executes the action's command
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    working_dir: PathBuf,
}

impl CommandInvoker {
    /// Create invoker rooted at a working directory
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &PathBuf {
        &self.working_dir
    }
}

#[async_trait]
impl CapabilityInvoker for CommandInvoker {
    async fn invoke(&self, action: &RemediationAction, _context: &ErrorContext) -> Result<String> {
        let Some((program, args)) = action.command.split_first() else {
            return Err(RemedyError::ExecutionFailure(format!(
                "No command configured for {}",
                action.name
            )));
        };

        tracing::info!(action = %action.name, program = %program, "Running remediation command");

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RemedyError::ExecutionFailure(format!("Failed to spawn {}: {}", program, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = tail_chars(stderr.trim(), MAX_ERROR_OUTPUT);
        let code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());

        Err(RemedyError::ExecutionFailure(format!(
            "{} exited with {}: {}",
            program, code, tail
        )))
    }
}

fn tail_chars(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
