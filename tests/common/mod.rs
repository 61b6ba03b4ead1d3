//! Shared test invokers

#![allow(dead_code)]

use async_trait::async_trait;
use faultmender::{CapabilityInvoker, ErrorContext, RemedyError, RemediationAction, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Invoker whose outcome is scripted per action name
#[derive(Default)]
pub struct ScriptedInvoker {
    failing: Vec<String>,
    slow: Vec<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl ScriptedInvoker {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn slow(names: &[&str], delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            slow: names.iter().map(|n| n.to_string()).collect(),
            delay,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CapabilityInvoker for ScriptedInvoker {
    async fn invoke(&self, action: &RemediationAction, _context: &ErrorContext) -> Result<String> {
        self.calls.lock().push(action.name.clone());

        if self.slow.contains(&action.name) {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(&action.name) {
            return Err(RemedyError::ExecutionFailure(format!("{} failed", action.name)));
        }
        Ok(format!("{} done", action.name))
    }
}
