//! Telemetry for faultmender
//!
//! Installs the global `tracing` subscriber. Components log with structured
//! fields; this module decides where those events go.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::errors::{RemedyError, Result};

/// Environment variable overriding the configured filter
pub const LOG_ENV_VAR: &str = "FAULTMENDER_LOG";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `FAULTMENDER_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Build the filter from the environment, falling back to `level`
fn build_filter(level: &str) -> Result<EnvFilter> {
    match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| RemedyError::ConfigError(format!("Invalid {}: {}", LOG_ENV_VAR, e))),
        _ => EnvFilter::try_new(level)
            .map_err(|e| RemedyError::ConfigError(format!("Invalid log level '{}': {}", level, e))),
    }
}

/// Install the global subscriber
///
/// Returns `Ok(true)` when this call installed it and `Ok(false)` when a
/// subscriber was already set, so libraries and tests can call it freely.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let filter = build_filter(&config.level)?;

    let installed = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::debug!(level = %config.level, json = config.json, "Tracing initialized");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json);
    }

    #[test]
    fn test_second_init_is_noop() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config).unwrap();
        assert!(!init_tracing(&config).unwrap());
    }

    #[test]
    fn test_filter_accepts_directives() {
        assert!(EnvFilter::try_new("faultmender=debug,warn").is_ok());
    }
}
