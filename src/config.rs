use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{RemedyError, Result};
use crate::health::HealthConfig;
use crate::learning::store::LearningConfig;
use crate::orchestrator::engine::OrchestratorConfig;
use crate::patterns::matcher::MatcherConfig;
use crate::prediction::types::MonitorConfig;
use crate::reports::types::ReportsConfig;
use crate::telemetry::LoggingConfig;
use crate::tools::executor::ExecutorConfig;
use crate::tools::selector::SelectorConfig;

/// Engine configuration, one section per component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub matcher: MatcherConfig,
    pub selector: SelectorConfig,
    pub executor: ExecutorConfig,
    pub learning: LearningConfig,
    pub orchestrator: OrchestratorConfig,
    pub monitor: MonitorConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
    pub reports: ReportsConfig,
}

impl EngineConfig {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = EngineConfig::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: EngineConfig = toml::from_str(&contents)
            .map_err(|e| RemedyError::ConfigError(format!("{}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path()?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| RemedyError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".faultmender").join("config.toml"))
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval_secs == 0 {
            return Err(RemedyError::ConfigError(
                "monitor.interval_secs must be positive".to_string(),
            ));
        }
        if self.executor.timeout_ms == 0 {
            return Err(RemedyError::ConfigError(
                "executor.timeout_ms must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.executor.ema_weight) {
            return Err(RemedyError::ConfigError(format!(
                "executor.ema_weight must be within 0..=1, got {}",
                self.executor.ema_weight
            )));
        }
        if self.monitor.confidence_floor > 100 || self.orchestrator.learned_fix_confidence > 100 {
            return Err(RemedyError::ConfigError(
                "confidence thresholds must be within 0..=100".to_string(),
            ));
        }
        Ok(())
    }
}
