//! Error types for faultmender
//!
//! One enum for the whole diagnosis pipeline. Most of these never reach a
//! caller: the matcher, selector, executor and analyzers convert them into
//! typed results, and the orchestrator folds whatever is left into an
//! `OrchestrationResult`.

use thiserror::Error;

/// Main error type for the remediation pipeline
#[derive(Error, Debug)]
pub enum RemedyError {
    /// No fault pattern matched the incoming context
    #[error("No fault pattern matched: {0}")]
    PatternNotFound(String),

    /// Selection could not find a registered candidate
    #[error("No capability available for category '{category}'")]
    NoCapabilityAvailable { category: String },

    /// Capability invocation exceeded its deadline
    #[error("Execution timed out after {duration_ms}ms")]
    ExecutionTimeout { duration_ms: u64 },

    /// Capability ran but reported failure
    #[error("Execution failed: {0}")]
    ExecutionFailure(String),

    /// Learning ledger write failed
    #[error("Learning persistence failed: {0}")]
    LearningPersistenceFailure(String),

    /// Predictive monitor tick failed internally
    #[error("Prediction tick failed: {0}")]
    PredictionTickFailure(String),

    /// Fault pattern signature could not be compiled
    #[error("Invalid pattern '{id}': {reason}")]
    InvalidPattern { id: String, reason: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RemedyError>;

/// Convert anyhow errors to RemedyError
impl From<anyhow::Error> for RemedyError {
    fn from(err: anyhow::Error) -> Self {
        RemedyError::Generic(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RemedyError::NoCapabilityAvailable {
            category: "build".to_string(),
        };
        assert!(err.to_string().contains("build"));

        let err = RemedyError::ExecutionTimeout { duration_ms: 250 };
        assert!(err.to_string().contains("250"));
    }

    #[test]
    fn test_invalid_pattern_error() {
        let err = RemedyError::InvalidPattern {
            id: "FP-001".to_string(),
            reason: "unclosed group".to_string(),
        };
        assert!(err.to_string().contains("FP-001"));
        assert!(err.to_string().contains("unclosed group"));
    }

    #[test]
    fn test_from_anyhow() {
        let err: RemedyError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, RemedyError::Generic(ref m) if m.contains("disk full")));
    }
}
