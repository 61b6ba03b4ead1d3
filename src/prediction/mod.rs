//! Failure prediction
//!
//! Forecasts failure classes from accumulated error counters and runs
//! preventive remediation on a fixed interval.

pub mod types;
pub mod signals;
pub mod monitor;

pub use types::{
    ClassPolicies, ClassPolicy, ErrorCounters, MonitorConfig, MonitorState, Prediction,
    PredictionClass, TickOutcome, TickReport,
};
pub use signals::{classify_line, classify_output};
pub use monitor::{forecast, PredictiveMonitor};
