//! Fault pattern catalog and matching
//!
//! - Registry: known fault signatures with root cause and fix
//! - Matcher: deterministic confidence scoring of an error context

pub mod types;
pub mod registry;
pub mod matcher;

pub use types::{ErrorContext, FaultCategory, FaultPattern, Match, Severity, SignatureKind};
pub use registry::FaultPatternRegistry;
pub use matcher::{MatcherConfig, PatternMatcher};
