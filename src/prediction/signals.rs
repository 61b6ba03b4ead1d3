//! Build output classification
//!
//! Counts error lines in raw build, lint or audit output. Each line lands
//! in at most one class, checked in the order
//! dependency, import, syntax, type.

use crate::prediction::types::{ErrorCounters, PredictionClass};

const DEPENDENCY_MARKERS: &[&str] = &[
    "eresolve",
    "could not resolve dependency",
    "conflicting peer dependency",
    "unmet peer dependency",
    "peer dep missing",
    "no matching version found",
];

const IMPORT_MARKERS: &[&str] = &[
    "cannot find module",
    "module not found",
    "no module named",
    "modulenotfounderror",
    "importerror",
    "error ts2307",
];

const SYNTAX_MARKERS: &[&str] = &[
    "syntaxerror",
    "unexpected token",
    "parsing error",
    "error ts1005",
    "unterminated string",
];

const TYPE_MARKERS: &[&str] = &[
    "typeerror",
    "is not assignable to",
    "cannot find name",
    "error ts2",
    "type error",
];

/// Classify one line of tool output
pub fn classify_line(line: &str) -> Option<PredictionClass> {
    let lowered = line.to_lowercase();
    let hit = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    if hit(DEPENDENCY_MARKERS) {
        Some(PredictionClass::DependencyConflict)
    } else if hit(IMPORT_MARKERS) {
        Some(PredictionClass::ImportResolutionFailure)
    } else if hit(SYNTAX_MARKERS) {
        Some(PredictionClass::SyntaxErrorSpike)
    } else if hit(TYPE_MARKERS) {
        Some(PredictionClass::TypeErrorCascade)
    } else {
        None
    }
}

/// Count error lines per class in raw tool output
pub fn classify_output(output: &str) -> ErrorCounters {
    let mut counters = ErrorCounters::default();
    for class in output.lines().filter_map(classify_line) {
        counters.add(class, 1);
    }
    counters
}
