//! Fault pattern registry
//!
//! Catalog of known fault signatures. Patterns are loaded once (built-in
//! catalog or JSON seed file) and never removed; a pattern is replaced by
//! registering a new version under a new id with `supersede`.
//!
//! Built-in catalog:
//! - FP-IMPORT-PY: missing Python module
//! - FP-IMPORT-JS: unresolved JS/TS module
//! - FP-TYPE-ASSIGN: TypeScript assignability error
//! - FP-TYPE-NAME: undeclared identifier
//! - FP-SYNTAX-EXPECTED: missing token (TS1005)
//! - FP-DEP-ERESOLVE: npm peer dependency conflict
//! - FP-SEC-AUDIT: npm audit vulnerabilities
//! - FP-BUILD-OOM: build ran out of heap
//! - FP-RUNTIME-PORT: port already in use
//! - FP-SEC-SECRET: credential committed to the tree

use crate::errors::{RemedyError, Result};
use crate::patterns::types::{FaultCategory, FaultPattern, Severity, SignatureKind};
use anyhow::Context;
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::path::Path;

/// Pattern plus its compiled signature
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub pattern: FaultPattern,
    regex: Option<Regex>,
    literal: String,
}

impl CompiledPattern {
    fn compile(pattern: FaultPattern) -> Result<Self> {
        let regex = match pattern.signature_kind {
            SignatureKind::Literal => None,
            SignatureKind::Regex => Some(
                RegexBuilder::new(&pattern.signature)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| RemedyError::InvalidPattern {
                        id: pattern.id.clone(),
                        reason: e.to_string(),
                    })?,
            ),
        };
        let literal = pattern.signature.to_lowercase();

        Ok(Self {
            pattern,
            regex,
            literal,
        })
    }

    /// Check the signature against text. `lowered` must be `text` lowercased.
    pub fn signature_hit(&self, text: &str, lowered: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(text),
            None => !self.literal.is_empty() && lowered.contains(&self.literal),
        }
    }
}

/// Fault pattern registry
///
/// Keyed by id in a `BTreeMap` so every snapshot comes out in ascending id
/// order regardless of registration order.
#[derive(Debug, Default)]
pub struct FaultPatternRegistry {
    patterns: RwLock<BTreeMap<String, CompiledPattern>>,
}

impl FaultPatternRegistry {
    /// Create registry with the built-in catalog
    pub fn new() -> Self {
        let registry = Self::empty();
        for pattern in builtin_patterns() {
            // Built-in signatures are known to compile
            if let Ok(compiled) = CompiledPattern::compile(pattern) {
                registry
                    .patterns
                    .write()
                    .insert(compiled.pattern.id.clone(), compiled);
            }
        }
        registry
    }

    /// Create registry with no patterns
    pub fn empty() -> Self {
        Self {
            patterns: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create registry from a list of patterns
    pub fn from_patterns(patterns: Vec<FaultPattern>) -> Result<Self> {
        let registry = Self::empty();
        for pattern in patterns {
            registry.register(pattern)?;
        }
        Ok(registry)
    }

    /// Load registry from a JSON seed file (array of patterns)
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pattern seed file {}", path.display()))?;
        let patterns: Vec<FaultPattern> = serde_json::from_str(&json)?;

        let registry = Self::from_patterns(patterns)?;
        tracing::info!(path = %path.display(), patterns = registry.len(), "Loaded fault pattern seed");
        Ok(registry)
    }

    /// Register a new pattern. Ids are never reused.
    pub fn register(&self, mut pattern: FaultPattern) -> Result<()> {
        pattern.observed_success_rate = pattern.observed_success_rate.clamp(0.0, 100.0);
        let compiled = CompiledPattern::compile(pattern)?;

        let mut patterns = self.patterns.write();
        if patterns.contains_key(&compiled.pattern.id) {
            return Err(RemedyError::InvalidPattern {
                id: compiled.pattern.id.clone(),
                reason: "duplicate pattern id".to_string(),
            });
        }
        patterns.insert(compiled.pattern.id.clone(), compiled);
        Ok(())
    }

    /// Replace `old_id` with a new version carrying a new id
    pub fn supersede(&self, old_id: &str, replacement: FaultPattern) -> Result<()> {
        if !self.contains(old_id) {
            return Err(RemedyError::PatternNotFound(old_id.to_string()));
        }
        let new_id = replacement.id.clone();
        self.register(replacement)?;

        if let Some(old) = self.patterns.write().get_mut(old_id) {
            old.pattern.superseded_by = Some(new_id);
        }
        Ok(())
    }

    /// Get pattern by id
    pub fn get(&self, id: &str) -> Option<FaultPattern> {
        self.patterns.read().get(id).map(|c| c.pattern.clone())
    }

    /// Check if pattern exists
    pub fn contains(&self, id: &str) -> bool {
        self.patterns.read().contains_key(id)
    }

    /// Active (non-superseded) patterns in ascending id order
    pub fn snapshot(&self) -> Vec<CompiledPattern> {
        self.patterns
            .read()
            .values()
            .filter(|c| !c.pattern.is_superseded())
            .cloned()
            .collect()
    }

    /// All patterns, superseded ones included
    pub fn patterns(&self) -> Vec<FaultPattern> {
        self.patterns.read().values().map(|c| c.pattern.clone()).collect()
    }

    /// Overwrite the observed success rate. Only the learning store calls this.
    pub(crate) fn set_observed_success_rate(&self, id: &str, rate: f64) -> bool {
        match self.patterns.write().get_mut(id) {
            Some(compiled) => {
                compiled.pattern.observed_success_rate = rate.clamp(0.0, 100.0);
                true
            }
            None => false,
        }
    }

    /// Get total number of patterns
    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.patterns.read().is_empty()
    }
}

fn builtin_patterns() -> Vec<FaultPattern> {
    vec![
        FaultPattern::new(
            "FP-IMPORT-PY",
            "No module named",
            FaultCategory::Import,
            "Python package is not installed in the active environment",
            "Install the missing package into the project environment",
        )
        .with_tags(["modulenotfounderror", "import", "python"])
        .with_severity(Severity::High)
        .with_fix_command(["pip", "install", "-r", "requirements.txt"])
        .with_success_rate(85.0),
        FaultPattern::new(
            "FP-IMPORT-JS",
            "Cannot find module",
            FaultCategory::Import,
            "Module path is wrong or the package is missing from node_modules",
            "Reinstall dependencies and check the import path",
        )
        .with_tags(["import", "module", "require"])
        .with_severity(Severity::High)
        .with_fix_command(["npm", "install"])
        .with_success_rate(70.0),
        FaultPattern::new(
            "FP-TYPE-ASSIGN",
            "is not assignable to type",
            FaultCategory::Type,
            "Value does not satisfy the declared type",
            "Align the value with the declared type or widen the declaration",
        )
        .with_tags(["error ts", "type"])
        .with_success_rate(60.0),
        FaultPattern::new(
            "FP-TYPE-NAME",
            "Cannot find name",
            FaultCategory::Type,
            "Identifier referenced before declaration",
            "Declare the variable or import the symbol",
        )
        .with_tags(["error ts", "reference"])
        .with_success_rate(65.0),
        FaultPattern::new(
            "FP-SYNTAX-EXPECTED",
            r"TS1005|SyntaxError: Unexpected token",
            FaultCategory::Syntax,
            "Missing comma, semicolon or bracket",
            "Insert the missing token at the reported position",
        )
        .regex()
        .with_tags(["expected", "syntax"])
        .with_severity(Severity::High)
        .with_success_rate(55.0),
        FaultPattern::new(
            "FP-DEP-ERESOLVE",
            "ERESOLVE",
            FaultCategory::Dependency,
            "Peer dependency ranges cannot be satisfied together",
            "Align peer dependency versions or reinstall with a clean lockfile",
        )
        .with_tags(["npm err", "peer", "dependency"])
        .with_severity(Severity::High)
        .with_fix_command(["npm", "install", "--legacy-peer-deps"])
        .with_success_rate(75.0),
        FaultPattern::new(
            "FP-SEC-AUDIT",
            "vulnerabilities",
            FaultCategory::Security,
            "Installed packages have published advisories",
            "Run the package manager audit fix and review breaking upgrades",
        )
        .with_tags(["npm audit", "severity", "advisory"])
        .with_severity(Severity::Critical)
        .with_fix_command(["npm", "audit", "fix"])
        .with_success_rate(80.0),
        FaultPattern::new(
            "FP-BUILD-OOM",
            "JavaScript heap out of memory",
            FaultCategory::Build,
            "Build process exceeded the default heap limit",
            "Raise the heap limit for the build or split the bundle",
        )
        .with_tags(["heap", "memory", "build"])
        .with_severity(Severity::Critical)
        .with_success_rate(50.0),
        FaultPattern::new(
            "FP-RUNTIME-PORT",
            "EADDRINUSE",
            FaultCategory::Runtime,
            "Another process is bound to the service port",
            "Stop the stale process or move the service to a free port",
        )
        .with_tags(["port", "address already in use", "listen"])
        .with_success_rate(70.0),
        FaultPattern::new(
            "FP-SEC-SECRET",
            r"\b(AKIA[0-9A-Z]{16}|ghp_[A-Za-z0-9]{36})\b",
            FaultCategory::Security,
            "Credential committed to the working tree",
            "Rotate the credential and purge it from history",
        )
        .regex()
        .with_tags(["secret", "token", "credential"])
        .with_severity(Severity::Critical)
        .with_success_rate(40.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = FaultPatternRegistry::new();
        assert_eq!(registry.len(), 10);
        assert!(registry.contains("FP-IMPORT-PY"));
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_snapshot_sorted_by_id() {
        let registry = FaultPatternRegistry::empty();
        registry
            .register(FaultPattern::new("b", "x", FaultCategory::Build, "", ""))
            .unwrap();
        registry
            .register(FaultPattern::new("a", "y", FaultCategory::Build, "", ""))
            .unwrap();

        let ids: Vec<String> = registry.snapshot().into_iter().map(|c| c.pattern.id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let registry = FaultPatternRegistry::empty();
        let pattern = FaultPattern::new("dup", "x", FaultCategory::Build, "", "");
        registry.register(pattern.clone()).unwrap();
        assert!(registry.register(pattern).is_err());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let registry = FaultPatternRegistry::empty();
        let pattern = FaultPattern::new("bad", "(unclosed", FaultCategory::Build, "", "").regex();
        let err = registry.register(pattern).unwrap_err();
        assert!(matches!(err, RemedyError::InvalidPattern { .. }));
    }

    #[test]
    fn test_supersede_hides_old_version() {
        let registry = FaultPatternRegistry::empty();
        registry
            .register(FaultPattern::new("v1", "old text", FaultCategory::Build, "", ""))
            .unwrap();
        registry
            .supersede("v1", FaultPattern::new("v2", "new text", FaultCategory::Build, "", ""))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("v1").unwrap().superseded_by.as_deref(), Some("v2"));
        let active: Vec<String> = registry.snapshot().into_iter().map(|c| c.pattern.id).collect();
        assert_eq!(active, vec!["v2".to_string()]);
    }

    #[test]
    fn test_supersede_unknown_pattern() {
        let registry = FaultPatternRegistry::empty();
        let result = registry.supersede("missing", FaultPattern::new("n", "x", FaultCategory::Build, "", ""));
        assert!(matches!(result, Err(RemedyError::PatternNotFound(_))));
    }

    #[test]
    fn test_observed_rate_clamped() {
        let registry = FaultPatternRegistry::new();
        assert!(registry.set_observed_success_rate("FP-IMPORT-PY", 140.0));
        assert_eq!(registry.get("FP-IMPORT-PY").unwrap().observed_success_rate, 100.0);
        assert!(!registry.set_observed_success_rate("missing", 10.0));
    }

    #[test]
    fn test_regex_signature_case_insensitive() {
        let compiled = CompiledPattern::compile(
            FaultPattern::new("r", r"ts1005", FaultCategory::Syntax, "", "").regex(),
        )
        .unwrap();
        let text = "error TS1005: ',' expected.";
        assert!(compiled.signature_hit(text, &text.to_lowercase()));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(
            &path,
            r#"[{"id":"S1","signature":"boom","category":"runtime","rootCause":"r","suggestedFix":"f","tags":["x"]}]"#,
        )
        .unwrap();

        let registry = FaultPatternRegistry::from_json_file(&path).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("S1").unwrap().category, FaultCategory::Runtime);
    }
}
