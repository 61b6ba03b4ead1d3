//! Capability registry
//!
//! Maintains the catalog of remediation capabilities and their rolling
//! statistics.
//!
//! Built-in capabilities:
//! - dependency-installer, npm-audit-fix: package manager repairs
//! - type-checker, linter-autofix: source diagnostics
//! - import-path-resolver: module resolution check
//! - clean-rebuild, cache-purge, service-restart: build and runtime resets
//! - secrets-rotation-check: credential scan
//! - diagnostic-snapshot: generic environment diagnostics

use crate::errors::{RemedyError, Result};
use crate::patterns::types::FaultCategory;
use crate::tools::types::Capability;
use anyhow::Context;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::Path;

/// Capability registry
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    /// Map of capability name to capability
    capabilities: RwLock<BTreeMap<String, Capability>>,
}

impl CapabilityRegistry {
    /// Create new registry with all built-in capabilities
    pub fn new() -> Self {
        let registry = Self::empty();

        registry.register_dependency_tools();
        registry.register_code_tools();
        registry.register_build_tools();
        registry.register_security_tools();
        registry.register_fallback_tools();

        registry
    }

    /// Create registry with no capabilities
    pub fn empty() -> Self {
        Self {
            capabilities: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create registry from a list of capabilities
    pub fn from_capabilities(capabilities: Vec<Capability>) -> Result<Self> {
        let registry = Self::empty();
        for capability in capabilities {
            registry.register(capability)?;
        }
        Ok(registry)
    }

    /// Load registry from a JSON seed file (array of capabilities)
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read capability seed file {}", path.display()))?;
        let capabilities: Vec<Capability> = serde_json::from_str(&json)?;

        let registry = Self::from_capabilities(capabilities)?;
        tracing::info!(path = %path.display(), capabilities = registry.len(), "Loaded capability seed");
        Ok(registry)
    }

    /// Register a capability. Names are unique.
    pub fn register(&self, mut capability: Capability) -> Result<()> {
        capability.success_rate = capability.success_rate.clamp(0.0, 100.0);

        let mut capabilities = self.capabilities.write();
        if capabilities.contains_key(&capability.name) {
            return Err(RemedyError::ConfigError(format!(
                "Duplicate capability name: {}",
                capability.name
            )));
        }
        capabilities.insert(capability.name.clone(), capability);
        Ok(())
    }

    fn register_builtin(&self, capability: Capability) {
        self.capabilities
            .write()
            .insert(capability.name.clone(), capability);
    }

    /// Register package manager repairs
    fn register_dependency_tools(&self) {
        self.register_builtin(
            Capability::new(
                "dependency-installer",
                [FaultCategory::Dependency, FaultCategory::Import],
            )
            .with_description("Reinstall project dependencies from the manifest")
            .with_success_rate(80.0)
            .with_cost_ms(20_000.0)
            .high_impact()
            .with_command(["npm", "install"]),
        );
        self.register_builtin(
            Capability::new(
                "npm-audit-fix",
                [FaultCategory::Dependency, FaultCategory::Security],
            )
            .with_description("Apply non-breaking advisory fixes")
            .with_success_rate(75.0)
            .with_cost_ms(15_000.0)
            .high_impact()
            .with_command(["npm", "audit", "fix"]),
        );
    }

    /// Register source diagnostics
    fn register_code_tools(&self) {
        self.register_builtin(
            Capability::new("type-checker", [FaultCategory::Type, FaultCategory::Syntax])
                .with_description("Run the type checker without emitting output")
                .with_success_rate(70.0)
                .with_cost_ms(8_000.0)
                .with_command(["npx", "tsc", "--noEmit"]),
        );
        self.register_builtin(
            Capability::new("linter-autofix", [FaultCategory::Syntax, FaultCategory::Type])
                .with_description("Apply lint autofixes")
                .with_success_rate(72.0)
                .with_cost_ms(5_000.0)
                .with_command(["npx", "eslint", ".", "--fix"]),
        );
        self.register_builtin(
            Capability::new("import-path-resolver", [FaultCategory::Import])
                .with_description("List the resolved dependency tree")
                .with_success_rate(65.0)
                .with_cost_ms(800.0)
                .with_command(["npm", "ls"]),
        );
    }

    /// Register build and runtime resets
    fn register_build_tools(&self) {
        self.register_builtin(
            Capability::new("clean-rebuild", [FaultCategory::Build, FaultCategory::Runtime])
                .with_description("Rebuild from a clean tree")
                .with_success_rate(68.0)
                .with_cost_ms(30_000.0)
                .high_impact()
                .with_command(["npm", "run", "build"]),
        );
        self.register_builtin(
            Capability::new(
                "cache-purge",
                [FaultCategory::Build, FaultCategory::Runtime, FaultCategory::Unknown],
            )
            .with_description("Verify and repair the package cache")
            .with_success_rate(60.0)
            .with_cost_ms(600.0)
            .with_command(["npm", "cache", "verify"]),
        );
        self.register_builtin(
            Capability::new("service-restart", [FaultCategory::Runtime])
                .with_description("Restart the application service")
                .with_success_rate(65.0)
                .with_cost_ms(2_000.0)
                .high_impact()
                .with_command(["npm", "restart"]),
        );
    }

    /// Register credential checks
    fn register_security_tools(&self) {
        self.register_builtin(
            Capability::new("secrets-rotation-check", [FaultCategory::Security])
                .with_description("Scan history for committed credentials")
                .with_success_rate(70.0)
                .with_cost_ms(900.0)
                .with_command(["git", "secrets", "--scan-history"]),
        );
    }

    /// Register generic diagnostics used for unknown failures
    fn register_fallback_tools(&self) {
        self.register_builtin(
            Capability::new("diagnostic-snapshot", [FaultCategory::Unknown])
                .with_description("Collect environment diagnostics")
                .with_success_rate(55.0)
                .with_cost_ms(700.0)
                .with_command(["npm", "doctor"]),
        );
    }

    /// Get capability by name
    pub fn get(&self, name: &str) -> Option<Capability> {
        self.capabilities.read().get(name).cloned()
    }

    /// Check if capability exists
    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.read().contains_key(name)
    }

    /// Get all capability names, sorted
    pub fn names(&self) -> Vec<String> {
        self.capabilities.read().keys().cloned().collect()
    }

    /// All capabilities in name order
    pub fn snapshot(&self) -> Vec<Capability> {
        self.capabilities.read().values().cloned().collect()
    }

    /// Capabilities eligible for a category
    pub fn for_category(&self, category: FaultCategory) -> Vec<Capability> {
        self.capabilities
            .read()
            .values()
            .filter(|c| c.handles(category))
            .cloned()
            .collect()
    }

    /// Apply one execution outcome. Only the executor calls this.
    ///
    /// `success_rate` moves as an exponential moving average with weight
    /// `ema_weight` on the newest sample; cost is a running mean.
    pub(crate) fn record_outcome(
        &self,
        name: &str,
        success: bool,
        duration_ms: u64,
        ema_weight: f64,
    ) -> Option<Capability> {
        let mut capabilities = self.capabilities.write();
        let capability = capabilities.get_mut(name)?;

        let weight = ema_weight.clamp(0.0, 1.0);
        let sample = if success { 100.0 } else { 0.0 };
        capability.success_rate =
            (capability.success_rate * (1.0 - weight) + sample * weight).clamp(0.0, 100.0);

        let uses = capability.total_uses as f64;
        capability.avg_execution_cost_ms =
            (capability.avg_execution_cost_ms * uses + duration_ms as f64) / (uses + 1.0);
        capability.total_uses += 1;
        capability.last_used_at = Some(Utc::now());

        Some(capability.clone())
    }

    /// Get total number of capabilities
    pub fn len(&self) -> usize {
        self.capabilities.read().len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.capabilities.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = CapabilityRegistry::new();
        assert_eq!(registry.len(), 10);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_every_category_covered() {
        let registry = CapabilityRegistry::new();
        for category in FaultCategory::all() {
            assert!(
                !registry.for_category(category).is_empty(),
                "no capability for {}",
                category
            );
        }
    }

    #[test]
    fn test_names_sorted() {
        let registry = CapabilityRegistry::new();
        let names = registry.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = CapabilityRegistry::empty();
        registry.register(Capability::new("x", [FaultCategory::Build])).unwrap();
        assert!(registry.register(Capability::new("x", [FaultCategory::Build])).is_err());
    }

    #[test]
    fn test_record_outcome_ema() {
        let registry = CapabilityRegistry::empty();
        registry
            .register(Capability::new("x", [FaultCategory::Build]).with_success_rate(50.0))
            .unwrap();

        let updated = registry.record_outcome("x", true, 100, 0.1).unwrap();
        assert!((updated.success_rate - 55.0).abs() < 1e-9);
        assert_eq!(updated.total_uses, 1);
        assert_eq!(updated.avg_execution_cost_ms, 100.0);
        assert!(updated.last_used_at.is_some());

        let updated = registry.record_outcome("x", false, 300, 0.1).unwrap();
        assert!((updated.success_rate - 49.5).abs() < 1e-9);
        assert_eq!(updated.avg_execution_cost_ms, 200.0);
        assert_eq!(updated.total_uses, 2);
    }

    #[test]
    fn test_record_outcome_unknown() {
        let registry = CapabilityRegistry::empty();
        assert!(registry.record_outcome("missing", true, 1, 0.1).is_none());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("capabilities.json");
        std::fs::write(
            &path,
            r#"[{"name":"restart","eligibleCategories":["runtime"],"successRate":90.0}]"#,
        )
        .unwrap();

        let registry = CapabilityRegistry::from_json_file(&path).unwrap();
        assert_eq!(registry.get("restart").unwrap().success_rate, 90.0);
    }
}
