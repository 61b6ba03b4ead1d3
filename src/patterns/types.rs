//! Fault pattern type definitions

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Failure category shared by patterns, capabilities and learning entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultCategory {
    Syntax,
    Type,
    Import,
    Dependency,
    Build,
    Runtime,
    Security,
    Unknown,
}

impl FaultCategory {
    /// All categories in declaration order
    pub fn all() -> [FaultCategory; 8] {
        [
            FaultCategory::Syntax,
            FaultCategory::Type,
            FaultCategory::Import,
            FaultCategory::Dependency,
            FaultCategory::Build,
            FaultCategory::Runtime,
            FaultCategory::Security,
            FaultCategory::Unknown,
        ]
    }

    /// Get category name
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultCategory::Syntax => "syntax",
            FaultCategory::Type => "type",
            FaultCategory::Import => "import",
            FaultCategory::Dependency => "dependency",
            FaultCategory::Build => "build",
            FaultCategory::Runtime => "runtime",
            FaultCategory::Security => "security",
            FaultCategory::Unknown => "unknown",
        }
    }

    /// Parse a free-form hint such as an event type (`"build_error"`,
    /// `"dependency-scan"`). Unrecognised hints map to `None`.
    pub fn from_hint(hint: &str) -> Option<FaultCategory> {
        let hint = hint.trim().to_lowercase();
        let head = hint
            .split(|c: char| c == '_' || c == '-' || c == ' ' || c == ':')
            .next()
            .unwrap_or("");

        match head {
            "syntax" => Some(FaultCategory::Syntax),
            "type" | "typescript" | "typecheck" => Some(FaultCategory::Type),
            "import" | "module" => Some(FaultCategory::Import),
            "dependency" | "dependencies" | "npm" | "package" => Some(FaultCategory::Dependency),
            "build" | "compile" | "compilation" => Some(FaultCategory::Build),
            "runtime" | "crash" | "process" => Some(FaultCategory::Runtime),
            "security" | "secret" | "secrets" | "audit" | "vulnerability" => {
                Some(FaultCategory::Security)
            }
            "unknown" => Some(FaultCategory::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a fault or incoming error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Relative weight (0.25-1.0) used by risk heuristics
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Low => 0.25,
            Severity::Medium => 0.5,
            Severity::High => 0.75,
            Severity::Critical => 1.0,
        }
    }

    /// Parse severity name, case-insensitive
    pub fn parse(value: &str) -> Option<Severity> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// How a pattern signature is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    /// Case-insensitive substring
    #[default]
    Literal,
    /// Case-insensitive regular expression
    Regex,
}

/// Known fault signature with its root cause and fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultPattern {
    /// Unique pattern id
    pub id: String,

    /// Matchable text or regex
    pub signature: String,

    #[serde(default)]
    pub signature_kind: SignatureKind,

    pub category: FaultCategory,

    pub root_cause: String,

    /// Human-readable fix
    pub suggested_fix: String,

    /// Command (argv) that applies the fix, if the fix is automatable
    #[serde(default)]
    pub fix_command: Vec<String>,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub severity: Severity,

    /// Observed success rate (0-100), written only by the learning store
    #[serde(default)]
    pub observed_success_rate: f64,

    /// Id of the pattern that replaced this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
}

impl FaultPattern {
    /// Create a literal-signature pattern with medium severity
    pub fn new(
        id: impl Into<String>,
        signature: impl Into<String>,
        category: FaultCategory,
        root_cause: impl Into<String>,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            signature: signature.into(),
            signature_kind: SignatureKind::Literal,
            category,
            root_cause: root_cause.into(),
            suggested_fix: suggested_fix.into(),
            fix_command: Vec::new(),
            tags: BTreeSet::new(),
            severity: Severity::Medium,
            observed_success_rate: 0.0,
            superseded_by: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_fix_command<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fix_command = argv.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.observed_success_rate = rate.clamp(0.0, 100.0);
        self
    }

    pub fn regex(mut self) -> Self {
        self.signature_kind = SignatureKind::Regex;
        self
    }

    /// Check whether a newer pattern replaced this one
    pub fn is_superseded(&self) -> bool {
        self.superseded_by.is_some()
    }
}

/// Incoming error under diagnosis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    pub message: String,

    #[serde(default)]
    pub stack: Option<String>,

    /// Category hint from the caller
    #[serde(default)]
    pub category: Option<FaultCategory>,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ErrorContext {
    /// Create context from an error message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_category(mut self, category: FaultCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Message and stack joined, as the text patterns are matched against
    pub fn searchable_text(&self) -> String {
        match &self.stack {
            Some(stack) if !stack.is_empty() => format!("{}\n{}", self.message, stack),
            _ => self.message.clone(),
        }
    }
}

/// Scored match of a context against one pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub pattern_id: String,

    /// Confidence (0-100)
    pub confidence: u8,

    pub matched_signature: String,
}
