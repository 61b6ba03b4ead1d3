//! Pattern Matcher: scores an error context against every registered pattern
//!
//! confidence = signature hit (80) + tag coverage (up to 20) + severity bonus,
//! clamped to 100. Output is sorted by confidence descending, then by
//! pattern id ascending, so equal inputs always produce equal output.

use crate::patterns::registry::{CompiledPattern, FaultPatternRegistry};
use crate::patterns::types::{ErrorContext, Match, Severity};
use serde::{Deserialize, Serialize};

/// Matcher scoring weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Score for a signature hit
    pub signature_weight: u8,
    /// Score for full tag coverage
    pub tag_weight: u8,
    pub critical_bonus: u8,
    pub high_bonus: u8,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            signature_weight: 80,
            tag_weight: 20,
            critical_bonus: 10,
            high_bonus: 5,
        }
    }
}

/// Stateless pattern matcher
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    config: MatcherConfig,
}

impl PatternMatcher {
    /// Create a new pattern matcher
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Score `context` against every active pattern.
    /// An empty result means no pattern applies; it is not an error.
    pub fn match_context(&self, registry: &FaultPatternRegistry, context: &ErrorContext) -> Vec<Match> {
        let text = context.searchable_text();
        let lowered = text.to_lowercase();

        let mut matches: Vec<Match> = registry
            .snapshot()
            .iter()
            .filter_map(|compiled| self.score(compiled, &text, &lowered))
            .collect();

        matches.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| a.pattern_id.cmp(&b.pattern_id))
        });

        tracing::debug!(matches = matches.len(), "Pattern matching complete");
        matches
    }

    /// Best match, if any
    pub fn best_match(&self, registry: &FaultPatternRegistry, context: &ErrorContext) -> Option<Match> {
        self.match_context(registry, context).into_iter().next()
    }

    fn score(&self, compiled: &CompiledPattern, text: &str, lowered: &str) -> Option<Match> {
        let pattern = &compiled.pattern;
        let signature_hit = compiled.signature_hit(text, lowered);

        let matched_tags = pattern
            .tags
            .iter()
            .filter(|tag| !tag.is_empty() && lowered.contains(&tag.to_lowercase()))
            .count();

        // Severity alone is not evidence
        if !signature_hit && matched_tags == 0 {
            return None;
        }

        let mut confidence = 0.0_f64;
        if signature_hit {
            confidence += self.config.signature_weight as f64;
        }
        if !pattern.tags.is_empty() {
            confidence += self.config.tag_weight as f64 * matched_tags as f64 / pattern.tags.len() as f64;
        }
        confidence += match pattern.severity {
            Severity::Critical => self.config.critical_bonus as f64,
            Severity::High => self.config.high_bonus as f64,
            _ => 0.0,
        };

        let confidence = confidence.round().clamp(0.0, 100.0) as u8;
        if confidence == 0 {
            return None;
        }

        Some(Match {
            pattern_id: pattern.id.clone(),
            confidence,
            matched_signature: pattern.signature.clone(),
        })
    }
}
