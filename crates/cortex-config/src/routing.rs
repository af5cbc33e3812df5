use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// User-level dial that shifts the score-to-tier thresholds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoutingPreference {
    /// Favor cheap models; only clearly hard requests escalate
    Cost,
    /// Default balance of cost and quality
    #[default]
    Balanced,
    /// Favor premium models at the first sign of difficulty
    Quality,
}

/// Score boundaries for one preference: `score < cheap` routes cheap,
/// `score < mid` routes mid, anything at or above `mid` routes premium
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierThresholds {
    pub cheap: f64,
    pub mid: f64,
}

/// Threshold tables per routing preference
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdsConfig {
    #[serde(default = "default_cost_thresholds")]
    pub cost: TierThresholds,
    #[serde(default = "default_balanced_thresholds")]
    pub balanced: TierThresholds,
    #[serde(default = "default_quality_thresholds")]
    pub quality: TierThresholds,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            cost: default_cost_thresholds(),
            balanced: default_balanced_thresholds(),
            quality: default_quality_thresholds(),
        }
    }
}

impl ThresholdsConfig {
    /// Threshold table for a preference
    pub const fn for_preference(&self, preference: RoutingPreference) -> TierThresholds {
        match preference {
            RoutingPreference::Cost => self.cost,
            RoutingPreference::Balanced => self.balanced,
            RoutingPreference::Quality => self.quality,
        }
    }
}

const fn default_cost_thresholds() -> TierThresholds {
    TierThresholds { cheap: 0.5, mid: 0.8 }
}

const fn default_balanced_thresholds() -> TierThresholds {
    TierThresholds { cheap: 0.3, mid: 0.7 }
}

const fn default_quality_thresholds() -> TierThresholds {
    TierThresholds { cheap: 0.2, mid: 0.5 }
}

/// Complexity scorer tuning
///
/// Keyword sets and weights are configuration, not constants — the
/// heuristic has been retuned before and will be again.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScorerConfig {
    /// Phrases whose presence suggests a hard request
    #[serde(default = "default_high_keywords")]
    pub high_keywords: Vec<String>,
    /// Phrases whose presence suggests a trivial request
    #[serde(default = "default_low_keywords")]
    pub low_keywords: Vec<String>,
    /// Weight of the prompt-length factor
    #[serde(default = "default_length_weight")]
    pub length_weight: f64,
    /// Weight of the keyword factor
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
    /// Weight of the conversation-depth factor
    #[serde(default = "default_context_weight")]
    pub context_weight: f64,
    /// Estimated token count at which the length factor saturates
    #[serde(default = "default_length_norm_tokens")]
    pub length_norm_tokens: u32,
    /// Non-system turn count at which the context factor saturates
    #[serde(default = "default_context_norm_turns")]
    pub context_norm_turns: u32,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            high_keywords: default_high_keywords(),
            low_keywords: default_low_keywords(),
            length_weight: default_length_weight(),
            keyword_weight: default_keyword_weight(),
            context_weight: default_context_weight(),
            length_norm_tokens: default_length_norm_tokens(),
            context_norm_turns: default_context_norm_turns(),
        }
    }
}

const fn default_length_weight() -> f64 {
    0.40
}

const fn default_keyword_weight() -> f64 {
    0.45
}

const fn default_context_weight() -> f64 {
    0.15
}

const fn default_length_norm_tokens() -> u32 {
    4000
}

const fn default_context_norm_turns() -> u32 {
    10
}

fn default_high_keywords() -> Vec<String> {
    [
        "analyze",
        "analysis",
        "complex",
        "detailed",
        "comprehensive",
        "research",
        "explain in depth",
        "step by step",
        "algorithm",
        "architecture",
        "design",
        "implement",
        "debug",
        "optimize",
        "refactor",
        "mathematical",
        "proof",
        "derive",
        "calculate",
        "synthesize",
        "evaluate",
        "compare",
        "contrast",
        "write a",
        "create a",
        "build a",
        "generate a",
        "develop a",
        "essay",
        "report",
        "thesis",
        "dissertation",
        "paper",
        "code",
        "function",
        "class",
        "module",
        "api",
        "database",
        "sql",
        "machine learning",
        "neural",
        "transformer",
        "embedding",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

fn default_low_keywords() -> Vec<String> {
    [
        "what is",
        "what are",
        "who is",
        "when did",
        "where is",
        "yes or no",
        "true or false",
        "define",
        "list",
        "name",
        "translate",
        "summarize briefly",
        "tldr",
        "quick",
        "simple",
        "basic",
        "easy",
        "short",
        "brief",
        "hello",
        "hi",
        "thanks",
        "thank you",
        "ok",
        "okay",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

/// Routing configuration: scorer tuning plus tier thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Complexity scorer tuning
    #[serde(default)]
    pub scorer: ScorerConfig,
    /// Score-to-tier thresholds per preference
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    /// Output token count assumed when estimating cost before execution
    #[serde(default = "default_estimated_output_tokens")]
    pub estimated_output_tokens: u32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            scorer: ScorerConfig::default(),
            thresholds: ThresholdsConfig::default(),
            estimated_output_tokens: default_estimated_output_tokens(),
        }
    }
}

const fn default_estimated_output_tokens() -> u32 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preference_is_balanced() {
        assert_eq!(RoutingPreference::default(), RoutingPreference::Balanced);
    }

    #[test]
    fn default_thresholds_tighten_toward_quality() {
        let t = ThresholdsConfig::default();
        assert!(t.quality.cheap <= t.balanced.cheap);
        assert!(t.balanced.cheap <= t.cost.cheap);
        assert!(t.quality.mid <= t.balanced.mid);
        assert!(t.balanced.mid <= t.cost.mid);
    }

    #[test]
    fn default_weights_sum_to_one() {
        let s = ScorerConfig::default();
        let sum = s.length_weight + s.keyword_weight + s.context_weight;
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
