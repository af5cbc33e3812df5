//! Heuristic complexity scoring for inbound conversations
//!
//! Maps a conversation to a difficulty score in [0, 1] from three
//! signals: prompt length, keyword hits, and conversation depth. Pure
//! heuristics, no tokenizer — the chars/4 ratio is a design constant.

use cortex_config::ScorerConfig;
use cortex_core::{ChatMessage, Role};
use serde::Serialize;

/// Characters per estimated token
const CHARS_PER_TOKEN: usize = 4;

/// Individual factors feeding the final score, each in [0, 1]
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoringFactors {
    /// Prompt-length factor
    pub length_score: f64,
    /// Keyword factor; 0.5 is neutral (no keyword from either set)
    pub keyword_score: f64,
    /// Conversation-depth factor
    pub context_score: f64,
    /// Weighted combination of the above
    pub final_score: f64,
}

/// Result of scoring one conversation
#[derive(Debug, Clone, Copy)]
pub struct ComplexityScore {
    /// Difficulty in [0, 1], rounded to 2 decimals
    pub score: f64,
    /// Estimated input token count (chars / 4, rounded up)
    pub estimated_tokens: u32,
    /// Factor breakdown for logging and diagnostics
    pub factors: ScoringFactors,
}

/// Configured scorer with lowercased keyword sets
#[derive(Debug)]
pub struct ComplexityScorer {
    high_keywords: Vec<String>,
    low_keywords: Vec<String>,
    length_weight: f64,
    keyword_weight: f64,
    context_weight: f64,
    length_norm_tokens: f64,
    context_norm_turns: f64,
}

impl ComplexityScorer {
    /// Build a scorer from configuration
    ///
    /// Keywords are lowercased once here; matching is case-insensitive
    /// substring containment against the full conversation text.
    pub fn from_config(config: &ScorerConfig) -> Self {
        Self {
            high_keywords: config.high_keywords.iter().map(|k| k.to_lowercase()).collect(),
            low_keywords: config.low_keywords.iter().map(|k| k.to_lowercase()).collect(),
            length_weight: config.length_weight,
            keyword_weight: config.keyword_weight,
            context_weight: config.context_weight,
            length_norm_tokens: f64::from(config.length_norm_tokens),
            context_norm_turns: f64::from(config.context_norm_turns),
        }
    }

    /// Score a conversation
    ///
    /// Deterministic and pure. An empty conversation yields length and
    /// context factors of zero and the neutral keyword factor, so the
    /// final score is the keyword weight / 2.
    pub fn score(&self, messages: &[ChatMessage]) -> ComplexityScore {
        let blob = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let estimated_tokens = estimate_tokens(&blob);
        let length_score = (f64::from(estimated_tokens) / self.length_norm_tokens).min(1.0);

        let high_matches = count_matches(&blob, &self.high_keywords);
        let low_matches = count_matches(&blob, &self.low_keywords);

        let keyword_score = if high_matches + low_matches == 0 {
            // Neutral baseline when nothing matches
            0.5
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                high_matches as f64 / (high_matches + low_matches) as f64
            }
        };

        let turn_count = messages.iter().filter(|m| m.role != Role::System).count();
        #[allow(clippy::cast_precision_loss)]
        let context_score = (turn_count as f64 / self.context_norm_turns).min(1.0);

        let final_score = self
            .length_weight
            .mul_add(length_score, self.keyword_weight.mul_add(keyword_score, self.context_weight * context_score));

        ComplexityScore {
            score: round2(final_score),
            estimated_tokens,
            factors: ScoringFactors {
                length_score: round2(length_score),
                keyword_score: round2(keyword_score),
                context_score: round2(context_score),
                final_score: round2(final_score),
            },
        }
    }
}

impl Default for ComplexityScorer {
    fn default() -> Self {
        Self::from_config(&ScorerConfig::default())
    }
}

/// Rough token estimate: one token per four characters, rounded up
fn estimate_tokens(blob: &str) -> u32 {
    u32::try_from(blob.chars().count().div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX)
}

/// Count how many keywords from the set appear in the text
fn count_matches(blob: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|k| blob.contains(k.as_str())).count()
}

/// Round to 2 decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
