use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Capability and cost class of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    /// Fast, low-cost models for simple requests
    Cheap,
    /// Balanced capability and cost
    Mid,
    /// Flagship models for hard requests
    Premium,
}

impl Tier {
    /// All tiers from cheapest to most capable
    pub const ALL: [Self; 3] = [Self::Cheap, Self::Mid, Self::Premium];

    /// Three escalation steps upward from this tier, clamped at premium
    ///
    /// Every start tier gets the same number of passes; a pass past the
    /// top repeats premium rather than descending, so a premium start
    /// retries its own tier until the step budget runs out.
    pub const fn escalation_path(self) -> &'static [Self] {
        match self {
            Self::Cheap => &[Self::Cheap, Self::Mid, Self::Premium],
            Self::Mid => &[Self::Mid, Self::Premium, Self::Premium],
            Self::Premium => &[Self::Premium, Self::Premium, Self::Premium],
        }
    }
}

/// Upstream provider a model belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provider {
    Openai,
    Anthropic,
    Gemini,
    Groq,
    Mistral,
}

/// A single catalog entry: pricing and capability metadata for one model
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    /// Model identifier as sent to the provider
    pub id: String,
    /// Provider that serves this model
    pub provider: Provider,
    /// Capability tier
    pub tier: Tier,
    /// USD per million input tokens
    pub input_cost_per_mtok: f64,
    /// USD per million output tokens
    pub output_cost_per_mtok: f64,
    /// Context window in tokens
    pub context_window: u32,
    /// Typical end-to-end latency in milliseconds
    pub avg_latency_ms: u64,
}

/// Preference-ordered model ids per tier
///
/// The order is curated by cost and speed, not alphabetical. Every id
/// must exist in the catalog; each tier must be non-empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierOrderingConfig {
    pub cheap: Vec<String>,
    pub mid: Vec<String>,
    pub premium: Vec<String>,
}

impl Default for TierOrderingConfig {
    fn default() -> Self {
        Self {
            cheap: vec![
                "llama-3.1-8b-instant".to_owned(),
                "gemini-1.5-flash".to_owned(),
                "claude-3-haiku-20240307".to_owned(),
                "gpt-3.5-turbo".to_owned(),
                "mistral-small-latest".to_owned(),
            ],
            mid: vec![
                "gpt-4o-mini".to_owned(),
                "llama-3.1-70b-versatile".to_owned(),
                "mistral-large-latest".to_owned(),
            ],
            premium: vec![
                "gpt-4o".to_owned(),
                "claude-3-5-sonnet-20241022".to_owned(),
                "gemini-1.5-pro".to_owned(),
            ],
        }
    }
}

impl TierOrderingConfig {
    /// Model ids for a tier, in preference order
    pub fn for_tier(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Cheap => &self.cheap,
            Tier::Mid => &self.mid,
            Tier::Premium => &self.premium,
        }
    }
}

/// Model catalog configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Known models with pricing metadata
    #[serde(default = "default_models")]
    pub models: Vec<ModelEntry>,
    /// Preference ordering within each tier
    #[serde(default)]
    pub tiers: TierOrderingConfig,
    /// Baseline premium model used for hypothetical-cost computation
    #[serde(default = "default_reference_model")]
    pub reference_model: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            tiers: TierOrderingConfig::default(),
            reference_model: default_reference_model(),
        }
    }
}

fn default_reference_model() -> String {
    "gpt-4o".to_owned()
}

/// Built-in catalog with pricing as of early 2025, USD per 1M tokens
fn default_models() -> Vec<ModelEntry> {
    fn entry(
        id: &str,
        provider: Provider,
        tier: Tier,
        input: f64,
        output: f64,
        context_window: u32,
        avg_latency_ms: u64,
    ) -> ModelEntry {
        ModelEntry {
            id: id.to_owned(),
            provider,
            tier,
            input_cost_per_mtok: input,
            output_cost_per_mtok: output,
            context_window,
            avg_latency_ms,
        }
    }

    vec![
        entry("gpt-3.5-turbo", Provider::Openai, Tier::Cheap, 0.50, 1.50, 16_385, 800),
        entry("gpt-4o-mini", Provider::Openai, Tier::Mid, 0.15, 0.60, 128_000, 1000),
        entry("gpt-4o", Provider::Openai, Tier::Premium, 5.00, 15.00, 128_000, 2000),
        entry(
            "claude-3-haiku-20240307",
            Provider::Anthropic,
            Tier::Cheap,
            0.25,
            1.25,
            200_000,
            600,
        ),
        entry(
            "claude-3-5-sonnet-20241022",
            Provider::Anthropic,
            Tier::Premium,
            3.00,
            15.00,
            200_000,
            2500,
        ),
        entry(
            "gemini-1.5-flash",
            Provider::Gemini,
            Tier::Cheap,
            0.075,
            0.30,
            1_000_000,
            700,
        ),
        entry(
            "gemini-1.5-pro",
            Provider::Gemini,
            Tier::Premium,
            3.50,
            10.50,
            2_000_000,
            3000,
        ),
        entry(
            "llama-3.1-8b-instant",
            Provider::Groq,
            Tier::Cheap,
            0.05,
            0.08,
            131_072,
            200,
        ),
        entry(
            "llama-3.1-70b-versatile",
            Provider::Groq,
            Tier::Mid,
            0.59,
            0.79,
            131_072,
            500,
        ),
        entry(
            "mistral-small-latest",
            Provider::Mistral,
            Tier::Cheap,
            0.20,
            0.60,
            32_000,
            900,
        ),
        entry(
            "mistral-large-latest",
            Provider::Mistral,
            Tier::Mid,
            2.00,
            6.00,
            128_000,
            2000,
        ),
    ]
}
