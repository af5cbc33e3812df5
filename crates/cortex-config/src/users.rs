use secrecy::SecretString;
use serde::Deserialize;

use crate::routing::RoutingPreference;

/// Required prefix for API keys
pub const API_KEY_PREFIX: &str = "crtx_";

/// One API user and their routing settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    /// Stable user identifier used for spend bookkeeping
    pub id: String,
    /// Bearer token; must start with `crtx_`
    pub api_key: SecretString,
    /// Tier-selection dial
    #[serde(default)]
    pub routing_preference: RoutingPreference,
    /// Monthly spend ceiling in USD; absent means unlimited
    #[serde(default)]
    pub monthly_budget: Option<f64>,
}
