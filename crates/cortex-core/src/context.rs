use cortex_config::RoutingPreference;

/// Authenticated caller and their account routing settings
///
/// Resolved by the transport layer before the orchestrator runs.
#[derive(Debug, Clone)]
pub struct CallerProfile {
    /// Stable user identifier used for spend bookkeeping
    pub user_id: String,
    /// Tier-selection dial from the account configuration
    pub routing_preference: RoutingPreference,
    /// Monthly spend ceiling in USD; `None` means unlimited
    pub monthly_budget: Option<f64>,
}

impl CallerProfile {
    /// Profile with default routing and no budget, for embedded use
    pub fn unrestricted(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            routing_preference: RoutingPreference::default(),
            monthly_budget: None,
        }
    }
}
