use serde::Deserialize;

/// Retry and escalation tuning for the fallback execution engine
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackConfig {
    /// Attempts per model before moving to the next one
    #[serde(default = "default_max_retries_per_model")]
    pub max_retries_per_model: u32,
    /// Base backoff unit; the wait grows linearly with the attempt index
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Hard ceiling on a single backend call
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_retries_per_model: default_max_retries_per_model(),
            backoff_base_ms: default_backoff_base_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

const fn default_max_retries_per_model() -> u32 {
    2
}

const fn default_backoff_base_ms() -> u64 {
    500
}

const fn default_attempt_timeout_secs() -> u64 {
    30
}
