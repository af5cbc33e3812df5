use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::catalog::Provider;

/// Credentials and endpoint override for one upstream provider
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key sent to the provider
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override for OpenAI-compatible endpoints
    #[serde(default)]
    pub base_url: Option<Url>,
}

/// Per-provider upstream configuration
///
/// A provider left unconfigured is skipped by the fallback engine;
/// its catalog models never receive attempts.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: Option<ProviderConfig>,
    #[serde(default)]
    pub anthropic: Option<ProviderConfig>,
    #[serde(default)]
    pub gemini: Option<ProviderConfig>,
    #[serde(default)]
    pub groq: Option<ProviderConfig>,
    #[serde(default)]
    pub mistral: Option<ProviderConfig>,
}

impl ProvidersConfig {
    /// Configuration for a provider, if present
    pub const fn get(&self, provider: Provider) -> Option<&ProviderConfig> {
        match provider {
            Provider::Openai => self.openai.as_ref(),
            Provider::Anthropic => self.anthropic.as_ref(),
            Provider::Gemini => self.gemini.as_ref(),
            Provider::Groq => self.groq.as_ref(),
            Provider::Mistral => self.mistral.as_ref(),
        }
    }
}
