//! Backend trait and per-provider implementations

pub mod anthropic;
pub mod google;
pub mod openai;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cortex_config::{Provider, ProvidersConfig};

use crate::error::BackendError;
use crate::types::{BackendResponse, CompletionRequest};

use self::anthropic::AnthropicBackend;
use self::google::GoogleBackend;
use self::openai::OpenAiBackend;

/// One upstream completion API
///
/// A backend serves every catalog model of its provider; the model id
/// travels with each call rather than living on the backend.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Provider this backend speaks to
    fn provider(&self) -> Provider;

    /// Run one completion attempt against the given model
    async fn generate(&self, model_id: &str, request: &CompletionRequest) -> Result<BackendResponse, BackendError>;
}

/// Build a backend for every configured provider
///
/// Providers absent from configuration get no backend; the fallback
/// engine skips their catalog models.
pub fn build_backends(config: &ProvidersConfig) -> HashMap<Provider, Arc<dyn ModelBackend>> {
    let mut backends: HashMap<Provider, Arc<dyn ModelBackend>> = HashMap::new();

    for provider in [
        Provider::Openai,
        Provider::Anthropic,
        Provider::Gemini,
        Provider::Groq,
        Provider::Mistral,
    ] {
        let Some(provider_config) = config.get(provider) else {
            tracing::debug!(provider = %provider, "provider not configured, skipping");
            continue;
        };

        let backend: Arc<dyn ModelBackend> = match provider {
            Provider::Anthropic => Arc::new(AnthropicBackend::new(provider_config)),
            Provider::Gemini => Arc::new(GoogleBackend::new(provider_config)),
            // Groq and Mistral expose OpenAI-compatible APIs
            Provider::Openai | Provider::Groq | Provider::Mistral => {
                Arc::new(OpenAiBackend::new(provider, provider_config))
            }
        };

        backends.insert(provider, backend);
    }

    backends
}

#[cfg(test)]
mod tests {
    use cortex_config::ProviderConfig;

    use super::*;

    #[test]
    fn unconfigured_providers_get_no_backend() {
        let backends = build_backends(&ProvidersConfig::default());
        assert!(backends.is_empty());
    }

    #[test]
    fn configured_providers_get_backends() {
        let config = ProvidersConfig {
            openai: Some(ProviderConfig {
                api_key: Some("sk-test".into()),
                base_url: None,
            }),
            groq: Some(ProviderConfig {
                api_key: Some("gsk-test".into()),
                base_url: None,
            }),
            ..ProvidersConfig::default()
        };

        let backends = build_backends(&config);
        assert_eq!(backends.len(), 2);
        assert!(backends.contains_key(&Provider::Openai));
        assert!(backends.contains_key(&Provider::Groq));
        assert!(!backends.contains_key(&Provider::Anthropic));
    }
}
