//! OpenAI-compatible chat completions backend
//!
//! Serves three providers: OpenAI itself plus Groq and Mistral, whose
//! APIs speak the same wire format at different base URLs.

use async_trait::async_trait;
use cortex_config::{Provider, ProviderConfig};
use cortex_core::{ChatMessage, Role};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use super::ModelBackend;
use crate::error::BackendError;
use crate::types::{BackendResponse, CompletionRequest};

/// Completion token ceiling applied when the caller sets none
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Sampling temperature applied when the caller sets none
const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Canonical base URL for each OpenAI-compatible provider
fn default_base_url(provider: Provider) -> &'static str {
    match provider {
        Provider::Groq => "https://api.groq.com/openai/v1",
        Provider::Mistral => "https://api.mistral.ai/v1",
        _ => "https://api.openai.com/v1",
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

const fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn to_wire_messages(messages: &[ChatMessage]) -> Vec<WireMessage<'_>> {
    messages
        .iter()
        .map(|m| WireMessage {
            role: role_str(m.role),
            content: &m.content,
        })
        .collect()
}

/// Backend for OpenAI and OpenAI-compatible providers
pub struct OpenAiBackend {
    provider: Provider,
    client: Client,
    base_url: Option<Url>,
    api_key: Option<SecretString>,
}

impl OpenAiBackend {
    pub fn new(provider: Provider, config: &ProviderConfig) -> Self {
        Self {
            provider,
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn completions_url(&self) -> String {
        let base = self
            .base_url
            .as_ref()
            .map_or_else(|| default_base_url(self.provider).to_owned(), |u| u.as_str().to_owned());
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn generate(&self, model_id: &str, request: &CompletionRequest) -> Result<BackendResponse, BackendError> {
        let Some(api_key) = &self.api_key else {
            return Err(BackendError::NotConfigured {
                provider: self.provider,
            });
        };

        let wire_request = WireRequest {
            model: model_id,
            messages: to_wire_messages(&request.messages),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key.expose_secret())
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if status == http::StatusCode::UNAUTHORIZED || status == http::StatusCode::FORBIDDEN {
            return Err(BackendError::Auth {
                provider: self.provider,
            });
        }
        if status == http::StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::RateLimited {
                provider: self.provider,
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                provider: self.provider,
                status,
                message,
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Malformed("response contained no choices".to_owned()))?;
        let usage = wire.usage.unwrap_or_default();

        Ok(BackendResponse {
            content: choice.message.content.unwrap_or_default(),
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            finish_reason: choice.finish_reason,
        })
    }
}
