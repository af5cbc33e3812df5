//! Anthropic Messages API backend
//!
//! The Messages API takes system prompts as a top-level field rather
//! than in the message list, and requires an explicit max_tokens.

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

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<WireContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// Split a conversation into the Messages API shape
///
/// System turns are concatenated into the top-level system prompt;
/// everything else stays in the message list in order.
fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<WireMessage<'_>>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let wire = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| WireMessage {
            role: if m.role == Role::Assistant { "assistant" } else { "user" },
            content: &m.content,
        })
        .collect();

    let system = if system.is_empty() { None } else { Some(system.join("\n\n")) };
    (system, wire)
}

/// Backend for Anthropic models
pub struct AnthropicBackend {
    client: Client,
    base_url: Option<Url>,
    api_key: Option<SecretString>,
}

impl AnthropicBackend {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn messages_url(&self) -> String {
        let base = self
            .base_url
            .as_ref()
            .map_or_else(|| DEFAULT_BASE_URL.to_owned(), |u| u.as_str().to_owned());
        format!("{}/messages", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn generate(&self, model_id: &str, request: &CompletionRequest) -> Result<BackendResponse, BackendError> {
        let Some(api_key) = &self.api_key else {
            return Err(BackendError::NotConfigured {
                provider: Provider::Anthropic,
            });
        };

        let (system, messages) = split_system(&request.messages);
        let wire_request = WireRequest {
            model: model_id,
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            system,
            messages,
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if status == http::StatusCode::UNAUTHORIZED || status == http::StatusCode::FORBIDDEN {
            return Err(BackendError::Auth {
                provider: Provider::Anthropic,
            });
        }
        if status == http::StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::RateLimited {
                provider: Provider::Anthropic,
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                provider: Provider::Anthropic,
                status,
                message,
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        let content = wire
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        let usage = wire.usage.unwrap_or_default();

        Ok(BackendResponse {
            content,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            finish_reason: wire.stop_reason,
        })
    }
}
