//! Google Generative Language API backend
//!
//! Gemini's generateContent endpoint uses "model" for the assistant
//! role, carries the system prompt as a separate instruction, and
//! authenticates through a query parameter.

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

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    contents: Vec<WireContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireSystemInstruction>,
    generation_config: WireGenerationConfig,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    role: &'static str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
struct WirePart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct WireSystemInstruction {
    parts: Vec<WireOwnedPart>,
}

#[derive(Debug, Serialize)]
struct WireOwnedPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    usage_metadata: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireCandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCandidateContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Deserialize)]
struct WireResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WireUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Split a conversation into Gemini contents and system instruction
fn to_wire(messages: &[ChatMessage]) -> (Vec<WireContent<'_>>, Option<WireSystemInstruction>) {
    let system: Vec<String> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.clone())
        .collect();

    let contents = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| WireContent {
            role: if m.role == Role::Assistant { "model" } else { "user" },
            parts: vec![WirePart { text: &m.content }],
        })
        .collect();

    let instruction = if system.is_empty() {
        None
    } else {
        Some(WireSystemInstruction {
            parts: system.into_iter().map(|text| WireOwnedPart { text }).collect(),
        })
    };

    (contents, instruction)
}

/// Backend for Gemini models
pub struct GoogleBackend {
    client: Client,
    base_url: Option<Url>,
    api_key: Option<SecretString>,
}

impl GoogleBackend {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn generate_url(&self, model: &str) -> String {
        let base = self
            .base_url
            .as_ref()
            .map_or_else(|| DEFAULT_BASE_URL.to_owned(), |u| u.as_str().to_owned());
        format!("{}/models/{model}:generateContent", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelBackend for GoogleBackend {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, model_id: &str, request: &CompletionRequest) -> Result<BackendResponse, BackendError> {
        let Some(api_key) = &self.api_key else {
            return Err(BackendError::NotConfigured {
                provider: Provider::Gemini,
            });
        };

        let (contents, system_instruction) = to_wire(&request.messages);
        let wire_request = WireRequest {
            contents,
            system_instruction,
            generation_config: WireGenerationConfig {
                max_output_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            },
        };

        let response = self
            .client
            .post(self.generate_url(model_id))
            .query(&[("key", api_key.expose_secret())])
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if status == http::StatusCode::UNAUTHORIZED || status == http::StatusCode::FORBIDDEN {
            return Err(BackendError::Auth {
                provider: Provider::Gemini,
            });
        }
        if status == http::StatusCode::TOO_MANY_REQUESTS {
            return Err(BackendError::RateLimited {
                provider: Provider::Gemini,
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                provider: Provider::Gemini,
                status,
                message,
            });
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        let candidate = wire
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Malformed("response contained no candidates".to_owned()))?;

        let content = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<Vec<_>>().join(""))
            .unwrap_or_default();
        let usage = wire.usage_metadata.unwrap_or_default();

        Ok(BackendResponse {
            content,
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            finish_reason: candidate.finish_reason.map(|r| r.to_lowercase()),
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn backend_for(server: &MockServer) -> GoogleBackend {
        GoogleBackend::new(&ProviderConfig {
            api_key: Some("g-test".into()),
            base_url: Some(server.uri().parse().unwrap()),
        })
    }

    #[test]
    fn assistant_role_becomes_model() {
        let conversation = [
            ChatMessage::system("be terse"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ];
        let (contents, instruction) = to_wire(&conversation);
        assert!(instruction.is_some());
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[1].role, "model");
    }

    #[tokio::test]
    async fn parses_successful_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "g-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": "hello"}]},
                    "finishReason": "STOP",
                }],
                "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 2},
            })))
            .mount(&server)
            .await;

        let request = CompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            max_tokens: None,
            temperature: None,
        };

        let response = backend_for(&server)
            .generate("gemini-1.5-flash", &request)
            .await
            .unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(response.input_tokens, 5);
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn empty_candidates_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
            .mount(&server)
            .await;

        let request = CompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            max_tokens: None,
            temperature: None,
        };

        let err = backend_for(&server)
            .generate("gemini-1.5-flash", &request)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }
}
