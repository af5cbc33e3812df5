//! OpenAI-compatible wire types

use cortex_core::ChatMessage;
use cortex_llm::{RoutedCompletion, RoutingMetadata};
use serde::{Deserialize, Serialize};

/// `POST /v1/chat/completions` request body
#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
    /// Catalog model id, or `"auto"` for automatic routing
    #[serde(default = "default_model")]
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Accepted for wire compatibility; `true` is rejected
    #[serde(default)]
    pub stream: Option<bool>,
}

fn default_model() -> String {
    "auto".to_owned()
}

/// `POST /v1/chat/completions` response body
#[derive(Debug, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    /// Model that actually served the request
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
    /// Routing decision and cost summary, a vendor extension
    pub cortex: RoutingMetadata,
}

#[derive(Debug, Serialize)]
pub struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatCompletionResponse {
    /// Build the wire response from a routed completion
    pub fn from_routed(routed: RoutedCompletion, created: u64) -> Self {
        let RoutedCompletion { outcome, metadata } = routed;

        Self {
            id: format!("cortex-{}", uuid::Uuid::new_v4()),
            object: "chat.completion".to_owned(),
            created,
            model: outcome.model.id,
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: "assistant".to_owned(),
                    content: outcome.content,
                },
                finish_reason: outcome.finish_reason,
            }],
            usage: Usage {
                prompt_tokens: outcome.input_tokens,
                completion_tokens: outcome.output_tokens,
                total_tokens: outcome.input_tokens + outcome.output_tokens,
            },
            cortex: metadata,
        }
    }
}

/// One entry of `GET /v1/models`
#[derive(Debug, Serialize)]
pub struct ModelListing {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
    /// Capability tier, a vendor extension
    pub tier: String,
}

/// `GET /v1/models` response body
#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelListing>,
}
