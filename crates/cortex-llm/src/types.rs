//! Internal completion types shared by backends and the orchestrator

use cortex_config::Tier;
use cortex_core::ChatMessage;
use cortex_routing::ModelInfo;

/// Provider-agnostic completion request
///
/// The model is chosen by the router, not the caller, so it is not
/// part of this type; backends receive the resolved model id alongside.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Conversation to complete, in order
    pub messages: Vec<ChatMessage>,
    /// Completion token ceiling; backends apply their default when unset
    pub max_tokens: Option<u32>,
    /// Sampling temperature; backends apply their default when unset
    pub temperature: Option<f64>,
}

/// What one backend call produced
#[derive(Debug, Clone)]
pub struct BackendResponse {
    /// Generated text
    pub content: String,
    /// Prompt tokens as reported by the provider
    pub input_tokens: u32,
    /// Completion tokens as reported by the provider
    pub output_tokens: u32,
    /// Provider finish reason, normalized to lowercase
    pub finish_reason: Option<String>,
}

/// A completion that survived the fallback engine
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// Generated text
    pub content: String,
    /// Catalog entry of the model that produced it
    pub model: ModelInfo,
    /// Tier the model belongs to
    pub tier: Tier,
    /// Prompt tokens as reported by the provider
    pub input_tokens: u32,
    /// Completion tokens as reported by the provider
    pub output_tokens: u32,
    /// Wall time of the successful attempt
    pub latency_ms: u64,
    /// Provider finish reason
    pub finish_reason: Option<String>,
    /// Whether the serving tier differs from the selected one
    pub fallback_used: bool,
}
