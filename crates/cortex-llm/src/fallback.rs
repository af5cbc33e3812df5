//! Tiered fallback execution
//!
//! Walks three escalation steps from the selected tier, clamped at
//! premium, giving every model in a tier its retry budget before
//! moving on. Escalation never descends; steps past the top repeat
//! premium, so a premium start re-runs its own tier until the step
//! budget is spent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cortex_config::{FallbackConfig, Provider, Tier};
use cortex_routing::ModelCatalog;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backend::ModelBackend;
use crate::error::{BackendError, GatewayError};
use crate::types::{CompletionOutcome, CompletionRequest};

/// Executes completions with per-model retries and tier escalation
pub struct FallbackEngine {
    catalog: Arc<ModelCatalog>,
    backends: HashMap<Provider, Arc<dyn ModelBackend>>,
    max_retries_per_model: u32,
    backoff_base: Duration,
    attempt_timeout: Duration,
}

impl FallbackEngine {
    pub fn new(
        catalog: Arc<ModelCatalog>,
        backends: HashMap<Provider, Arc<dyn ModelBackend>>,
        config: &FallbackConfig,
    ) -> Self {
        Self {
            catalog,
            backends,
            max_retries_per_model: config.max_retries_per_model,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
        }
    }

    /// Run a completion, escalating tiers until one model answers
    ///
    /// `preferred_model` moves a caller-pinned model to the front of its
    /// tier's ordering; the rest of the path is unchanged, so a broken
    /// pinned model still degrades gracefully.
    pub async fn execute(
        &self,
        start_tier: Tier,
        preferred_model: Option<&str>,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<CompletionOutcome, GatewayError> {
        let mut last_error: Option<BackendError> = None;

        for &tier in start_tier.escalation_path() {
            for model_id in self.tier_order(tier, preferred_model) {
                // Orderings are validated against the catalog at startup
                let Some(model) = self.catalog.get(model_id) else {
                    continue;
                };

                let Some(backend) = self.backends.get(&model.provider) else {
                    tracing::debug!(model = %model_id, provider = %model.provider, "provider not configured, skipping model");
                    last_error = Some(BackendError::NotConfigured {
                        provider: model.provider,
                    });
                    continue;
                };

                match self.attempt_model(backend.as_ref(), model_id, request, cancel).await? {
                    Ok(response) => {
                        let fallback_used = tier != start_tier;
                        if fallback_used {
                            tracing::info!(model = %model_id, tier = %tier, start_tier = %start_tier, "served after tier escalation");
                        }
                        return Ok(CompletionOutcome {
                            content: response.response.content,
                            model: model.clone(),
                            tier,
                            input_tokens: response.response.input_tokens,
                            output_tokens: response.response.output_tokens,
                            latency_ms: response.latency_ms,
                            finish_reason: response.response.finish_reason,
                            fallback_used,
                        });
                    }
                    Err(e) => last_error = Some(e),
                }
            }
        }

        let source = last_error.unwrap_or_else(|| BackendError::Malformed("no eligible model".to_owned()));
        tracing::error!(start_tier = %start_tier, error = %source, "every eligible model exhausted");
        Err(GatewayError::Exhausted { source })
    }

    /// Give one model its full retry budget
    ///
    /// The outer `Result` is for request-level aborts (cancellation);
    /// the inner one is the model's final verdict. Permanent errors end
    /// the budget early since retrying bad credentials cannot help.
    async fn attempt_model(
        &self,
        backend: &dyn ModelBackend,
        model_id: &str,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Result<TimedResponse, BackendError>, GatewayError> {
        let mut last_error: Option<BackendError> = None;

        for attempt in 0..self.max_retries_per_model {
            if attempt > 0 {
                let wait = self.backoff_base * attempt;
                tokio::select! {
                    () = cancel.cancelled() => return Err(GatewayError::Cancelled),
                    () = tokio::time::sleep(wait) => {}
                }
            }

            let started = Instant::now();
            let result = tokio::select! {
                () = cancel.cancelled() => return Err(GatewayError::Cancelled),
                result = tokio::time::timeout(self.attempt_timeout, backend.generate(model_id, request)) => {
                    result.unwrap_or_else(|_| Err(BackendError::Timeout { model: model_id.to_owned() }))
                }
            };

            match result {
                Ok(response) => {
                    #[allow(clippy::cast_possible_truncation)]
                    let latency_ms = started.elapsed().as_millis() as u64;
                    return Ok(Ok(TimedResponse {
                        response,
                        latency_ms,
                    }));
                }
                Err(e) if e.is_permanent() => {
                    tracing::warn!(model = %model_id, attempt, error = %e, "abandoning model");
                    return Ok(Err(e));
                }
                Err(e) => {
                    tracing::warn!(model = %model_id, attempt, error = %e, "attempt failed");
                    last_error = Some(e);
                }
            }
        }

        // max_retries_per_model >= 1 is enforced at config load
        Ok(Err(last_error.unwrap_or_else(|| BackendError::Malformed("retry budget was zero".to_owned()))))
    }

    /// Model ids of a tier, with the preferred model moved to the front
    fn tier_order<'a>(&'a self, tier: Tier, preferred_model: Option<&'a str>) -> Vec<&'a str> {
        let ordering = self.catalog.tier_models(tier);

        let Some(preferred) = preferred_model else {
            return ordering.iter().map(String::as_str).collect();
        };

        if !ordering.iter().any(|id| id == preferred) {
            return ordering.iter().map(String::as_str).collect();
        }

        let mut order = Vec::with_capacity(ordering.len());
        order.push(preferred);
        order.extend(ordering.iter().map(String::as_str).filter(|id| *id != preferred));
        order
    }
}

struct TimedResponse {
    response: crate::types::BackendResponse,
    latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use cortex_config::{CatalogConfig, ModelEntry, TierOrderingConfig};
    use cortex_core::ChatMessage;

    use super::*;
    use crate::types::BackendResponse;

    /// Backend that replays a fixed script of outcomes
    struct ScriptedBackend {
        provider: Provider,
        script: Mutex<VecDeque<Result<BackendResponse, BackendError>>>,
        calls: AtomicU32,
    }

    impl ScriptedBackend {
        fn new(provider: Provider, script: Vec<Result<BackendResponse, BackendError>>) -> Arc<Self> {
            Arc::new(Self {
                provider,
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn generate(&self, _: &str, _: &CompletionRequest) -> Result<BackendResponse, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Transport("script exhausted".to_owned())))
        }
    }

    /// Backend whose calls never complete
    struct StalledBackend(Provider);

    #[async_trait]
    impl ModelBackend for StalledBackend {
        fn provider(&self) -> Provider {
            self.0
        }

        async fn generate(&self, _: &str, _: &CompletionRequest) -> Result<BackendResponse, BackendError> {
            tokio::time::sleep(Duration::from_secs(86_400)).await;
            Err(BackendError::Transport("unreachable".to_owned()))
        }
    }

    fn entry(id: &str, provider: Provider, tier: Tier) -> ModelEntry {
        ModelEntry {
            id: id.to_owned(),
            provider,
            tier,
            input_cost_per_mtok: 1.0,
            output_cost_per_mtok: 2.0,
            context_window: 128_000,
            avg_latency_ms: 500,
        }
    }

    fn catalog() -> Arc<ModelCatalog> {
        let config = CatalogConfig {
            models: vec![
                entry("cheap-a", Provider::Groq, Tier::Cheap),
                entry("cheap-b", Provider::Openai, Tier::Cheap),
                entry("mid-a", Provider::Openai, Tier::Mid),
                entry("prem-a", Provider::Anthropic, Tier::Premium),
            ],
            tiers: TierOrderingConfig {
                cheap: vec!["cheap-a".to_owned(), "cheap-b".to_owned()],
                mid: vec!["mid-a".to_owned()],
                premium: vec!["prem-a".to_owned()],
            },
            reference_model: "prem-a".to_owned(),
        };
        Arc::new(ModelCatalog::from_config(&config).unwrap())
    }

    fn config() -> FallbackConfig {
        FallbackConfig {
            max_retries_per_model: 2,
            backoff_base_ms: 1,
            attempt_timeout_secs: 5,
        }
    }

    fn ok_response(content: &str) -> Result<BackendResponse, BackendError> {
        Ok(BackendResponse {
            content: content.to_owned(),
            input_tokens: 10,
            output_tokens: 5,
            finish_reason: Some("stop".to_owned()),
        })
    }

    fn transport_err() -> Result<BackendResponse, BackendError> {
        Err(BackendError::Transport("connection reset".to_owned()))
    }

    fn auth_err(provider: Provider) -> Result<BackendResponse, BackendError> {
        Err(BackendError::Auth { provider })
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            max_tokens: None,
            temperature: None,
        }
    }

    fn engine_with(backends: Vec<Arc<ScriptedBackend>>) -> FallbackEngine {
        let map = backends
            .into_iter()
            .map(|b| (b.provider, b as Arc<dyn ModelBackend>))
            .collect();
        FallbackEngine::new(catalog(), map, &config())
    }

    #[tokio::test]
    async fn first_model_success_is_not_a_fallback() {
        let groq = ScriptedBackend::new(Provider::Groq, vec![ok_response("hello")]);
        let engine = engine_with(vec![Arc::clone(&groq)]);

        let outcome = engine
            .execute(Tier::Cheap, None, &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.model.id, "cheap-a");
        assert_eq!(outcome.tier, Tier::Cheap);
        assert!(!outcome.fallback_used);
        assert_eq!(groq.call_count(), 1);
    }

    #[tokio::test]
    async fn transient_failure_retries_same_model() {
        let groq = ScriptedBackend::new(Provider::Groq, vec![transport_err(), ok_response("second try")]);
        let engine = engine_with(vec![Arc::clone(&groq)]);

        let outcome = engine
            .execute(Tier::Cheap, None, &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.model.id, "cheap-a");
        assert!(!outcome.fallback_used);
        assert_eq!(groq.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_tier_escalates_and_marks_fallback() {
        // Both cheap models burn their full retry budgets
        let groq = ScriptedBackend::new(Provider::Groq, vec![transport_err(), transport_err()]);
        let openai = ScriptedBackend::new(
            Provider::Openai,
            vec![transport_err(), transport_err(), ok_response("mid saves the day")],
        );
        let engine = engine_with(vec![Arc::clone(&groq), Arc::clone(&openai)]);

        let outcome = engine
            .execute(Tier::Cheap, None, &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.model.id, "mid-a");
        assert_eq!(outcome.tier, Tier::Mid);
        assert!(outcome.fallback_used);
        assert_eq!(groq.call_count(), 2);
        assert_eq!(openai.call_count(), 3);
    }

    #[tokio::test]
    async fn auth_failure_abandons_model_without_retry() {
        let groq = ScriptedBackend::new(Provider::Groq, vec![auth_err(Provider::Groq)]);
        let openai = ScriptedBackend::new(Provider::Openai, vec![ok_response("next model")]);
        let engine = engine_with(vec![Arc::clone(&groq), Arc::clone(&openai)]);

        let outcome = engine
            .execute(Tier::Cheap, None, &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.model.id, "cheap-b");
        assert!(!outcome.fallback_used, "same tier is not a fallback");
        assert_eq!(groq.call_count(), 1, "auth error must not be retried");
    }

    #[tokio::test]
    async fn unconfigured_provider_is_skipped_silently() {
        // No Groq backend at all; cheap-a never receives an attempt
        let openai = ScriptedBackend::new(Provider::Openai, vec![ok_response("configured one")]);
        let engine = engine_with(vec![Arc::clone(&openai)]);

        let outcome = engine
            .execute(Tier::Cheap, None, &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.model.id, "cheap-b");
        assert_eq!(openai.call_count(), 1);
    }

    #[tokio::test]
    async fn total_exhaustion_surfaces_last_error() {
        let groq = ScriptedBackend::new(Provider::Groq, vec![]);
        let openai = ScriptedBackend::new(Provider::Openai, vec![]);
        let anthropic = ScriptedBackend::new(Provider::Anthropic, vec![]);
        let engine = engine_with(vec![groq, openai, Arc::clone(&anthropic)]);

        let err = engine
            .execute(Tier::Cheap, None, &request(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Exhausted {
                source: BackendError::Transport(_)
            }
        ));
        assert_eq!(anthropic.call_count(), 2, "premium got its full budget");
    }

    #[tokio::test]
    async fn premium_start_never_descends() {
        let anthropic = ScriptedBackend::new(Provider::Anthropic, vec![]);
        let groq = ScriptedBackend::new(Provider::Groq, vec![ok_response("should not be called")]);
        let engine = engine_with(vec![Arc::clone(&anthropic), Arc::clone(&groq)]);

        let err = engine
            .execute(Tier::Premium, None, &request(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Exhausted { .. }));
        assert_eq!(groq.call_count(), 0, "cheap tier must not serve a premium request");
        // Three clamped passes over premium, full retry budget each
        assert_eq!(anthropic.call_count(), 6);
    }

    #[tokio::test]
    async fn mid_start_repeats_premium_on_the_clamped_pass() {
        let openai = ScriptedBackend::new(Provider::Openai, vec![]);
        let anthropic = ScriptedBackend::new(
            Provider::Anthropic,
            vec![transport_err(), transport_err(), transport_err(), ok_response("fourth attempt")],
        );
        let engine = engine_with(vec![Arc::clone(&openai), Arc::clone(&anthropic)]);

        let outcome = engine
            .execute(Tier::Mid, None, &request(), &CancellationToken::new())
            .await
            .unwrap();

        // mid-a exhausts its budget, premium fails its first pass, and
        // the clamped third step revisits premium and succeeds
        assert_eq!(outcome.model.id, "prem-a");
        assert!(outcome.fallback_used);
        assert_eq!(openai.call_count(), 2);
        assert_eq!(anthropic.call_count(), 4);
    }

    #[tokio::test]
    async fn preferred_model_jumps_the_queue() {
        let groq = ScriptedBackend::new(Provider::Groq, vec![ok_response("first in line")]);
        let openai = ScriptedBackend::new(Provider::Openai, vec![ok_response("pinned")]);
        let engine = engine_with(vec![Arc::clone(&groq), Arc::clone(&openai)]);

        let outcome = engine
            .execute(Tier::Cheap, Some("cheap-b"), &request(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.model.id, "cheap-b");
        assert_eq!(groq.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_attempt_times_out() {
        let stalled: Arc<dyn ModelBackend> = Arc::new(StalledBackend(Provider::Anthropic));
        let engine = FallbackEngine::new(catalog(), [(Provider::Anthropic, stalled)].into(), &config());

        let err = engine
            .execute(Tier::Premium, None, &request(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::Exhausted {
                source: BackendError::Timeout { .. }
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_aborts_in_flight_attempt() {
        let stalled: Arc<dyn ModelBackend> = Arc::new(StalledBackend(Provider::Anthropic));
        let engine = FallbackEngine::new(catalog(), [(Provider::Anthropic, stalled)].into(), &config());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = engine.execute(Tier::Premium, None, &request(), &cancel).await.unwrap_err();
        assert!(matches!(err, GatewayError::Cancelled));
    }
}
