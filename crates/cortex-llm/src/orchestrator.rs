//! Request routing orchestrator
//!
//! One request flows: score the conversation, pick a tier under the
//! caller's preference, admit against the monthly budget, execute with
//! fallback, then price the outcome and record it in the background.

use std::collections::HashMap;
use std::sync::Arc;

use cortex_config::{FallbackConfig, Provider, RoutingConfig, RoutingPreference, ThresholdsConfig, Tier};
use cortex_core::CallerProfile;
use cortex_ledger::{BudgetDecision, OutcomeRecorder, SpendStore, UsageRecord, check_budget, current_period};
use cortex_routing::{ComplexityScorer, ModelCatalog, ScoringFactors, compute_costs, select_tier};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::backend::ModelBackend;
use crate::error::GatewayError;
use crate::fallback::FallbackEngine;
use crate::types::{CompletionOutcome, CompletionRequest};

/// Routing decision and cost summary attached to every response
#[derive(Debug, Clone, Serialize)]
pub struct RoutingMetadata {
    /// Difficulty score in [0, 1]
    pub difficulty_score: f64,
    /// Factor breakdown behind the score
    pub factors: ScoringFactors,
    /// Tier of the model that served the request
    pub model_tier: Tier,
    /// Preference the thresholds were drawn from
    pub routing_preference: RoutingPreference,
    /// USD cost at the serving model's prices
    pub cost_actual_usd: f64,
    /// USD cost had the reference model served it
    pub cost_hypothetical_usd: f64,
    /// USD saved against the reference model
    pub savings_usd: f64,
    /// Whole-percent savings
    pub savings_percent: u32,
    /// Whether tier escalation occurred
    pub fallback_used: bool,
    /// Wall time of the successful attempt
    pub latency_ms: u64,
}

/// A served completion together with its routing metadata
#[derive(Debug, Clone)]
pub struct RoutedCompletion {
    pub outcome: CompletionOutcome,
    pub metadata: RoutingMetadata,
}

/// The gateway's routing core, shared across requests
pub struct Orchestrator {
    catalog: Arc<ModelCatalog>,
    scorer: ComplexityScorer,
    thresholds: ThresholdsConfig,
    estimated_output_tokens: u32,
    engine: FallbackEngine,
    store: Arc<dyn SpendStore>,
    recorder: OutcomeRecorder,
}

impl Orchestrator {
    /// Assemble the orchestrator
    ///
    /// Spawns the background usage recorder, so this must run inside a
    /// tokio runtime.
    pub fn new(
        catalog: Arc<ModelCatalog>,
        routing: &RoutingConfig,
        fallback: &FallbackConfig,
        backends: HashMap<Provider, Arc<dyn ModelBackend>>,
        store: Arc<dyn SpendStore>,
    ) -> Self {
        Self {
            scorer: ComplexityScorer::from_config(&routing.scorer),
            thresholds: routing.thresholds.clone(),
            estimated_output_tokens: routing.estimated_output_tokens,
            engine: FallbackEngine::new(Arc::clone(&catalog), backends, fallback),
            recorder: OutcomeRecorder::new(Arc::clone(&store)),
            catalog,
            store,
        }
    }

    /// Route one request end to end
    ///
    /// `requested_model` of `None` or `"auto"` means automatic routing;
    /// a known catalog id pins that model (its tier becomes the start
    /// tier); an unknown id falls back to automatic routing.
    pub async fn route(
        &self,
        caller: &CallerProfile,
        requested_model: Option<&str>,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<RoutedCompletion, GatewayError> {
        if request.messages.is_empty() {
            return Err(GatewayError::InvalidRequest("messages must not be empty".to_owned()));
        }

        let score = self.scorer.score(&request.messages);

        let (start_tier, preferred_model) = self.resolve_target(requested_model, score.score, caller.routing_preference);

        self.admit(caller, start_tier, score.estimated_tokens, request.max_tokens).await?;

        let outcome = self.engine.execute(start_tier, preferred_model, &request, cancel).await?;

        let costs = compute_costs(
            &outcome.model,
            self.catalog.reference_model(),
            outcome.input_tokens,
            outcome.output_tokens,
        );

        tracing::info!(
            user_id = %caller.user_id,
            difficulty = score.score,
            tier = %outcome.tier,
            model = %outcome.model.id,
            fallback = outcome.fallback_used,
            cost_usd = costs.cost_actual,
            savings_usd = costs.savings_delta,
            latency_ms = outcome.latency_ms,
            "request routed"
        );

        self.recorder.record(UsageRecord {
            user_id: caller.user_id.clone(),
            period: current_period(),
            model_used: outcome.model.id.clone(),
            tier: outcome.tier,
            input_tokens: outcome.input_tokens,
            output_tokens: outcome.output_tokens,
            cost_actual: costs.cost_actual,
            cost_hypothetical: costs.cost_hypothetical,
            savings_delta: costs.savings_delta,
            difficulty_score: score.score,
            fallback_used: outcome.fallback_used,
            latency_ms: outcome.latency_ms,
        });

        let metadata = RoutingMetadata {
            difficulty_score: score.score,
            factors: score.factors,
            model_tier: outcome.tier,
            routing_preference: caller.routing_preference,
            cost_actual_usd: costs.cost_actual,
            cost_hypothetical_usd: costs.cost_hypothetical,
            savings_usd: costs.savings_delta,
            savings_percent: costs.savings_percent,
            fallback_used: outcome.fallback_used,
            latency_ms: outcome.latency_ms,
        };

        Ok(RoutedCompletion { outcome, metadata })
    }

    /// The model catalog backing this orchestrator
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Pick the start tier and an optional pinned model
    fn resolve_target<'a>(
        &self,
        requested_model: Option<&'a str>,
        score: f64,
        preference: RoutingPreference,
    ) -> (Tier, Option<&'a str>) {
        if let Some(id) = requested_model
            && id != "auto"
        {
            if let Some(model) = self.catalog.get(id) {
                return (model.tier, Some(id));
            }
            tracing::warn!(model = %id, "requested model not in catalog, routing automatically");
        }

        (select_tier(score, preference, &self.thresholds), None)
    }

    /// Check the caller's budget against a conservative cost estimate
    ///
    /// The estimate prices the most expensive model of the start tier,
    /// since fallback within the tier may land on any of them.
    async fn admit(
        &self,
        caller: &CallerProfile,
        start_tier: Tier,
        estimated_input_tokens: u32,
        max_tokens: Option<u32>,
    ) -> Result<(), GatewayError> {
        let priciest = self.catalog.most_expensive_in(start_tier);
        let estimated_cost = priciest.cost(estimated_input_tokens, max_tokens.unwrap_or(self.estimated_output_tokens));

        let decision = check_budget(
            self.store.as_ref(),
            &caller.user_id,
            &current_period(),
            caller.monthly_budget,
            estimated_cost,
        )
        .await;

        match decision {
            BudgetDecision::Allowed | BudgetDecision::AllowedDueToReadFailure => Ok(()),
            BudgetDecision::Denied { reason } => {
                tracing::info!(user_id = %caller.user_id, %reason, "request denied by budget");
                Err(GatewayError::BudgetExceeded { reason })
            }
        }
    }
}
