//! Axum route handlers for the OpenAI-compatible surface

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use cortex_core::{CallerProfile, HttpError};
use cortex_llm::{CompletionRequest, GatewayError, Orchestrator};
use tokio_util::sync::CancellationToken;

use crate::wire::{ChatCompletionRequest, ChatCompletionResponse, ModelList, ModelListing};

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Cancels in-flight backend attempts on shutdown
    pub cancel: CancellationToken,
}

/// Build the API router
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/completions", routing::post(chat_completions))
        .route("/v1/models", routing::get(list_models))
        .route("/health", routing::get(health))
        .fallback(not_found)
        .with_state(state)
}

/// Handle `POST /v1/chat/completions`
async fn chat_completions(
    State(state): State<AppState>,
    axum::Extension(caller): axum::Extension<CallerProfile>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Response {
    // Body parse failures share the JSON error shape of every other
    // failure on this surface
    let Json(wire_request) = match payload {
        Ok(json) => json,
        Err(rejection) => return error_response(&GatewayError::InvalidRequest(rejection.body_text())),
    };

    if wire_request.stream == Some(true) {
        return error_response(&GatewayError::InvalidRequest("streaming is not supported".to_owned()));
    }

    if let Some(temperature) = wire_request.temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return error_response(&GatewayError::InvalidRequest(format!(
            "temperature must be between 0 and 2, got {temperature}"
        )));
    }

    let request = CompletionRequest {
        messages: wire_request.messages,
        max_tokens: wire_request.max_tokens,
        temperature: wire_request.temperature,
    };

    match state
        .orchestrator
        .route(&caller, Some(&wire_request.model), request, &state.cancel)
        .await
    {
        Ok(routed) => Json(ChatCompletionResponse::from_routed(routed, unix_now())).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Handle `GET /v1/models`
async fn list_models(State(state): State<AppState>) -> Response {
    let created = unix_now();
    let data: Vec<ModelListing> = state
        .orchestrator
        .catalog()
        .models()
        .map(|model| ModelListing {
            id: model.id.clone(),
            object: "model".to_owned(),
            created,
            owned_by: model.provider.to_string(),
            tier: model.tier.to_string(),
        })
        .collect();

    Json(ModelList {
        object: "list".to_owned(),
        data,
    })
    .into_response()
}

/// Handle `GET /health`
async fn health() -> impl IntoResponse {
    (http::StatusCode::OK, "ok")
}

async fn not_found() -> Response {
    let body = serde_json::json!({
        "error": {
            "message": "unknown route",
            "type": "not_found_error",
        }
    });
    (http::StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Convert a gateway error to an OpenAI-style JSON error response
fn error_response(error: &GatewayError) -> Response {
    let status = error.status_code();
    let body = serde_json::json!({
        "error": {
            "message": error.client_message(),
            "type": error.error_type(),
            "code": serde_json::Value::Null,
        }
    });

    (status, Json(body)).into_response()
}
