//! Bearer-token authentication against the configured user list

use std::collections::HashMap;

use axum::Json;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cortex_config::{API_KEY_PREFIX, UserConfig};
use cortex_core::CallerProfile;
use http::StatusCode;
use secrecy::ExposeSecret;

/// In-memory map from API key to caller profile
///
/// Built once from configuration; keys never change at runtime.
#[derive(Debug, Default)]
pub struct UserDirectory {
    by_key: HashMap<String, CallerProfile>,
}

impl UserDirectory {
    pub fn from_config(users: &[UserConfig]) -> Self {
        let by_key = users
            .iter()
            .map(|u| {
                (
                    u.api_key.expose_secret().to_owned(),
                    CallerProfile {
                        user_id: u.id.clone(),
                        routing_preference: u.routing_preference,
                        monthly_budget: u.monthly_budget,
                    },
                )
            })
            .collect();
        Self { by_key }
    }

    /// Caller behind an API key, if any
    pub fn resolve(&self, api_key: &str) -> Option<&CallerProfile> {
        self.by_key.get(api_key)
    }
}

/// Authenticate a request and attach its [`CallerProfile`]
///
/// The health endpoint stays public; everything else requires a
/// `Bearer crtx_...` token matching a configured user.
pub async fn auth_middleware(directory: std::sync::Arc<UserDirectory>, request: Request, next: Next) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return unauthorized("missing bearer token");
    };

    if !token.starts_with(API_KEY_PREFIX) {
        return unauthorized("invalid API key");
    }

    let Some(caller) = directory.resolve(token) else {
        tracing::warn!("API key not recognized");
        return unauthorized("invalid API key");
    };

    let mut request = request;
    request.extensions_mut().insert(caller.clone());
    next.run(request).await
}

fn unauthorized(message: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "message": message,
            "type": "authentication_error",
        }
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
