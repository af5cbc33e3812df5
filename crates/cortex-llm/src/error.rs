use cortex_config::Provider;
use cortex_core::HttpError;
use http::StatusCode;
use thiserror::Error;

/// Failure of a single backend attempt
#[derive(Debug, Error)]
pub enum BackendError {
    /// The provider rejected our credentials
    #[error("{provider} rejected the configured credentials")]
    Auth { provider: Provider },

    /// The provider has no credentials configured
    #[error("{provider} is not configured")]
    NotConfigured { provider: Provider },

    /// The provider throttled the request
    #[error("{provider} rate limited the request")]
    RateLimited { provider: Provider },

    /// The attempt exceeded its time budget
    #[error("attempt against {model} timed out")]
    Timeout { model: String },

    /// The provider returned a non-success status
    #[error("{provider} returned {status}: {message}")]
    Api {
        provider: Provider,
        status: StatusCode,
        message: String,
    },

    /// The request never reached the provider
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a body we could not use
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Whether retrying the same model could possibly help
    ///
    /// Credential problems are permanent for the process lifetime, so
    /// the fallback engine abandons the model immediately instead of
    /// burning its retry budget.
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::NotConfigured { .. })
    }
}

/// Request-level failure surfaced to API consumers
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request is structurally unusable
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The caller's monthly budget does not cover the estimated cost
    #[error("{reason}")]
    BudgetExceeded { reason: String },

    /// Every model in every eligible tier exhausted its retries
    #[error("all models exhausted: {source}")]
    Exhausted { source: BackendError },

    /// The client went away before a model answered
    #[error("request cancelled")]
    Cancelled,
}

impl HttpError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::BudgetExceeded { .. } => StatusCode::FORBIDDEN,
            Self::Exhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Cancelled => StatusCode::REQUEST_TIMEOUT,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::BudgetExceeded { .. } => "budget_exceeded_error",
            Self::Exhausted { .. } => "api_error",
            Self::Cancelled => "request_cancelled_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Provider error bodies may leak internals; keep it generic
            Self::Exhausted { .. } => "no model is currently able to serve the request".to_owned(),
            other => other.to_string(),
        }
    }
}
