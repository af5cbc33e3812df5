//! Model backends, fallback execution, and the routing orchestrator
//!
//! The execution half of the gateway: provider backends behind the
//! [`ModelBackend`] trait, the tier-escalating [`FallbackEngine`], and
//! the [`Orchestrator`] that ties scoring, budget, execution, and
//! bookkeeping into one request path.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod backend;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod types;

pub use backend::{ModelBackend, build_backends};
pub use error::{BackendError, GatewayError};
pub use fallback::FallbackEngine;
pub use orchestrator::{Orchestrator, RoutedCompletion, RoutingMetadata};
pub use types::{BackendResponse, CompletionOutcome, CompletionRequest};
