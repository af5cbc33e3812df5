//! HTTP transport for the Cortex gateway
//!
//! Assembles the router from configuration: authentication, the
//! OpenAI-compatible completion surface, the model listing, and the
//! health endpoint.

mod auth;
mod handler;
mod wire;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use cortex_config::Config;
use cortex_ledger::InMemorySpendStore;
use cortex_llm::{Orchestrator, build_backends};
use cortex_routing::ModelCatalog;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub use auth::UserDirectory;
pub use handler::AppState;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    request_cancel: CancellationToken,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Must run inside a tokio runtime; the usage recorder spawns its
    /// background task here.
    ///
    /// # Errors
    ///
    /// Returns an error if the model catalog fails validation.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let catalog = Arc::new(ModelCatalog::from_config(&config.catalog)?);
        let backends = build_backends(&config.providers);
        if backends.is_empty() {
            tracing::warn!("no providers configured, every completion will fail");
        }

        let store = Arc::new(InMemorySpendStore::new());
        let orchestrator = Arc::new(Orchestrator::new(
            catalog,
            &config.routing,
            &config.fallback,
            backends,
            store,
        ));

        let directory = Arc::new(UserDirectory::from_config(&config.users));
        let request_cancel = CancellationToken::new();

        let state = AppState {
            orchestrator,
            cancel: request_cancel.clone(),
        };

        let router = handler::api_router(state)
            .layer(axum::middleware::from_fn(move |req, next| {
                let directory = Arc::clone(&directory);
                async move { auth::auth_middleware(directory, req, next).await }
            }))
            .layer(TraceLayer::new_for_http());

        Ok(Self {
            router,
            listen_address,
            request_cancel,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered, then cancels
    /// in-flight backend attempts and drains connections.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        let request_cancel = self.request_cancel;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
                request_cancel.cancel();
            })
            .await?;

        Ok(())
    }
}
