#![allow(clippy::must_use_candidate)]

pub mod catalog;
mod env;
pub mod fallback;
mod loader;
pub mod log;
pub mod providers;
pub mod routing;
pub mod server;
pub mod users;

use serde::Deserialize;

pub use catalog::*;
pub use fallback::*;
pub use log::{LogConfig, LogFormat};
pub use providers::*;
pub use routing::*;
pub use server::*;
pub use users::*;

/// Top-level Cortex configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Model catalog and tier orderings
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Complexity scoring and tier selection
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Retry and escalation tuning
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Upstream provider credentials
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// API users keyed by bearer token
    #[serde(default)]
    pub users: Vec<UserConfig>,
    /// Log output configuration
    #[serde(default)]
    pub log: LogConfig,
}
