use cortex_config::Tier;
use thiserror::Error;

/// Errors from catalog construction and lookup
#[derive(Debug, Error)]
pub enum RoutingError {
    /// A tier ordering or reference setting names a model the catalog lacks
    #[error("unknown model: {model}")]
    UnknownModel { model: String },

    /// The same model id appears twice in the catalog
    #[error("duplicate model id: {model}")]
    DuplicateModel { model: String },

    /// A tier has no models to route to
    #[error("tier '{tier}' has no models")]
    EmptyTier { tier: Tier },
}
