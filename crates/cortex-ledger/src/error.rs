use thiserror::Error;

/// Errors from the spend store
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The store could not be reached or answered abnormally
    #[error("spend store unavailable: {0}")]
    Unavailable(String),
}
