//! Shared contracts between Cortex feature crates

pub mod context;
pub mod error;
pub mod message;

pub use context::CallerProfile;
pub use error::HttpError;
pub use message::{ChatMessage, Role};
