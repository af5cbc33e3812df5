//! Routing decision core for Cortex
//!
//! Pure, deterministic pieces of the gateway: the model catalog, the
//! heuristic complexity scorer, the score-to-tier selector, and the
//! cost/savings calculator. No I/O happens here.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod catalog;
pub mod cost;
pub mod error;
pub mod scorer;
pub mod tier;

pub use catalog::{ModelCatalog, ModelInfo};
pub use cost::{CostResult, compute_costs};
pub use error::RoutingError;
pub use scorer::{ComplexityScore, ComplexityScorer, ScoringFactors};
pub use tier::select_tier;
