//! Spend bookkeeping and budget enforcement
//!
//! The persistence seam of the gateway: a [`SpendStore`] trait the
//! routing path reads before a call and a background recorder writes
//! after one. Budget checks fail open on read errors — a storage
//! hiccup must not turn into a denial of service.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod budget;
pub mod error;
pub mod recorder;
pub mod store;

pub use budget::{BudgetDecision, check_budget};
pub use error::LedgerError;
pub use recorder::OutcomeRecorder;
pub use store::{InMemorySpendStore, MonthlySummary, SpendStore, UsageRecord, current_period};
