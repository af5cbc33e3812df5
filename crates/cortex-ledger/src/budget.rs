//! Budget guard: admit or reject a request against a monthly cap
//!
//! The fail-open path is a distinct variant, not a swallowed error, so
//! both callers and tests can tell a deliberate allow from a lucky one.

use crate::error::LedgerError;
use crate::store::SpendStore;

/// Outcome of a budget check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetDecision {
    /// Within budget (or no cap configured)
    Allowed,
    /// The spend read failed; allowed by the fail-open rule
    AllowedDueToReadFailure,
    /// The estimated cost would exceed the cap
    Denied {
        /// Human-readable explanation naming the cap and current spend
        reason: String,
    },
}

impl BudgetDecision {
    /// Whether the request may proceed
    pub const fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied { .. })
    }
}

/// Pure admission rule over a cap, the current spend, and an estimate
pub fn evaluate(cap: Option<f64>, current_spend: f64, estimated_cost: f64) -> BudgetDecision {
    let Some(cap) = cap else {
        return BudgetDecision::Allowed;
    };

    if current_spend + estimated_cost > cap {
        return BudgetDecision::Denied {
            reason: format!(
                "monthly budget of ${cap} would be exceeded; current spend is ${current_spend:.4}"
            ),
        };
    }

    BudgetDecision::Allowed
}

/// Check a request's estimated cost against a user's monthly cap
///
/// Reads the current period's cumulative spend from the store. A read
/// failure allows the request: blocking live traffic on a bookkeeping
/// hiccup is the worse failure mode.
pub async fn check_budget(
    store: &dyn SpendStore,
    user_id: &str,
    period: &str,
    cap: Option<f64>,
    estimated_cost: f64,
) -> BudgetDecision {
    if cap.is_none() {
        return BudgetDecision::Allowed;
    }

    let current_spend = match store.current_spend(user_id, period).await {
        Ok(spend) => spend,
        Err(LedgerError::Unavailable(detail)) => {
            tracing::warn!(
                user_id,
                period,
                error = %detail,
                "spend read failed, allowing request (fail-open)"
            );
            return BudgetDecision::AllowedDueToReadFailure;
        }
    };

    evaluate(cap, current_spend, estimated_cost)
}
