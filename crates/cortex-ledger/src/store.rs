use async_trait::async_trait;
use cortex_config::Tier;
use dashmap::DashMap;

use crate::error::LedgerError;

/// Current calendar period in `YYYY-MM` form
pub fn current_period() -> String {
    jiff::Zoned::now().strftime("%Y-%m").to_string()
}

/// Cumulative per-user, per-period totals
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthlySummary {
    /// USD actually spent
    pub total_spend: f64,
    /// USD the reference model would have cost
    pub total_hypothetical_spend: f64,
    /// USD saved against the reference model
    pub total_savings: f64,
    /// Requests served
    pub request_count: u64,
    /// Prompt tokens consumed
    pub total_input_tokens: u64,
    /// Completion tokens generated
    pub total_output_tokens: u64,
}

/// Outcome of one routed request, as written to the store
#[derive(Debug, Clone)]
pub struct UsageRecord {
    /// Owner of the request
    pub user_id: String,
    /// Calendar period (`YYYY-MM`) the spend belongs to
    pub period: String,
    /// Catalog id of the model that served the request
    pub model_used: String,
    /// Tier of that model
    pub tier: Tier,
    /// Backend-reported prompt tokens
    pub input_tokens: u32,
    /// Backend-reported completion tokens
    pub output_tokens: u32,
    /// USD cost at the used model's prices
    pub cost_actual: f64,
    /// USD cost at the reference model's prices
    pub cost_hypothetical: f64,
    /// USD saved
    pub savings_delta: f64,
    /// Difficulty score that drove the routing decision
    pub difficulty_score: f64,
    /// Whether tier escalation occurred
    pub fallback_used: bool,
    /// End-to-end request latency
    pub latency_ms: u64,
}

/// Persistence seam for per-user monthly spend
///
/// The gateway reads the current period's spend before a call and
/// writes the outcome after one. Consistency is read-then-write within
/// a process; nothing here locks across the backend call.
#[async_trait]
pub trait SpendStore: Send + Sync {
    /// Cumulative spend for a user in a period
    async fn current_spend(&self, user_id: &str, period: &str) -> Result<f64, LedgerError>;

    /// Fold one request outcome into the user's period summary
    async fn record(&self, record: &UsageRecord) -> Result<(), LedgerError>;

    /// Snapshot of a user's period summary, if any
    async fn summary(&self, user_id: &str, period: &str) -> Result<Option<MonthlySummary>, LedgerError>;
}

/// Process-local spend store
///
/// Keyed by `(user, period)`. Suitable for a single gateway instance;
/// multi-instance deployments plug a shared store into the same trait.
#[derive(Debug, Default)]
pub struct InMemorySpendStore {
    summaries: DashMap<(String, String), MonthlySummary>,
}

impl InMemorySpendStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpendStore for InMemorySpendStore {
    async fn current_spend(&self, user_id: &str, period: &str) -> Result<f64, LedgerError> {
        let key = (user_id.to_owned(), period.to_owned());
        Ok(self.summaries.get(&key).map_or(0.0, |s| s.total_spend))
    }

    async fn record(&self, record: &UsageRecord) -> Result<(), LedgerError> {
        let key = (record.user_id.clone(), record.period.clone());
        let mut entry = self.summaries.entry(key).or_default();

        entry.total_spend += record.cost_actual;
        entry.total_hypothetical_spend += record.cost_hypothetical;
        entry.total_savings += record.savings_delta;
        entry.request_count += 1;
        entry.total_input_tokens += u64::from(record.input_tokens);
        entry.total_output_tokens += u64::from(record.output_tokens);

        Ok(())
    }

    async fn summary(&self, user_id: &str, period: &str) -> Result<Option<MonthlySummary>, LedgerError> {
        let key = (user_id.to_owned(), period.to_owned());
        Ok(self.summaries.get(&key).map(|s| *s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, cost: f64) -> UsageRecord {
        UsageRecord {
            user_id: user.to_owned(),
            period: "2025-06".to_owned(),
            model_used: "gemini-1.5-flash".to_owned(),
            tier: Tier::Cheap,
            input_tokens: 120,
            output_tokens: 40,
            cost_actual: cost,
            cost_hypothetical: cost * 10.0,
            savings_delta: cost * 9.0,
            difficulty_score: 0.2,
            fallback_used: false,
            latency_ms: 640,
        }
    }

    #[test]
    fn period_format_is_year_month() {
        let period = current_period();
        assert_eq!(period.len(), 7);
        assert_eq!(&period[4..5], "-");
    }

    #[tokio::test]
    async fn unknown_user_has_zero_spend() {
        let store = InMemorySpendStore::new();
        assert!((store.current_spend("nobody", "2025-06").await.unwrap() - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn records_accumulate() {
        let store = InMemorySpendStore::new();
        store.record(&record("u1", 0.01)).await.unwrap();
        store.record(&record("u1", 0.02)).await.unwrap();

        let spend = store.current_spend("u1", "2025-06").await.unwrap();
        assert!((spend - 0.03).abs() < 1e-9);

        let summary = store.summary("u1", "2025-06").await.unwrap().unwrap();
        assert_eq!(summary.request_count, 2);
        assert_eq!(summary.total_input_tokens, 240);
        assert_eq!(summary.total_output_tokens, 80);
    }

    #[tokio::test]
    async fn periods_are_isolated() {
        let store = InMemorySpendStore::new();
        store.record(&record("u1", 0.05)).await.unwrap();
        assert!((store.current_spend("u1", "2025-07").await.unwrap() - 0.0).abs() < f64::EPSILON);
    }
}
