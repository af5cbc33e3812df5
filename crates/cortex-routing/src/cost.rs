//! Actual and hypothetical cost computation
//!
//! Savings are defined against one fixed reference model: what the
//! request would have cost had the baseline premium model served it.

use serde::Serialize;

use crate::catalog::ModelInfo;

/// Cost outcome for one completed request, all USD
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CostResult {
    /// Cost at the prices of the model actually used
    pub cost_actual: f64,
    /// Cost had the reference model served the request
    pub cost_hypothetical: f64,
    /// `max(0, hypothetical - actual)`; never negative
    pub savings_delta: f64,
    /// Whole-percent savings relative to the hypothetical cost
    pub savings_percent: u32,
}

/// Compute actual cost, hypothetical cost, and savings
///
/// Monetary values are rounded to 6 decimal places so drift does not
/// accumulate in downstream summaries. When the reference model itself
/// served the request the savings are exactly zero.
pub fn compute_costs(used: &ModelInfo, reference: &ModelInfo, input_tokens: u32, output_tokens: u32) -> CostResult {
    let cost_actual = used.cost(input_tokens, output_tokens);
    let cost_hypothetical = reference.cost(input_tokens, output_tokens);
    let savings_delta = (cost_hypothetical - cost_actual).max(0.0);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let savings_percent = if cost_hypothetical > 0.0 {
        (savings_delta / cost_hypothetical * 100.0).round() as u32
    } else {
        0
    };

    CostResult {
        cost_actual: round6(cost_actual),
        cost_hypothetical: round6(cost_hypothetical),
        savings_delta: round6(savings_delta),
        savings_percent,
    }
}

/// Round to 6 decimal places
fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use cortex_config::CatalogConfig;

    use super::*;
    use crate::catalog::ModelCatalog;

    fn catalog() -> ModelCatalog {
        ModelCatalog::from_config(&CatalogConfig::default()).unwrap()
    }

    #[test]
    fn savings_never_negative() {
        let catalog = catalog();
        let reference = catalog.reference_model();
        for model in catalog.models() {
            let result = compute_costs(model, reference, 10_000, 2_000);
            assert!(result.savings_delta >= 0.0, "negative savings for {}", model.id);
        }
    }

    #[test]
    fn reference_model_yields_zero_savings() {
        let catalog = catalog();
        let reference = catalog.reference_model();
        let result = compute_costs(reference, reference, 50_000, 10_000);
        assert!((result.savings_delta - 0.0).abs() < f64::EPSILON);
        assert_eq!(result.savings_percent, 0);
    }

    #[test]
    fn cheap_model_saves_against_reference() {
        let catalog = catalog();
        let used = catalog.get("llama-3.1-8b-instant").unwrap();
        let result = compute_costs(used, catalog.reference_model(), 1_000_000, 100_000);
        // actual: 0.05 + 0.008 = 0.058; hypothetical: 5.0 + 1.5 = 6.5
        assert!((result.cost_actual - 0.058).abs() < 1e-9);
        assert!((result.cost_hypothetical - 6.5).abs() < 1e-9);
        assert!((result.savings_delta - 6.442).abs() < 1e-9);
        assert_eq!(result.savings_percent, 99);
    }

    #[test]
    fn zero_tokens_cost_nothing() {
        let catalog = catalog();
        let result = compute_costs(catalog.get("gpt-4o").unwrap(), catalog.reference_model(), 0, 0);
        assert!((result.cost_actual - 0.0).abs() < f64::EPSILON);
        assert_eq!(result.savings_percent, 0);
    }

    #[test]
    fn values_rounded_to_six_decimals() {
        let catalog = catalog();
        let used = catalog.get("llama-3.1-8b-instant").unwrap();
        let result = compute_costs(used, catalog.reference_model(), 7, 3);
        let scaled = result.cost_actual * 1_000_000.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
    }
}
