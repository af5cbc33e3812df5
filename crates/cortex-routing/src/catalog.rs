//! Immutable model catalog with tier orderings
//!
//! Built once from configuration at process start and shared by
//! reference; never mutated at runtime.

use cortex_config::{CatalogConfig, ModelEntry, Provider, Tier};
use indexmap::IndexMap;

use crate::error::RoutingError;

/// Pricing and capability metadata for one model
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model identifier as sent to the provider
    pub id: String,
    /// Provider that serves this model
    pub provider: Provider,
    /// Capability tier
    pub tier: Tier,
    /// USD per million input tokens
    pub input_cost_per_mtok: f64,
    /// USD per million output tokens
    pub output_cost_per_mtok: f64,
    /// Context window in tokens
    pub context_window: u32,
    /// Typical end-to-end latency in milliseconds
    pub avg_latency_ms: u64,
}

impl ModelInfo {
    /// Cost in USD for the given token counts at this model's prices
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        let input = f64::from(input_tokens) / 1_000_000.0 * self.input_cost_per_mtok;
        let output = f64::from(output_tokens) / 1_000_000.0 * self.output_cost_per_mtok;
        input + output
    }

    /// Combined per-million price, used to rank models by expense
    fn price_per_mtok(&self) -> f64 {
        self.input_cost_per_mtok + self.output_cost_per_mtok
    }
}

impl From<&ModelEntry> for ModelInfo {
    fn from(entry: &ModelEntry) -> Self {
        Self {
            id: entry.id.clone(),
            provider: entry.provider,
            tier: entry.tier,
            input_cost_per_mtok: entry.input_cost_per_mtok,
            output_cost_per_mtok: entry.output_cost_per_mtok,
            context_window: entry.context_window,
            avg_latency_ms: entry.avg_latency_ms,
        }
    }
}

/// Registry of known models plus the curated per-tier preference order
#[derive(Debug)]
pub struct ModelCatalog {
    models: IndexMap<String, ModelInfo>,
    tiers: [Vec<String>; 3],
    most_expensive: [ModelInfo; 3],
    reference: ModelInfo,
}

impl ModelCatalog {
    /// Build a catalog from configuration
    ///
    /// Validates that tier orderings are non-empty and reference only
    /// known models, and that the reference model exists. The same
    /// checks run at config load; repeating them here keeps the catalog
    /// safe for embedded construction.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, RoutingError> {
        let mut models: IndexMap<String, ModelInfo> = IndexMap::new();
        for entry in &config.models {
            if models.insert(entry.id.clone(), ModelInfo::from(entry)).is_some() {
                return Err(RoutingError::DuplicateModel { model: entry.id.clone() });
            }
        }

        let tiers = [
            config.tiers.cheap.clone(),
            config.tiers.mid.clone(),
            config.tiers.premium.clone(),
        ];

        let mut most_expensive = Vec::with_capacity(3);
        for (tier, ordering) in Tier::ALL.into_iter().zip(&tiers) {
            if ordering.is_empty() {
                return Err(RoutingError::EmptyTier { tier });
            }

            let mut priciest: Option<&ModelInfo> = None;
            for id in ordering {
                let info = models
                    .get(id)
                    .ok_or_else(|| RoutingError::UnknownModel { model: id.clone() })?;
                if priciest.is_none_or(|p| info.price_per_mtok() > p.price_per_mtok()) {
                    priciest = Some(info);
                }
            }
            // Non-empty ordering guarantees a priciest entry
            if let Some(info) = priciest {
                most_expensive.push(info.clone());
            }
        }

        let most_expensive: [ModelInfo; 3] = most_expensive
            .try_into()
            .map_err(|_| RoutingError::EmptyTier { tier: Tier::Cheap })?;

        let reference = models
            .get(&config.reference_model)
            .cloned()
            .ok_or_else(|| RoutingError::UnknownModel {
                model: config.reference_model.clone(),
            })?;

        Ok(Self {
            models,
            tiers,
            most_expensive,
            reference,
        })
    }

    /// Look up a model by id
    pub fn get(&self, id: &str) -> Option<&ModelInfo> {
        self.models.get(id)
    }

    /// Whether the catalog knows this model id
    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    /// All models in catalog order
    pub fn models(&self) -> impl Iterator<Item = &ModelInfo> {
        self.models.values()
    }

    /// Model ids of a tier in preference order
    pub fn tier_models(&self, tier: Tier) -> &[String] {
        &self.tiers[tier_index(tier)]
    }

    /// Most expensive model of a tier, used for conservative cost
    /// estimates before the fallback engine picks the real one
    pub fn most_expensive_in(&self, tier: Tier) -> &ModelInfo {
        &self.most_expensive[tier_index(tier)]
    }

    /// Baseline premium model for hypothetical-cost computation
    pub const fn reference_model(&self) -> &ModelInfo {
        &self.reference
    }
}

const fn tier_index(tier: Tier) -> usize {
    match tier {
        Tier::Cheap => 0,
        Tier::Mid => 1,
        Tier::Premium => 2,
    }
}

#[cfg(test)]
mod tests {
    use cortex_config::{CatalogConfig, TierOrderingConfig};

    use super::*;

    fn default_catalog() -> ModelCatalog {
        ModelCatalog::from_config(&CatalogConfig::default()).unwrap()
    }

    #[test]
    fn default_catalog_builds() {
        let catalog = default_catalog();
        assert!(catalog.contains("gpt-4o"));
        assert_eq!(catalog.reference_model().id, "gpt-4o");
    }

    #[test]
    fn tier_models_preserve_curated_order() {
        let catalog = default_catalog();
        assert_eq!(catalog.tier_models(Tier::Cheap)[0], "llama-3.1-8b-instant");
        assert_eq!(catalog.tier_models(Tier::Mid)[0], "gpt-4o-mini");
        assert_eq!(catalog.tier_models(Tier::Premium)[0], "gpt-4o");
    }

    #[test]
    fn most_expensive_per_tier() {
        let catalog = default_catalog();
        // cheap: gpt-3.5-turbo at 0.50 + 1.50
        assert_eq!(catalog.most_expensive_in(Tier::Cheap).id, "gpt-3.5-turbo");
        // mid: mistral-large-latest at 2.00 + 6.00
        assert_eq!(catalog.most_expensive_in(Tier::Mid).id, "mistral-large-latest");
        // premium: gpt-4o at 5.00 + 15.00
        assert_eq!(catalog.most_expensive_in(Tier::Premium).id, "gpt-4o");
    }

    #[test]
    fn rejects_ordering_with_unknown_model() {
        let config = CatalogConfig {
            tiers: TierOrderingConfig {
                cheap: vec!["nope".to_owned()],
                ..TierOrderingConfig::default()
            },
            ..CatalogConfig::default()
        };
        let err = ModelCatalog::from_config(&config).unwrap_err();
        assert!(matches!(err, RoutingError::UnknownModel { .. }));
    }

    #[test]
    fn rejects_empty_tier() {
        let config = CatalogConfig {
            tiers: TierOrderingConfig {
                mid: Vec::new(),
                ..TierOrderingConfig::default()
            },
            ..CatalogConfig::default()
        };
        let err = ModelCatalog::from_config(&config).unwrap_err();
        assert!(matches!(err, RoutingError::EmptyTier { tier: Tier::Mid }));
    }

    #[test]
    fn rejects_unknown_reference_model() {
        let config = CatalogConfig {
            reference_model: "missing".to_owned(),
            ..CatalogConfig::default()
        };
        assert!(ModelCatalog::from_config(&config).is_err());
    }

    #[test]
    fn model_cost_arithmetic() {
        let catalog = default_catalog();
        let model = catalog.get("gpt-4o-mini").unwrap();
        // 1M input at 0.15 + 0.5M output at 0.60 = 0.15 + 0.30
        let cost = model.cost(1_000_000, 500_000);
        assert!((cost - 0.45).abs() < 1e-9);
    }
}
