use std::collections::HashSet;
use std::path::Path;

use secrecy::ExposeSecret;

use crate::users::API_KEY_PREFIX;
use crate::{Config, Tier};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog, thresholds, scorer weights,
    /// fallback tuning, or user entries are invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_catalog()?;
        self.validate_thresholds()?;
        self.validate_scorer()?;
        self.validate_fallback()?;
        self.validate_users()?;
        Ok(())
    }

    /// Every tier ordering must be non-empty and reference known models;
    /// the reference model must exist; model ids must be unique
    fn validate_catalog(&self) -> anyhow::Result<()> {
        let mut ids = HashSet::new();
        for model in &self.catalog.models {
            if !ids.insert(model.id.as_str()) {
                anyhow::bail!("duplicate model id in catalog: '{}'", model.id);
            }
            if model.input_cost_per_mtok < 0.0 || model.output_cost_per_mtok < 0.0 {
                anyhow::bail!("model '{}' has a negative price", model.id);
            }
        }

        for tier in Tier::ALL {
            let ordering = self.catalog.tiers.for_tier(tier);
            if ordering.is_empty() {
                anyhow::bail!("tier ordering for '{tier}' is empty");
            }
            for id in ordering {
                if !ids.contains(id.as_str()) {
                    anyhow::bail!("tier ordering for '{tier}' references unknown model '{id}'");
                }
            }
        }

        if !ids.contains(self.catalog.reference_model.as_str()) {
            anyhow::bail!(
                "reference model '{}' is not in the catalog",
                self.catalog.reference_model
            );
        }

        Ok(())
    }

    /// Each table must be strictly ordered, and bounds must tighten
    /// monotonically from cost to quality
    fn validate_thresholds(&self) -> anyhow::Result<()> {
        let t = &self.routing.thresholds;

        for (name, table) in [("cost", t.cost), ("balanced", t.balanced), ("quality", t.quality)] {
            if table.cheap >= table.mid {
                anyhow::bail!("thresholds for '{name}' must satisfy cheap < mid");
            }
        }

        if t.quality.cheap > t.balanced.cheap || t.balanced.cheap > t.cost.cheap {
            anyhow::bail!("cheap thresholds must not loosen from cost to quality");
        }
        if t.quality.mid > t.balanced.mid || t.balanced.mid > t.cost.mid {
            anyhow::bail!("mid thresholds must not loosen from cost to quality");
        }

        Ok(())
    }

    /// Scorer weights must sum to 1 and normalizers must be positive
    fn validate_scorer(&self) -> anyhow::Result<()> {
        let s = &self.routing.scorer;

        let sum = s.length_weight + s.keyword_weight + s.context_weight;
        if (sum - 1.0).abs() > 1e-6 {
            anyhow::bail!("scorer weights must sum to 1.0, got {sum}");
        }
        if s.length_norm_tokens == 0 || s.context_norm_turns == 0 {
            anyhow::bail!("scorer normalizers must be positive");
        }

        Ok(())
    }

    fn validate_fallback(&self) -> anyhow::Result<()> {
        if self.fallback.max_retries_per_model == 0 {
            anyhow::bail!("fallback.max_retries_per_model must be at least 1");
        }
        Ok(())
    }

    /// API keys must be unique, non-empty, and carry the `crtx_` prefix
    fn validate_users(&self) -> anyhow::Result<()> {
        let mut keys = HashSet::new();
        for user in &self.users {
            let key = user.api_key.expose_secret();
            if !key.starts_with(API_KEY_PREFIX) {
                anyhow::bail!("api key for user '{}' must start with '{API_KEY_PREFIX}'", user.id);
            }
            if !keys.insert(key.to_owned()) {
                anyhow::bail!("duplicate api key for user '{}'", user.id);
            }
            if let Some(budget) = user.monthly_budget
                && budget <= 0.0
            {
                anyhow::bail!("monthly budget for user '{}' must be positive", user.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_config_uses_defaults() {
        let file = write_config("");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.catalog.reference_model, "gpt-4o");
        assert_eq!(config.fallback.max_retries_per_model, 2);
        assert_eq!(config.routing.estimated_output_tokens, 500);
    }

    #[test]
    fn rejects_unknown_model_in_ordering() {
        let file = write_config(
            r#"
[catalog.tiers]
cheap = ["no-such-model"]
mid = ["gpt-4o-mini"]
premium = ["gpt-4o"]
"#,
        );
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("no-such-model"));
    }

    #[test]
    fn rejects_unknown_reference_model() {
        let file = write_config("[catalog]\nreference_model = \"missing\"\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("reference model"));
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let file = write_config("[routing.thresholds.balanced]\ncheap = 0.7\nmid = 0.3\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("cheap < mid"));
    }

    #[test]
    fn rejects_loosening_thresholds() {
        // quality more lenient than balanced is a misconfiguration
        let file = write_config("[routing.thresholds.quality]\ncheap = 0.6\nmid = 0.9\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn rejects_bad_scorer_weights() {
        let file = write_config("[routing.scorer]\nlength_weight = 0.9\nkeyword_weight = 0.9\ncontext_weight = 0.9\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn rejects_zero_retries() {
        let file = write_config("[fallback]\nmax_retries_per_model = 0\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn rejects_unprefixed_api_key() {
        let file = write_config("[[users]]\nid = \"u1\"\napi_key = \"plainkey\"\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("crtx_"));
    }

    #[test]
    fn accepts_full_config() {
        let file = write_config(
            r#"
[server]
listen_address = "127.0.0.1:9900"

[providers.openai]
api_key = "sk-test"

[[users]]
id = "u1"
api_key = "crtx_abc123"
routing_preference = "quality"
monthly_budget = 25.0
"#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.users.len(), 1);
        assert_eq!(
            config.users[0].routing_preference,
            crate::RoutingPreference::Quality
        );
    }
}
