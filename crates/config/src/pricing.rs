use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thunderdome_core::UsageRecord;

/// Per-1K-token input/output prices for one model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

/// `{provider: {model: {input, output}}}`, prices per 1K tokens. Unknown
/// providers or models cost 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingTable(BTreeMap<String, BTreeMap<String, ModelPricing>>);

impl PricingTable {
    pub fn load(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Dollar cost of one usage record; 0.0 for an unpriced provider/model.
    #[must_use]
    pub fn cost_of(&self, usage: &UsageRecord) -> f64 {
        let Some(pricing) = self
            .0
            .get(&usage.provider)
            .and_then(|models| models.get(&usage.model))
        else {
            return 0.0;
        };

        (usage.input_tokens as f64 / 1000.0) * pricing.input
            + (usage.output_tokens as f64 / 1000.0) * pricing.output
    }

    /// Total dollar cost across every record.
    #[must_use]
    pub fn total_cost(&self, usage: &[UsageRecord]) -> f64 {
        usage.iter().map(|record| self.cost_of(record)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICING_YAML: &str = r#"
anthropic:
  claude-sonnet:
    input: 3.0
    output: 15.0
"#;

    #[test]
    fn known_model_is_priced_per_1k_tokens() {
        let table = PricingTable::load(PRICING_YAML).unwrap();
        let usage = UsageRecord {
            provider: "anthropic".into(),
            model: "claude-sonnet".into(),
            input_tokens: 2000,
            output_tokens: 1000,
        };
        // (2000/1000)*3.0 + (1000/1000)*15.0 = 6.0 + 15.0 = 21.0
        assert_eq!(table.cost_of(&usage), 21.0);
    }

    #[test]
    fn unknown_provider_or_model_costs_zero() {
        let table = PricingTable::load(PRICING_YAML).unwrap();
        let usage = UsageRecord {
            provider: "openai".into(),
            model: "gpt-4".into(),
            input_tokens: 500,
            output_tokens: 500,
        };
        assert_eq!(table.cost_of(&usage), 0.0);
    }
}
