//! The per-model pricing table.
//!
//! Pricing is treated as configuration, not code: [`PricingTable`] is a
//! plain data structure the caller can extend at startup;
//! [`PricingTable::default`] seeds it with a minimum set of illustrative
//! entries.

use std::collections::HashMap;

/// Input/output price in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrice {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// A model-identifier → price mapping, with prefix-match fallback.
///
/// An exact match on `model` is tried first; if none exists, the longest
/// registered key that is a prefix of `model` wins. A model absent from the
/// table entirely is a degradation (zero cost), not an error.
#[derive(Debug, Clone)]
pub struct PricingTable {
    entries: HashMap<String, ModelPrice>,
}

impl Default for PricingTable {
    fn default() -> Self {
        let mut entries = HashMap::new();
        entries.insert("anthropic/claude-3-5-sonnet".to_string(), ModelPrice { input_per_million: 3.00, output_per_million: 15.00 });
        entries.insert("anthropic/claude-3-opus".to_string(), ModelPrice { input_per_million: 15.00, output_per_million: 75.00 });
        entries.insert("anthropic/claude-3-haiku".to_string(), ModelPrice { input_per_million: 0.25, output_per_million: 1.25 });
        entries.insert("openai/gpt-4o".to_string(), ModelPrice { input_per_million: 2.50, output_per_million: 10.00 });
        entries.insert("openai/gpt-4o-mini".to_string(), ModelPrice { input_per_million: 0.15, output_per_million: 0.60 });
        entries.insert("openai/gpt-4-turbo".to_string(), ModelPrice { input_per_million: 10.00, output_per_million: 30.00 });
        entries.insert("openai/gpt-3.5-turbo".to_string(), ModelPrice { input_per_million: 0.50, output_per_million: 1.50 });
        Self { entries }
    }
}

impl PricingTable {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Register or override a model's price. Pure data, no validation.
    pub fn insert(&mut self, model: impl Into<String>, price: ModelPrice) {
        self.entries.insert(model.into(), price);
    }

    /// Look up a model's price, falling back to the longest matching prefix.
    #[must_use]
    pub fn lookup(&self, model: &str) -> Option<ModelPrice> {
        if let Some(price) = self.entries.get(model) {
            return Some(*price);
        }
        self.entries
            .iter()
            .filter(|(key, _)| model.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, price)| *price)
    }
}
