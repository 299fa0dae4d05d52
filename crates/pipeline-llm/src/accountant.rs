//! The Token Accountant.
//!
//! No operation here fails with an error: missing provider usage or an
//! unpriced model both degrade to zeros, annotated in the trace rather than
//! propagated as a fault.

use pipeline_types::{RunTokens, StageTokens, TokenUsage};

use crate::pricing::PricingTable;
use crate::types::ChatResponse;

/// Extracts token usage, computes cost, and aggregates per-run totals.
pub struct TokenAccountant {
    pricing: PricingTable,
    nominal_context_window: u64,
}

impl TokenAccountant {
    #[must_use]
    pub fn new(pricing: PricingTable, nominal_context_window: u64) -> Self {
        Self { pricing, nominal_context_window }
    }

    /// Extract token usage from a chat response, computing its cost.
    ///
    /// Degrades to a zero-filled [`TokenUsage`] when the provider omitted
    /// usage data; the model name is still recorded on the caller's
    /// [`pipeline_types::StageTokens`] wrapper so the degradation is
    /// traceable.
    #[must_use]
    pub fn extract(&self, response: &ChatResponse) -> TokenUsage {
        match response.usage {
            Some(usage) => {
                let cost = self.cost(usage.input_tokens, usage.output_tokens, &response.model);
                let computed = TokenUsage::new(usage.input_tokens, usage.output_tokens, cost);
                tracing::debug!(
                    model = %response.model,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    cost_usd = computed.estimated_cost,
                    "extracted token usage"
                );
                computed
            }
            None => {
                tracing::debug!(model = %response.model, "provider omitted usage data, degrading to zero");
                TokenUsage::zero()
            }
        }
    }

    /// Compute cost in USD, rounded to six fractional digits.
    ///
    /// A model absent from the pricing table returns `0.0` without error —
    /// a degradation, not a fault.
    #[must_use]
    pub fn cost(&self, input_tokens: u64, output_tokens: u64, model: &str) -> f64 {
        let Some(price) = self.pricing.lookup(model) else {
            tracing::debug!(model, "model absent from pricing table, cost degrades to 0.0");
            return 0.0;
        };
        let input_cost = (input_tokens as f64 / 1_000_000.0) * price.input_per_million;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * price.output_per_million;
        pipeline_types::tokens::round6(input_cost + output_cost)
    }

    /// Aggregate a run's stage-token list into [`RunTokens`].
    #[must_use]
    pub fn aggregate(&self, stages: &[StageTokens]) -> RunTokens {
        RunTokens::aggregate(stages, self.nominal_context_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderUsage;

    fn accountant() -> TokenAccountant {
        TokenAccountant::new(PricingTable::default(), 200_000)
    }

    #[test]
    fn extract_degrades_to_zero_when_usage_absent() {
        let response = ChatResponse { text: "hi".to_string(), usage: None, model: "openai/gpt-4o".to_string() };
        let usage = accountant().extract(&response);
        assert_eq!(usage, TokenUsage::zero());
    }

    #[test]
    fn extract_is_idempotent() {
        let response = ChatResponse {
            text: "hi".to_string(),
            usage: Some(ProviderUsage { input_tokens: 100, output_tokens: 50 }),
            model: "openai/gpt-4o-mini".to_string(),
        };
        let a = accountant().extract(&response);
        let b = accountant().extract(&response);
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_model_cost_is_zero() {
        let cost = accountant().cost(1000, 1000, "some/unknown-model");
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn cost_rounds_to_six_digits() {
        let cost = accountant().cost(1, 1, "openai/gpt-4o-mini");
        assert_eq!(cost, cost * 1_000_000.0_f64.round() / 1_000_000.0);
    }
}
