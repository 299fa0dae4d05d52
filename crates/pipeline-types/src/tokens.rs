//! Token usage and cost accounting types.
//!
//! The aggregation arithmetic itself ([`RunTokens::aggregate`]) lives here
//! rather than in `pipeline-llm` because `PipelineResult` embeds `RunTokens`
//! directly and the invariant that aggregates must equal the recomputation
//! from the stage list is a property of the data, not of any one backend.
//! `pipeline-llm`'s Token Accountant calls into this.

use serde::{Deserialize, Serialize};

use crate::stage_output::StageName;

/// Token and cost usage for a single chat-endpoint invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost: f64,
}

impl TokenUsage {
    /// Build a usage record, computing `total_tokens` so callers cannot
    /// construct an inconsistent one.
    #[must_use]
    pub fn new(input_tokens: u64, output_tokens: u64, estimated_cost: f64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            estimated_cost: round6(estimated_cost),
        }
    }

    /// The zero-filled record used when a provider omits usage data.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            estimated_cost: 0.0,
        }
    }
}

/// A (stage, usage) pair recorded for every stage invocation, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTokens {
    pub stage: StageName,
    pub usage: TokenUsage,
}

/// Efficiency metrics derived from a [`RunTokens`] aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyMetrics {
    pub average_tokens_per_stage: f64,
    pub max_stage_tokens: u64,
    pub input_output_ratio: f64,
    pub context_window_usage_percent: f64,
    pub cost_per_stage_avg: f64,
    pub total_stage_count: usize,
}

impl EfficiencyMetrics {
    /// The all-zero sentinel used when there are no stages to aggregate.
    /// Not an error: division-by-zero is avoided by returning zeros rather
    /// than panicking or propagating NaN.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            average_tokens_per_stage: 0.0,
            max_stage_tokens: 0,
            input_output_ratio: 0.0,
            context_window_usage_percent: 0.0,
            cost_per_stage_avg: 0.0,
            total_stage_count: 0,
        }
    }
}

/// The run-wide token/cost aggregate embedded in a [`crate::PipelineResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTokens {
    pub stages: Vec<StageTokens>,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub cost_by_stage: Vec<(StageName, f64)>,
    pub efficiency: EfficiencyMetrics,
}

impl RunTokens {
    /// Recompute the full aggregate from a stage-token list.
    ///
    /// An empty list produces all-zero aggregates and sentinel-zero
    /// efficiency metrics rather than an error.
    #[must_use]
    pub fn aggregate(stages: &[StageTokens], nominal_window: u64) -> Self {
        let total_input_tokens: u64 = stages.iter().map(|s| s.usage.input_tokens).sum();
        let total_output_tokens: u64 = stages.iter().map(|s| s.usage.output_tokens).sum();
        let total_tokens = total_input_tokens + total_output_tokens;
        let total_cost: f64 = round6(stages.iter().map(|s| s.usage.estimated_cost).sum());
        let cost_by_stage = stages.iter().map(|s| (s.stage, s.usage.estimated_cost)).collect();

        let stage_count = stages.len();
        let efficiency = if stage_count == 0 {
            EfficiencyMetrics::zero()
        } else {
            let max_stage_tokens = stages.iter().map(|s| s.usage.total_tokens).max().unwrap_or(0);
            let input_output_ratio = if total_output_tokens > 0 {
                total_input_tokens as f64 / total_output_tokens as f64
            } else {
                0.0
            };
            let context_window_usage_percent = if nominal_window > 0 {
                (max_stage_tokens as f64 / nominal_window as f64) * 100.0
            } else {
                0.0
            };
            EfficiencyMetrics {
                average_tokens_per_stage: total_tokens as f64 / stage_count as f64,
                max_stage_tokens,
                input_output_ratio,
                context_window_usage_percent,
                cost_per_stage_avg: total_cost / stage_count as f64,
                total_stage_count: stage_count,
            }
        };

        Self {
            stages: stages.to_vec(),
            total_input_tokens,
            total_output_tokens,
            total_tokens,
            total_cost,
            cost_by_stage,
            efficiency,
        }
    }

    /// A one-line human-readable summary for the Result's implementation
    /// notes, assembled during finalization.
    #[must_use]
    pub fn format_summary(&self) -> String {
        format!(
            "tokens: {} total ({} in / {} out) across {} stage(s), estimated cost ${:.6}",
            self.total_tokens,
            self.total_input_tokens,
            self.total_output_tokens,
            self.efficiency.total_stage_count,
            self.total_cost,
        )
    }
}

/// Round to six fractional digits of USD precision.
#[must_use]
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(input: u64, output: u64, cost: f64) -> TokenUsage {
        TokenUsage::new(input, output, cost)
    }

    #[test]
    fn empty_aggregation_is_all_zero() {
        let agg = RunTokens::aggregate(&[], 200_000);
        assert_eq!(agg.total_tokens, 0);
        assert_eq!(agg.total_cost, 0.0);
        assert_eq!(agg.efficiency, EfficiencyMetrics::zero());
    }

    #[test]
    fn cost_arithmetic_aggregates_per_million_token_pricing() {
        let stages = vec![
            StageTokens { stage: StageName::Pm, usage: usage(1000, 2000, (1000.0 / 1e6) * 0.15 + (2000.0 / 1e6) * 0.60) },
            StageTokens { stage: StageName::Dev, usage: usage(500, 1500, (500.0 / 1e6) * 0.15 + (1500.0 / 1e6) * 0.60) },
            StageTokens { stage: StageName::Qa, usage: usage(250, 500, (250.0 / 1e6) * 0.15 + (500.0 / 1e6) * 0.60) },
        ];
        let agg = RunTokens::aggregate(&stages, 200_000);
        assert_eq!(agg.total_input_tokens, 1750);
        assert_eq!(agg.total_output_tokens, 4000);
        assert_eq!(agg.total_cost, 0.002663);
    }

    #[test]
    fn efficiency_zero_when_output_is_zero() {
        let stages = vec![StageTokens { stage: StageName::Pm, usage: usage(100, 0, 0.0) }];
        let agg = RunTokens::aggregate(&stages, 200_000);
        assert_eq!(agg.efficiency.input_output_ratio, 0.0);
    }

    #[test]
    fn context_window_usage_percent_computed_from_max_stage() {
        let stages = vec![
            StageTokens { stage: StageName::Pm, usage: usage(1000, 1000, 0.0) },
            StageTokens { stage: StageName::Dev, usage: usage(50_000, 50_000, 0.0) },
        ];
        let agg = RunTokens::aggregate(&stages, 200_000);
        assert_eq!(agg.efficiency.max_stage_tokens, 100_000);
        assert_eq!(agg.efficiency.context_window_usage_percent, 50.0);
    }

    #[test]
    fn round6_rounds_to_six_fractional_digits() {
        assert_eq!(round6(0.0026629999), 0.002663);
    }
}
