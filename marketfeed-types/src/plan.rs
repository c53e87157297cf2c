//! The execution plan the engine builds before calling any adapter.

use serde::{Deserialize, Serialize};

/// A hint naming which merge algorithm applies to a data type, carried on an
/// [`ArbitrationPlan`] when more than one candidate adapter exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Confidence-weighted mean, used for price and sentiment.
    WeightedAverage,
    /// Concatenate candle series, used for ohlcv.
    AggregateCandles,
    /// Sort by timestamp descending, adopt first non-null value per key.
    TakeMostRecent,
    /// De-duplicate by canonical URL, preserve first-occurrence order.
    DeduplicateAndMerge,
}

/// The primary/fallback/merge plan `arbitrate_request` produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationPlan {
    /// Name of the top-ranked adapter.
    pub primary: String,
    /// Up to two next-ranked adapters, tried in order if `primary` fails.
    pub fallbacks: Vec<String>,
    /// Present only if two or more candidates were ranked.
    pub merge_strategy: Option<MergeStrategy>,
    /// `primary`'s reported p95 latency, truncated to whole milliseconds.
    pub estimated_latency_ms: u64,
    /// Per-attempt timeout derived from `primary`'s configuration.
    pub timeout_ms: u64,
}

impl ArbitrationPlan {
    /// The full fallback chain: `[primary] ++ fallbacks`, in the order
    /// `execute_with_fallback` tries them.
    #[must_use]
    pub fn chain(&self) -> Vec<&str> {
        std::iter::once(self.primary.as_str())
            .chain(self.fallbacks.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_prepends_primary() {
        let plan = ArbitrationPlan {
            primary: "a".into(),
            fallbacks: vec!["b".into(), "c".into()],
            merge_strategy: None,
            estimated_latency_ms: 100,
            timeout_ms: 5000,
        };
        assert_eq!(plan.chain(), vec!["a", "b", "c"]);
    }
}
