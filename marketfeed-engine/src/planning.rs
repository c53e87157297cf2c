//! Execution plan construction.

use marketfeed_core::ProviderRegistry;
use marketfeed_types::{ArbitrationPlan, Asset, DataType, EngineConfig, FedError, MergeStrategy};

use crate::scoring::{rank_and_filter, score};

/// The merge strategy tied to `data_type`.
#[must_use]
pub const fn merge_strategy_for(data_type: DataType) -> MergeStrategy {
    match data_type {
        DataType::Price | DataType::Sentiment => MergeStrategy::WeightedAverage,
        DataType::Ohlcv => MergeStrategy::AggregateCandles,
        DataType::News => MergeStrategy::DeduplicateAndMerge,
        DataType::Fundamentals
        | DataType::Technical
        | DataType::Macro
        | DataType::Correlation
        | DataType::Risk => MergeStrategy::TakeMostRecent,
    }
}

/// Score every adapter the registry considers eligible, rank and filter by
/// the healthy cutoff, then emit a primary/fallback/merge plan.
///
/// # Errors
/// Returns [`FedError::NoProviderAvailable`] if the registry has no eligible
/// adapter for `asset`/`data_type`.
pub async fn arbitrate_request(
    registry: &ProviderRegistry,
    asset: &Asset,
    data_type: DataType,
    region: &str,
    max_staleness_seconds: f64,
    config: &EngineConfig,
) -> Result<ArbitrationPlan, FedError> {
    let candidates = registry.get_providers_for_asset(asset, data_type)?;

    let mut scored = Vec::with_capacity(candidates.len());
    for adapter in &candidates {
        let s = score(
            adapter.as_ref(),
            asset,
            data_type,
            region,
            max_staleness_seconds,
        )
        .await;
        scored.push((adapter.name().to_string(), s));
    }

    let ranked = rank_and_filter(scored, config.healthy_score_cutoff);
    debug_assert!(!ranked.is_empty(), "rank_and_filter never returns empty on non-empty input");

    let primary_name = ranked[0].0.clone();
    let fallbacks: Vec<String> = ranked
        .iter()
        .skip(1)
        .take(config.max_fallbacks)
        .map(|(name, _)| name.clone())
        .collect();

    let merge_strategy = if ranked.len() >= 2 {
        Some(merge_strategy_for(data_type))
    } else {
        None
    };

    let primary_adapter = registry
        .provider(&primary_name)
        .ok_or_else(|| FedError::no_provider_available(&asset.symbol, data_type))?;
    let estimated_latency_ms = primary_adapter.get_latency_p95(region).await as u64;
    let timeout_ms = primary_adapter.config().timeout_seconds * 1000;

    Ok(ArbitrationPlan {
        primary: primary_name,
        fallbacks,
        merge_strategy,
        estimated_latency_ms,
        timeout_ms,
    })
}
