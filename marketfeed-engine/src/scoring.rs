//! Weighted quality scoring.

use chrono::Utc;
use marketfeed_core::ProviderAdapter;
use marketfeed_types::{Asset, DataType, ProviderScore};

/// Weight applied to the adapter named `"newsapi"` when scoring news or
/// sentiment requests (a domain-specific bonus).
const NEWSAPI_DOMAIN_BONUS: f64 = 1.20;
const NEWSAPI_NAME: &str = "newsapi";

/// Compute `adapter`'s quality score for a `data_type` request on `asset`.
///
/// Returns the all-zeros score without touching any reporting hook if the
/// adapter is currently in cooldown.
pub async fn score(
    adapter: &dyn ProviderAdapter,
    asset: &Asset,
    data_type: DataType,
    region: &str,
    max_staleness_seconds: f64,
) -> ProviderScore {
    if adapter.is_in_cooldown() {
        return ProviderScore::zero();
    }

    let last_update = adapter.get_last_update(asset, data_type).await;
    let age_seconds = (Utc::now() - last_update).num_milliseconds() as f64 / 1000.0;
    let freshness = (100.0 * (1.0 - age_seconds / max_staleness_seconds)).clamp(0.0, 100.0);

    let p95_ms = adapter.get_latency_p95(region).await;
    let latency = (100.0 * (1.0 - p95_ms / 5000.0)).clamp(0.0, 100.0);

    let uptime = (adapter.get_uptime_24h().await * 100.0).clamp(0.0, 100.0);
    let completeness = (adapter.get_completeness(data_type).await * 100.0).clamp(0.0, 100.0);
    let reliability = (adapter.get_success_rate().await * 100.0).clamp(0.0, 100.0);

    let mut total =
        0.30 * freshness + 0.25 * latency + 0.20 * uptime + 0.15 * completeness + 0.10 * reliability;

    if adapter.name() == NEWSAPI_NAME && matches!(data_type, DataType::News | DataType::Sentiment) {
        total *= NEWSAPI_DOMAIN_BONUS;
    }
    total = total.min(100.0);

    ProviderScore {
        total,
        freshness,
        latency,
        uptime,
        completeness,
        reliability,
    }
}

/// Sort `(name, score)` pairs by descending total, filter to those
/// `>= healthy_cutoff`, and if that leaves none, retain only the single
/// highest-scoring entry so the request is still attempted.
#[must_use]
pub fn rank_and_filter(
    mut scored: Vec<(String, ProviderScore)>,
    healthy_cutoff: f64,
) -> Vec<(String, ProviderScore)> {
    scored.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));

    let healthy: Vec<(String, ProviderScore)> = scored
        .iter()
        .filter(|(_, score)| score.total >= healthy_cutoff)
        .cloned()
        .collect();

    if !healthy.is_empty() {
        return healthy;
    }
    scored.into_iter().take(1).collect()
}
