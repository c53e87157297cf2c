//! Weighted quality score for an adapter against a particular request.

use serde::{Deserialize, Serialize};

/// A provider's computed quality score for one request.
///
/// Every field is non-negative and `<= 100`. If the adapter is in cooldown,
/// every field is exactly `0.0` (see `marketfeed-engine::scoring`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderScore {
    /// Weighted composite, `0.30*freshness + 0.25*latency + 0.20*uptime
    /// + 0.15*completeness + 0.10*reliability`, with a domain bonus applied
    /// and capped at 100.
    pub total: f64,
    /// How recent the adapter's last update for this asset/data_type is.
    pub freshness: f64,
    /// Inverse of p95 latency.
    pub latency: f64,
    /// 24h uptime fraction, scaled to a 0-100 score.
    pub uptime: f64,
    /// Data completeness for this data type, scaled to a 0-100 score.
    pub completeness: f64,
    /// Recent success rate, scaled to a 0-100 score.
    pub reliability: f64,
}

impl ProviderScore {
    /// The all-zeros score returned for an adapter currently in cooldown.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            total: 0.0,
            freshness: 0.0,
            latency: 0.0,
            uptime: 0.0,
            completeness: 0.0,
            reliability: 0.0,
        }
    }
}

impl Default for ProviderScore {
    fn default() -> Self {
        Self::zero()
    }
}
