//! Static configuration records.
//!
//! Loading these from files, environment variables, or a CLI is explicitly
//! out of scope here — only the typed records live here.

use serde::{Deserialize, Serialize};

/// Static per-adapter configuration.
///
/// An adapter whose required credentials are missing is simply not
/// registered; the registry does not raise at call time for this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Adapter name, used as the registry key and in plans/errors.
    pub name: String,
    /// Whether the adapter participates in registry construction at all.
    pub enabled: bool,
    /// Static priority; informational, does not itself order candidates
    /// (scoring does).
    pub priority: u32,
    /// Upstream rate limit, requests per minute.
    pub rate_limit_per_minute: u32,
    /// Per-call timeout.
    pub timeout_seconds: u64,
    /// API key, if the adapter's upstream requires one.
    pub api_key: Option<String>,
    /// API secret, if the adapter's upstream requires one.
    pub api_secret: Option<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            priority: 1,
            rate_limit_per_minute: 60,
            timeout_seconds: 5,
            api_key: None,
            api_secret: None,
        }
    }
}

impl AdapterConfig {
    /// Build a minimal config for an adapter that needs no credentials.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether this adapter has every credential it declares as required.
    ///
    /// This crate does not know per-adapter which credentials are required;
    /// callers building a registry from real upstreams query their own
    /// adapter-specific requirement before registering.
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Tunables for the arbitration engine's scoring and planning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum total score (`0..=100`) for a candidate to be considered
    /// "healthy"; below this the candidate is dropped unless it is the last
    /// one standing.
    pub healthy_score_cutoff: f64,
    /// Maximum number of fallback adapters carried on a plan, beyond the
    /// primary.
    pub max_fallbacks: usize,
    /// Default staleness budget used when a caller does not specify one.
    pub default_max_staleness_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            healthy_score_cutoff: 50.0,
            max_fallbacks: 2,
            default_max_staleness_seconds: 300.0,
        }
    }
}

/// Bounds enforced on subscribe requests and the heartbeat loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubscriptionLimits {
    /// Maximum symbols per subscription.
    pub max_symbols: usize,
    /// Minimum allowed `interval_ms`.
    pub min_interval_ms: u64,
    /// Maximum allowed `interval_ms`.
    pub max_interval_ms: u64,
    /// Heartbeat period.
    pub heartbeat_interval_ms: u64,
}

impl Default for SubscriptionLimits {
    fn default() -> Self {
        Self {
            max_symbols: 50,
            min_interval_ms: 100,
            max_interval_ms: 60_000,
            heartbeat_interval_ms: 30_000,
        }
    }
}

impl SubscriptionLimits {
    /// Whether `interval_ms` falls within `[min_interval_ms, max_interval_ms]`.
    #[must_use]
    pub const fn interval_in_bounds(&self, interval_ms: u64) -> bool {
        interval_ms >= self.min_interval_ms && interval_ms <= self.max_interval_ms
    }

    /// Whether `count` symbols is within `[1, max_symbols]`.
    #[must_use]
    pub const fn symbol_count_in_bounds(&self, count: usize) -> bool {
        count >= 1 && count <= self.max_symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_spec_constants() {
        let limits = SubscriptionLimits::default();
        assert_eq!(limits.max_symbols, 50);
        assert_eq!(limits.min_interval_ms, 100);
        assert_eq!(limits.max_interval_ms, 60_000);
        assert_eq!(limits.heartbeat_interval_ms, 30_000);
    }

    #[test]
    fn symbol_count_bounds_reject_zero_and_over_limit() {
        let limits = SubscriptionLimits::default();
        assert!(!limits.symbol_count_in_bounds(0));
        assert!(limits.symbol_count_in_bounds(1));
        assert!(limits.symbol_count_in_bounds(50));
        assert!(!limits.symbol_count_in_bounds(51));
    }
}
