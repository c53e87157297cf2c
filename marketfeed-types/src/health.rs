//! A point-in-time health snapshot for an adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of an adapter's operational health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHealth {
    /// Adapter name.
    pub name: String,
    /// Whether the adapter is currently usable (enabled, initialized, not in
    /// cooldown).
    pub is_healthy: bool,
    /// Fraction of the last 24h the adapter was reachable, in `[0, 1]`.
    pub uptime_fraction: f64,
    /// Mean observed latency in milliseconds.
    pub avg_latency_ms: f64,
    /// Fraction of recent requests that succeeded, in `[0, 1]`.
    pub success_rate: f64,
    /// When this snapshot was taken.
    pub last_check: DateTime<Utc>,
    /// Count of errors observed in the trailing 24h window.
    pub error_count_24h: u64,
}
