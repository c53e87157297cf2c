//! The uniform contract every provider adapter satisfies.

use async_trait::async_trait;
use marketfeed_types::{Asset, AdapterConfig, DataType, DataTypeSet, FedError, ProviderHealth, ProviderResponse};

use crate::state::AdapterState;

/// A stateful wrapper around a single upstream data provider.
///
/// Every operation is asynchronous; none may block the executor thread.
/// Adapters own their own state exclusively — the registry never reaches
/// into an adapter's counters or cooldown directly,
/// only through [`ProviderAdapter::get_health`], [`ProviderAdapter::is_in_cooldown`],
/// and [`ProviderAdapter::set_cooldown`].
///
/// An adapter that does not implement one of the `fetch_*` operations (for
/// example, a news-only adapter asked for `fetch_price`) must return
/// [`FedError::UnsupportedOperation`], never a fabricated empty success.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable adapter name; used as the registry key, in plans, and in
    /// errors.
    fn name(&self) -> &str;

    /// Static configuration this adapter was constructed with.
    fn config(&self) -> &AdapterConfig;

    /// The shared counters/cooldown cell backing this adapter's health and
    /// rate-limit state machine.
    fn state(&self) -> &AdapterState;

    /// The static set of data types this adapter can ever answer.
    fn capabilities(&self) -> DataTypeSet;

    /// Acquire transport resources and mark this adapter initialized.
    async fn initialize(&self) -> Result<(), FedError>;

    /// Release transport resources and clear the initialized flag.
    ///
    /// Must release resources on every exit path, including one reached
    /// after a prior `initialize` failure.
    async fn shutdown(&self) -> Result<(), FedError>;

    /// Cheap, non-blocking capability predicate for a specific asset.
    fn supports_asset(&self, asset: &Asset) -> bool;

    /// Fetch a current price observation.
    async fn fetch_price(&self, asset: &Asset) -> Result<ProviderResponse, FedError>;

    /// Fetch an OHLCV candle series.
    async fn fetch_ohlcv(
        &self,
        asset: &Asset,
        timeframe: &str,
        limit: usize,
    ) -> Result<ProviderResponse, FedError>;

    /// Fetch fundamental company data.
    async fn fetch_fundamentals(&self, asset: &Asset) -> Result<ProviderResponse, FedError>;

    /// Fetch news articles.
    async fn fetch_news(&self, asset: &Asset, limit: usize) -> Result<ProviderResponse, FedError>;

    /// Fetch derived technical indicators.
    async fn fetch_technical(&self, asset: &Asset) -> Result<ProviderResponse, FedError>;

    /// Current health snapshot.
    async fn get_health(&self) -> ProviderHealth;

    /// 95th percentile latency for `region`, in milliseconds. May return a
    /// default when data is thin.
    async fn get_latency_p95(&self, region: &str) -> f64;

    /// Timestamp of the last successful update for `asset`/`data_type`. May
    /// return a default when data is thin.
    async fn get_last_update(&self, asset: &Asset, data_type: DataType) -> chrono::DateTime<chrono::Utc>;

    /// Data completeness for `data_type`, in `[0, 1]`. May return a default
    /// when data is thin.
    async fn get_completeness(&self, data_type: DataType) -> f64;

    /// Success rate over recent requests, in `[0, 1]`.
    ///
    /// The default implementation derives this from [`AdapterState`]'s
    /// request/error counters, matching the source's
    /// `1.0 - error_count / request_count` (or `1.0` with no requests yet).
    async fn get_success_rate(&self) -> f64 {
        self.state().success_rate()
    }

    /// Uptime fraction over the trailing 24h, in `[0, 1]`. May return a
    /// default when data is thin.
    async fn get_uptime_24h(&self) -> f64;

    /// Whether this adapter is currently in cooldown.
    fn is_in_cooldown(&self) -> bool {
        self.state().is_in_cooldown()
    }

    /// Place this adapter in cooldown for `seconds` from now.
    fn set_cooldown(&self, seconds: u64) {
        self.state().set_cooldown(seconds);
    }
}
