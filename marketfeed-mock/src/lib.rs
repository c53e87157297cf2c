//! marketfeed-mock
//!
//! Deterministic mock adapters for testing the arbitration engine and
//! subscription manager without real upstream transports.
//!
//! Two symbols carry magic behavior, in the style of a fixture adapter: a
//! request for symbol `"FAIL"` returns a transport error, and a request for
//! symbol `"TIMEOUT"` sleeps past any reasonable per-call timeout before
//! returning success.
#![warn(missing_docs)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marketfeed_core::{AdapterState, ProviderAdapter};
use marketfeed_types::{
    AdapterConfig, Asset, DataType, DataTypeSet, FedError, ProviderHealth, ProviderResponse,
};
use serde_json::{json, Map, Value};

/// A symbol that always produces a transport error from [`MockAdapter`].
pub const FAIL_SYMBOL: &str = "FAIL";
/// A symbol that always sleeps past a reasonable timeout before succeeding.
pub const TIMEOUT_SYMBOL: &str = "TIMEOUT";

/// How a [`MockAdapter`] should fail, if at all, on its next call.
#[derive(Debug, Clone)]
pub enum Fault {
    /// No fault; the call succeeds.
    None,
    /// A plain transport error with the given message.
    Transport(String),
    /// A free-text error containing a rate-limit phrase the engine's
    /// substring sniff is expected to recognize.
    RateLimitText(String),
}

/// A deterministic, fixture-backed adapter for tests and demos.
///
/// Every reporting hook (`get_latency_p95`, `get_completeness`, ...) returns
/// a field set at construction, rather than deriving it from real traffic,
/// so scoring scenarios are fully reproducible.
pub struct MockAdapter {
    config: AdapterConfig,
    state: AdapterState,
    caps: DataTypeSet,
    price: f64,
    change: f64,
    change_percent: f64,
    volume: f64,
    latency_p95_ms: Mutex<f64>,
    uptime_24h: Mutex<f64>,
    completeness: Mutex<f64>,
    fault: Mutex<Fault>,
}

impl MockAdapter {
    /// Build a mock adapter named `name`, supporting every data type, with
    /// the common "healthy" reporting defaults (p95 100ms, 99% uptime, full
    /// completeness) and price `150.0` (the literal value used by scenario
    /// S1).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: AdapterConfig::named(name),
            state: AdapterState::new(),
            caps: DataTypeSet::all(),
            price: 150.0,
            change: -1.5,
            change_percent: -1.48,
            volume: 1_000_000.0,
            latency_p95_ms: Mutex::new(100.0),
            uptime_24h: Mutex::new(0.99),
            completeness: Mutex::new(1.0),
            fault: Mutex::new(Fault::None),
        }
    }

    /// Restrict the declared capability set.
    #[must_use]
    pub fn with_capabilities(mut self, caps: DataTypeSet) -> Self {
        self.caps = caps;
        self
    }

    /// Override the mock price (and implicitly `change`/`change_percent`
    /// stay as constructed; callers needing exact control should also call
    /// [`with_change`](Self::with_change)).
    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Override `change`/`change_percent`.
    #[must_use]
    pub fn with_change(mut self, change: f64, change_percent: f64) -> Self {
        self.change = change;
        self.change_percent = change_percent;
        self
    }

    /// Override the reported p95 latency, which feeds the `latency`
    /// sub-score.
    #[must_use]
    pub fn with_latency_p95_ms(self, ms: f64) -> Self {
        *self.latency_p95_ms.lock().unwrap_or_else(|e| e.into_inner()) = ms;
        self
    }

    /// Override the reported 24h uptime fraction.
    #[must_use]
    pub fn with_uptime_24h(self, uptime: f64) -> Self {
        *self.uptime_24h.lock().unwrap_or_else(|e| e.into_inner()) = uptime;
        self
    }

    /// Arrange for the next call to fail with `fault` instead of succeeding.
    pub fn set_fault(&self, fault: Fault) {
        *self.fault.lock().unwrap_or_else(|e| e.into_inner()) = fault;
    }

    /// The per-adapter state cell, exposed for assertions in tests (e.g.
    /// checking `error_count` after a fallback scenario).
    #[must_use]
    pub fn adapter_state(&self) -> &AdapterState {
        &self.state
    }

    fn price_payload(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("price".into(), json!(self.price));
        data.insert("change".into(), json!(self.change));
        data.insert("change_percent".into(), json!(self.change_percent));
        data.insert("volume".into(), json!(self.volume));
        data
    }

    async fn maybe_fail_or_delay(&self, asset: &Asset) -> Result<(), FedError> {
        if asset.symbol == TIMEOUT_SYMBOL {
            tokio::time::sleep(Duration::from_secs(200)).await;
            return Ok(());
        }
        if asset.symbol == FAIL_SYMBOL {
            return Err(FedError::transport(self.name(), "simulated transport failure"));
        }
        let fault = std::mem::replace(
            &mut *self.fault.lock().unwrap_or_else(|e| e.into_inner()),
            Fault::None,
        );
        match fault {
            Fault::None => Ok(()),
            Fault::Transport(message) => Err(FedError::transport(self.name(), message)),
            Fault::RateLimitText(message) => Err(FedError::transport(self.name(), message)),
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn state(&self) -> &AdapterState {
        &self.state
    }

    fn capabilities(&self) -> DataTypeSet {
        self.caps
    }

    async fn initialize(&self) -> Result<(), FedError> {
        self.state.mark_initialized();
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), FedError> {
        self.state.clear_initialized();
        Ok(())
    }

    fn supports_asset(&self, _asset: &Asset) -> bool {
        true
    }

    async fn fetch_price(&self, asset: &Asset) -> Result<ProviderResponse, FedError> {
        self.state.record_request();
        if let Err(err) = self.maybe_fail_or_delay(asset).await {
            self.state.record_error();
            return Err(err);
        }
        Ok(ProviderResponse::new(
            self.name(),
            asset.clone(),
            DataType::Price,
            self.price_payload(),
            Utc::now(),
        ))
    }

    async fn fetch_ohlcv(
        &self,
        asset: &Asset,
        _timeframe: &str,
        limit: usize,
    ) -> Result<ProviderResponse, FedError> {
        self.state.record_request();
        if let Err(err) = self.maybe_fail_or_delay(asset).await {
            self.state.record_error();
            return Err(err);
        }
        let candles: Vec<Value> = (0..limit)
            .map(|i| {
                json!({
                    "timestamp": (Utc::now() - chrono::Duration::days(i as i64)).to_rfc3339(),
                    "open": self.price,
                    "high": self.price * 1.01,
                    "low": self.price * 0.99,
                    "close": self.price,
                    "volume": self.volume,
                })
            })
            .collect();
        let mut data = Map::new();
        data.insert("candles".into(), json!(candles));
        Ok(ProviderResponse::new(
            self.name(),
            asset.clone(),
            DataType::Ohlcv,
            data,
            Utc::now(),
        ))
    }

    async fn fetch_fundamentals(&self, asset: &Asset) -> Result<ProviderResponse, FedError> {
        self.state.record_request();
        if let Err(err) = self.maybe_fail_or_delay(asset).await {
            self.state.record_error();
            return Err(err);
        }
        let mut data = Map::new();
        data.insert("market_cap".into(), json!(1_000_000_000.0));
        data.insert("pe_ratio".into(), json!(15.2));
        data.insert("eps".into(), json!(4.5));
        Ok(ProviderResponse::new(
            self.name(),
            asset.clone(),
            DataType::Fundamentals,
            data,
            Utc::now(),
        ))
    }

    async fn fetch_news(&self, asset: &Asset, limit: usize) -> Result<ProviderResponse, FedError> {
        self.state.record_request();
        if let Err(err) = self.maybe_fail_or_delay(asset).await {
            self.state.record_error();
            return Err(err);
        }
        let articles: Vec<Value> = (0..limit)
            .map(|i| {
                json!({
                    "url": format!("https://example.com/{}/{i}", self.name()),
                    "title": format!("{} headline {i}", asset.symbol),
                    "sentiment": 0.5,
                })
            })
            .collect();
        let mut data = Map::new();
        data.insert("articles".into(), json!(articles));
        data.insert("score".into(), json!(0.5));
        Ok(ProviderResponse::new(
            self.name(),
            asset.clone(),
            DataType::News,
            data,
            Utc::now(),
        ))
    }

    async fn fetch_technical(&self, asset: &Asset) -> Result<ProviderResponse, FedError> {
        self.state.record_request();
        if let Err(err) = self.maybe_fail_or_delay(asset).await {
            self.state.record_error();
            return Err(err);
        }
        let mut data = Map::new();
        data.insert("rsi_14".into(), json!(55.0));
        data.insert("sma_50".into(), json!(self.price));
        Ok(ProviderResponse::new(
            self.name(),
            asset.clone(),
            DataType::Technical,
            data,
            Utc::now(),
        ))
    }

    async fn get_health(&self) -> ProviderHealth {
        ProviderHealth {
            name: self.name().to_string(),
            is_healthy: !self.is_in_cooldown(),
            uptime_fraction: *self.uptime_24h.lock().unwrap_or_else(|e| e.into_inner()),
            avg_latency_ms: *self.latency_p95_ms.lock().unwrap_or_else(|e| e.into_inner()),
            success_rate: self.state.success_rate(),
            last_check: Utc::now(),
            error_count_24h: self.state.error_count(),
        }
    }

    async fn get_latency_p95(&self, _region: &str) -> f64 {
        *self.latency_p95_ms.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn get_last_update(&self, _asset: &Asset, _data_type: DataType) -> DateTime<Utc> {
        Utc::now()
    }

    async fn get_completeness(&self, _data_type: DataType) -> f64 {
        *self.completeness.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn get_uptime_24h(&self) -> f64 {
        *self.uptime_24h.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketfeed_types::{AssetKind, Market};

    #[tokio::test]
    async fn fail_symbol_returns_transport_error() {
        let adapter = MockAdapter::new("m");
        adapter.initialize().await.unwrap();
        let asset = Asset::new(FAIL_SYMBOL, AssetKind::Equity, Market::Us);
        let err = adapter.fetch_price(&asset).await.unwrap_err();
        assert!(matches!(err, FedError::Transport { .. }));
        assert_eq!(adapter.adapter_state().error_count(), 1);
    }

    #[tokio::test]
    async fn healthy_fetch_returns_constructed_price() {
        let adapter = MockAdapter::new("m").with_price(150.0);
        adapter.initialize().await.unwrap();
        let asset = Asset::new("AAPL", AssetKind::Equity, Market::Us);
        let resp = adapter.fetch_price(&asset).await.unwrap();
        assert_eq!(resp.number_field("price"), Some(150.0));
        assert!(resp.is_valid);
        assert!(resp.is_fresh);
    }
}
