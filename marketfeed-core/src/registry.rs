//! The process-wide directory of adapter instances.

use std::collections::HashMap;
use std::sync::Arc;

use marketfeed_types::{Asset, DataType, FedError};

use crate::adapter::ProviderAdapter;

/// Owns every configured adapter instance for the process.
///
/// Adapters are constructed and handed to [`ProviderRegistry::new`] already
/// wrapped in `Arc`; the registry itself only orders their lifecycle
/// (`initialize`/`shutdown`) and filters them for a request. The adapter map
/// is populated at construction and never mutated afterward, so no lock is
/// required to read it.
pub struct ProviderRegistry {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    by_name: HashMap<String, usize>,
}

impl ProviderRegistry {
    /// Build a registry over `adapters`. Adapters are not yet initialized;
    /// call [`initialize`](Self::initialize) before serving requests.
    #[must_use]
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        let by_name = adapters
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name().to_string(), i))
            .collect();
        Self { adapters, by_name }
    }

    /// Initialize every registered adapter.
    ///
    /// The decision to skip an adapter for missing configuration happens
    /// before construction (callers simply do not include that
    /// adapter in the `Vec` passed to [`new`](Self::new)); this method
    /// initializes whatever was registered, in registration order, and
    /// returns the first failure without aborting the remaining adapters'
    /// initialization, so a single misbehaving adapter does not take every
    /// other one down with it.
    pub async fn initialize(&self) -> Result<(), FedError> {
        let mut first_error = None;
        for adapter in &self.adapters {
            if let Err(err) = adapter.initialize().await {
                tracing_warn(&format!("adapter {} failed to initialize: {err}", adapter.name()));
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Shut every adapter down, in reverse registration order, ignoring
    /// individual errors.
    pub async fn shutdown(&self) {
        for adapter in self.adapters.iter().rev() {
            let _ = adapter.shutdown().await;
        }
    }

    /// Look up an adapter by name.
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.by_name.get(name).map(|&i| Arc::clone(&self.adapters[i]))
    }

    /// All registered adapters, in registration order.
    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn ProviderAdapter>] {
        &self.adapters
    }

    /// The ordered subset of enabled, initialized, non-cooldown adapters
    /// that support `asset` and declare `data_type` in their capability set.
    ///
    /// Order is unspecified beyond "enabled-initialized-non-cooldown,
    /// capability-matching"; the arbitration engine is responsible for the
    /// final, score-based ordering.
    pub fn get_providers_for_asset(
        &self,
        asset: &Asset,
        data_type: DataType,
    ) -> Result<Vec<Arc<dyn ProviderAdapter>>, FedError> {
        let candidates: Vec<Arc<dyn ProviderAdapter>> = self
            .adapters
            .iter()
            .filter(|a| {
                a.config().enabled
                    && a.state().is_initialized()
                    && !a.is_in_cooldown()
                    && a.capabilities().supports(data_type)
                    && a.supports_asset(asset)
            })
            .cloned()
            .collect();

        if candidates.is_empty() {
            return Err(FedError::no_provider_available(&asset.symbol, data_type));
        }
        Ok(candidates)
    }
}

fn tracing_warn(message: &str) {
    #[cfg(feature = "tracing")]
    {
        tracing::warn!("{message}");
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = message;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use marketfeed_types::{AdapterConfig, AssetKind, DataTypeSet, Market, ProviderHealth, ProviderResponse};
    use serde_json::Map;

    use crate::state::AdapterState;

    struct StubAdapter {
        config: AdapterConfig,
        state: AdapterState,
        caps: DataTypeSet,
    }

    #[async_trait]
    impl ProviderAdapter for StubAdapter {
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
            Ok(ProviderResponse::new(
                self.name(),
                asset.clone(),
                DataType::Price,
                Map::new(),
                chrono::Utc::now(),
            ))
        }

        async fn fetch_ohlcv(
            &self,
            _asset: &Asset,
            _timeframe: &str,
            _limit: usize,
        ) -> Result<ProviderResponse, FedError> {
            Err(FedError::UnsupportedOperation {
                provider: self.name().to_string(),
                data_type: DataType::Ohlcv,
            })
        }

        async fn fetch_fundamentals(&self, _asset: &Asset) -> Result<ProviderResponse, FedError> {
            Err(FedError::UnsupportedOperation {
                provider: self.name().to_string(),
                data_type: DataType::Fundamentals,
            })
        }

        async fn fetch_news(&self, _asset: &Asset, _limit: usize) -> Result<ProviderResponse, FedError> {
            Err(FedError::UnsupportedOperation {
                provider: self.name().to_string(),
                data_type: DataType::News,
            })
        }

        async fn fetch_technical(&self, _asset: &Asset) -> Result<ProviderResponse, FedError> {
            Err(FedError::UnsupportedOperation {
                provider: self.name().to_string(),
                data_type: DataType::Technical,
            })
        }

        async fn get_health(&self) -> ProviderHealth {
            ProviderHealth {
                name: self.name().to_string(),
                is_healthy: true,
                uptime_fraction: 0.99,
                avg_latency_ms: 100.0,
                success_rate: self.state.success_rate(),
                last_check: chrono::Utc::now(),
                error_count_24h: self.state.error_count(),
            }
        }

        async fn get_latency_p95(&self, _region: &str) -> f64 {
            100.0
        }

        async fn get_last_update(&self, _asset: &Asset, _data_type: DataType) -> chrono::DateTime<chrono::Utc> {
            chrono::Utc::now()
        }

        async fn get_completeness(&self, _data_type: DataType) -> f64 {
            1.0
        }

        async fn get_uptime_24h(&self) -> f64 {
            0.99
        }
    }

    fn stub(name: &str, caps: DataTypeSet) -> Arc<dyn ProviderAdapter> {
        Arc::new(StubAdapter {
            config: AdapterConfig::named(name),
            state: AdapterState::new(),
            caps,
        })
    }

    #[tokio::test]
    async fn empty_registry_fails_with_no_provider_available() {
        let registry = ProviderRegistry::new(vec![]);
        let asset = Asset::new("XYZ", AssetKind::Future, Market::Cn);
        let err = registry
            .get_providers_for_asset(&asset, DataType::Price)
            .unwrap_err();
        assert!(matches!(err, FedError::NoProviderAvailable { .. }));
    }

    #[tokio::test]
    async fn cooldown_adapter_is_excluded() {
        let adapter = stub("m", DataTypeSet::PRICE);
        adapter.initialize().await.unwrap();
        adapter.set_cooldown(60);
        let registry = ProviderRegistry::new(vec![adapter]);
        let asset = Asset::new("AAPL", AssetKind::Equity, Market::Us);
        let err = registry
            .get_providers_for_asset(&asset, DataType::Price)
            .unwrap_err();
        assert!(matches!(err, FedError::NoProviderAvailable { .. }));
    }

    #[tokio::test]
    async fn capability_filter_excludes_unsupported_data_types() {
        let adapter = stub("m", DataTypeSet::NEWS);
        adapter.initialize().await.unwrap();
        let registry = ProviderRegistry::new(vec![adapter]);
        let asset = Asset::new("AAPL", AssetKind::Equity, Market::Us);
        assert!(registry.get_providers_for_asset(&asset, DataType::Price).is_err());
        assert!(registry.get_providers_for_asset(&asset, DataType::News).is_ok());
    }
}
