//! The arbitration engine facade, the crate's single upward-facing entry point.

use std::sync::Arc;

use futures::future::join_all;
use marketfeed_core::ProviderRegistry;
use marketfeed_types::{ArbitrationPlan, Asset, DataType, EngineConfig, FedError, ProviderResponse};

use crate::execute::{dispatch, execute_with_fallback};
use crate::merge::merge_multi_provider;
use crate::planning::arbitrate_request;

/// Coordinates scoring, planning, fallback execution, and merging over a
/// shared [`ProviderRegistry`].
///
/// Cheap to clone: the registry is held behind an `Arc` and `EngineConfig` is
/// `Copy`.
#[derive(Clone)]
pub struct ArbitrationEngine {
    registry: Arc<ProviderRegistry>,
    config: EngineConfig,
}

impl ArbitrationEngine {
    /// Build an engine over `registry`, tuned by `config`.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    /// The registry this engine was built over.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Build an execution plan for `asset`/`data_type`.
    ///
    /// `max_staleness_seconds` falls back to `config.default_max_staleness_seconds`
    /// when absent.
    ///
    /// # Errors
    /// Returns [`FedError::NoProviderAvailable`] if no adapter is eligible.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(symbol = %asset.symbol, %data_type)))]
    pub async fn plan(
        &self,
        asset: &Asset,
        data_type: DataType,
        region: &str,
        max_staleness_seconds: Option<f64>,
    ) -> Result<ArbitrationPlan, FedError> {
        let max_staleness_seconds =
            max_staleness_seconds.unwrap_or(self.config.default_max_staleness_seconds);
        arbitrate_request(
            &self.registry,
            asset,
            data_type,
            region,
            max_staleness_seconds,
            &self.config,
        )
        .await
    }

    /// Plan, then walk the fallback chain strictly in priority order,
    /// returning the first valid, fresh response.
    ///
    /// This is the single-provider path: it never queries more than one
    /// adapter concurrently, and never merges. Use [`fetch_merged`](Self::fetch_merged)
    /// when multiple concurrently-successful responses should be combined.
    ///
    /// # Errors
    /// Returns [`FedError::NoProviderAvailable`] if no adapter is eligible, or
    /// [`FedError::AllProvidersFailed`] if every eligible adapter failed.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(symbol = %asset.symbol, %data_type)))]
    pub async fn fetch(
        &self,
        asset: &Asset,
        data_type: DataType,
        region: &str,
    ) -> Result<ProviderResponse, FedError> {
        let plan = self.plan(asset, data_type, region, None).await?;
        execute_with_fallback(&plan, &self.registry, asset, data_type).await
    }

    /// Plan, then dispatch to every adapter on the plan's chain concurrently
    /// and merge every valid, fresh response.
    ///
    /// Falls back to the single response if only one adapter answered; with
    /// none, the per-adapter failures are aggregated the same way
    /// [`fetch`](Self::fetch) reports them.
    ///
    /// # Errors
    /// Returns [`FedError::NoProviderAvailable`] if no adapter is eligible,
    /// [`FedError::AllProvidersFailed`] if every adapter failed, or a merge
    /// error if a response was missing a field its merge strategy requires.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), fields(symbol = %asset.symbol, %data_type)))]
    pub async fn fetch_merged(
        &self,
        asset: &Asset,
        data_type: DataType,
        region: &str,
    ) -> Result<ProviderResponse, FedError> {
        let plan = self.plan(asset, data_type, region, None).await?;

        let attempts = join_all(plan.chain().into_iter().filter_map(|name| {
            let adapter = self.registry.provider(name)?;
            Some(async move {
                let result = dispatch(adapter.as_ref(), asset, data_type).await;
                (adapter.name().to_string(), result)
            })
        }))
        .await;

        let mut successes = Vec::new();
        let mut errors = Vec::new();
        for (name, result) in attempts {
            match result {
                Ok(response) if response.is_valid && response.is_fresh => {
                    successes.push(response);
                }
                Ok(_stale_or_invalid) => errors.push(FedError::Protocol {
                    provider: name,
                    message: "response failed validity or freshness check".to_string(),
                }),
                Err(err) => errors.push(err),
            }
        }

        if successes.is_empty() {
            return Err(FedError::AllProvidersFailed(errors));
        }
        merge_multi_provider(successes, data_type)
    }
}
