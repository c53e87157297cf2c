//! Fallback execution across an arbitration plan's adapter chain.

use std::time::Duration;

use marketfeed_core::ProviderAdapter;
use marketfeed_types::{ArbitrationPlan, Asset, DataType, FedError, ProviderResponse};

use marketfeed_core::ProviderRegistry;

/// Default cooldown, in seconds, applied when a rate-limit message carries
/// no parseable "wait Ns" hint.
const DEFAULT_RATE_LIMIT_COOLDOWN_SECS: u64 = 60;

/// Call the adapter operation matching `data_type`.
///
/// The uniform contract names exactly five fetch operations for nine
/// `DataType` variants. `Sentiment`, `Macro`, `Correlation`, and `Risk` have
/// no corresponding adapter operation in the source this was distilled from
/// either (its `BaseProvider` abstract methods cover only price/ohlcv/
/// fundamentals/news); rather than guess an implicit mapping (e.g. deriving
/// sentiment from a news fetch), this dispatch treats them as
/// provider-unsupported-operation, the same policy applied to any other
/// adapter that lacks an operation — see `DESIGN.md`.
pub async fn dispatch(
    adapter: &dyn ProviderAdapter,
    asset: &Asset,
    data_type: DataType,
) -> Result<ProviderResponse, FedError> {
    match data_type {
        DataType::Price => adapter.fetch_price(asset).await,
        DataType::Ohlcv => adapter.fetch_ohlcv(asset, "1d", 100).await,
        DataType::Fundamentals => adapter.fetch_fundamentals(asset).await,
        DataType::Technical => adapter.fetch_technical(asset).await,
        DataType::News => adapter.fetch_news(asset, 10).await,
        DataType::Sentiment | DataType::Macro | DataType::Correlation | DataType::Risk => {
            Err(FedError::UnsupportedOperation {
                provider: adapter.name().to_string(),
                data_type,
            })
        }
    }
}

/// Walk `plan`'s fallback chain, trying each adapter strictly in order and
/// never retrying one already tried within this call.
///
/// An unsupported `data_type` at the call boundary (as opposed to per-adapter
/// dispatch) is a programmer error propagated immediately rather than treated
/// as a fallback case; this function assumes
/// its caller already validated `data_type` against the request surface it
/// exposes, so that case does not arise here.
///
/// # Errors
/// Returns [`FedError::AllProvidersFailed`] aggregating every per-adapter
/// failure if every adapter in the chain is exhausted without a valid, fresh
/// response.
pub async fn execute_with_fallback(
    plan: &ArbitrationPlan,
    registry: &ProviderRegistry,
    asset: &Asset,
    data_type: DataType,
) -> Result<ProviderResponse, FedError> {
    let mut errors = Vec::new();

    for (attempt, name) in plan.chain().into_iter().enumerate() {
        let Some(adapter) = registry.provider(name) else {
            continue;
        };
        if attempt > 0 {
            trace_fallback_advance(name, attempt);
        }

        let timeout = Duration::from_millis(plan.timeout_ms.max(1));
        match tokio::time::timeout(timeout, dispatch(adapter.as_ref(), asset, data_type)).await {
            Ok(Ok(response)) if response.is_valid && response.is_fresh => {
                return Ok(response);
            }
            Ok(Ok(_stale_or_invalid)) => {
                errors.push(FedError::Protocol {
                    provider: name.to_string(),
                    message: "response failed validity or freshness check".to_string(),
                });
            }
            Ok(Err(err)) => {
                apply_rate_limit_cooldown(adapter.as_ref(), &err);
                errors.push(err);
            }
            Err(_elapsed) => {
                errors.push(FedError::ProviderTimeout {
                    provider: name.to_string(),
                });
            }
        }
    }

    Err(FedError::AllProvidersFailed(errors))
}

fn trace_fallback_advance(name: &str, attempt: usize) {
    #[cfg(feature = "tracing")]
    tracing::debug!(provider = name, attempt, "advancing to next adapter in fallback chain");
    #[cfg(not(feature = "tracing"))]
    {
        let _ = (name, attempt);
    }
}

/// If `err` signals rate limiting — structurally, or by a substring sniff
/// over free text — place the adapter in cooldown.
fn apply_rate_limit_cooldown(adapter: &dyn ProviderAdapter, err: &FedError) {
    if let FedError::RateLimited { retry_after_secs, .. } = err {
        adapter.set_cooldown(*retry_after_secs);
        trace_cooldown(adapter.name(), *retry_after_secs);
        return;
    }

    let Some(message) = err.sniffable_message() else {
        return;
    };
    if !message.to_lowercase().contains("rate limit") {
        return;
    }
    let cooldown_secs = parse_wait_seconds(message).unwrap_or(DEFAULT_RATE_LIMIT_COOLDOWN_SECS);
    adapter.set_cooldown(cooldown_secs);
    trace_cooldown(adapter.name(), cooldown_secs);
}

fn trace_cooldown(provider: &str, seconds: u64) {
    #[cfg(feature = "tracing")]
    tracing::warn!(provider, seconds, "adapter entering cooldown");
    #[cfg(not(feature = "tracing"))]
    {
        let _ = (provider, seconds);
    }
}

/// Parse a trailing `"wait Ns"` hint (case-insensitive, `N` may carry a
/// fractional part) out of a free-text error message and return the cooldown
/// to apply: `ceil(N) + 1` seconds, e.g. `"Rate limit exceeded. Wait 10s"` →
/// `Some(11)`, `"Wait 10.5s"` → `Some(12)`.
fn parse_wait_seconds(message: &str) -> Option<u64> {
    let lower = message.to_lowercase();
    let idx = lower.find("wait ")?;
    let rest = &lower[idx + "wait ".len()..];
    let mut seen_dot = false;
    let numeric: String = rest
        .chars()
        .take_while(|c| {
            if c.is_ascii_digit() {
                true
            } else if *c == '.' && !seen_dot {
                seen_dot = true;
                true
            } else {
                false
            }
        })
        .collect();
    if numeric.is_empty() || numeric == "." {
        return None;
    }
    let n: f64 = numeric.parse().ok()?;
    Some(n.ceil() as u64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wait_seconds_reads_trailing_hint() {
        assert_eq!(
            parse_wait_seconds("Rate limit exceeded. Wait 10s"),
            Some(11)
        );
    }

    #[test]
    fn parse_wait_seconds_ceils_a_fractional_hint() {
        assert_eq!(
            parse_wait_seconds("Rate limit exceeded. Wait 10.5s"),
            Some(12)
        );
    }

    #[test]
    fn parse_wait_seconds_is_none_without_a_hint() {
        assert_eq!(parse_wait_seconds("Rate limit exceeded"), None);
    }
}
