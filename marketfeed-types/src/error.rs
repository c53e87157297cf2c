//! The unified error type shared by the registry, the engine, and the
//! subscription manager.

use thiserror::Error;

use crate::data_type::DataType;

/// Every failure this crate's components can produce.
///
/// Adapter-level failures are recovered locally by the engine through
/// fallback (see `marketfeed-engine::execute`); nothing escapes to the caller
/// except the terminal [`FedError::NoProviderAvailable`] and
/// [`FedError::AllProvidersFailed`] cases, plus the programmer-error
/// [`FedError::UnsupportedDataType`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FedError {
    /// The engine was asked to dispatch a `DataType` the call site does not
    /// support. A programmer error, not a fallback case.
    #[error("unsupported data type: {data_type}")]
    UnsupportedDataType {
        /// The data type that had no matching dispatch arm.
        data_type: DataType,
    },

    /// No adapter in the registry could serve this request.
    #[error("no provider available for {data_type} on {symbol}")]
    NoProviderAvailable {
        /// The symbol that was requested.
        symbol: String,
        /// The data type that was requested.
        data_type: DataType,
    },

    /// A transient transport failure (timeout, network error) from a named
    /// adapter.
    #[error("provider {provider} transport error: {message}")]
    Transport {
        /// The adapter that raised the failure.
        provider: String,
        /// Diagnostic text, preserved verbatim from the adapter.
        message: String,
    },

    /// A protocol-level failure: bad upstream status or malformed payload.
    #[error("provider {provider} protocol error: {message}")]
    Protocol {
        /// The adapter that raised the failure.
        provider: String,
        /// Diagnostic text, preserved verbatim from the adapter.
        message: String,
    },

    /// A per-attempt timeout was exceeded.
    #[error("provider {provider} timed out")]
    ProviderTimeout {
        /// The adapter whose call exceeded `timeout_seconds`.
        provider: String,
    },

    /// A structured rate-limit signal from an adapter, or one recovered by
    /// sniffing a free-text error message (see `marketfeed-engine::execute`).
    #[error("provider {provider} rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// The adapter that is rate limited.
        provider: String,
        /// Seconds to wait before the adapter should be tried again.
        retry_after_secs: u64,
    },

    /// The adapter's upstream rejected the caller's region.
    #[error("provider {provider} rejected the caller's region")]
    RegionalRestriction {
        /// The adapter that raised the restriction.
        provider: String,
    },

    /// The adapter does not implement the requested operation.
    #[error("provider {provider} does not support {data_type}")]
    UnsupportedOperation {
        /// The adapter that lacks the operation.
        provider: String,
        /// The data type that was requested.
        data_type: DataType,
    },

    /// Credentials or configuration required by an adapter were absent at
    /// registry init time. The adapter is simply not registered; this variant
    /// exists for diagnostics, not for call-time propagation.
    #[error("provider {provider} missing required configuration: {message}")]
    ProviderConfig {
        /// The adapter that could not be configured.
        provider: String,
        /// Diagnostic text describing the missing configuration.
        message: String,
    },

    /// Every adapter in a fallback chain was exhausted without a successful
    /// response; aggregates the per-adapter failures observed along the way.
    #[error("all {} providers failed", .0.len())]
    AllProvidersFailed(Vec<FedError>),

    /// A subscribe/unsubscribe message failed validation. The connection
    /// remains open; this is surfaced to the client as an `error` message.
    #[error("invalid subscription request ({code}): {message}")]
    SubscriptionInvalid {
        /// One of `INVALID_JSON`, `INVALID_MESSAGE_TYPE`, or a validation code.
        code: String,
        /// Human-readable detail.
        message: String,
    },

    /// Anything not covered above.
    #[error("{0}")]
    Other(String),
}

impl FedError {
    /// Build a [`FedError::NoProviderAvailable`].
    #[must_use]
    pub fn no_provider_available(symbol: impl Into<String>, data_type: DataType) -> Self {
        Self::NoProviderAvailable {
            symbol: symbol.into(),
            data_type,
        }
    }

    /// Build a [`FedError::Transport`].
    #[must_use]
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Build a [`FedError::RateLimited`].
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            retry_after_secs,
        }
    }

    /// Build a [`FedError::SubscriptionInvalid`].
    #[must_use]
    pub fn subscription_invalid(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SubscriptionInvalid {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The adapter name this error is attributed to, if any.
    #[must_use]
    pub fn provider_name(&self) -> Option<&str> {
        match self {
            Self::Transport { provider, .. }
            | Self::Protocol { provider, .. }
            | Self::ProviderTimeout { provider }
            | Self::RateLimited { provider, .. }
            | Self::RegionalRestriction { provider }
            | Self::UnsupportedOperation { provider, .. }
            | Self::ProviderConfig { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Free text carried by this error, for the engine's rate-limit substring
    /// sniff over error-class detection. Structured variants that already
    /// classify rate limiting are excluded since they need no sniffing.
    #[must_use]
    pub fn sniffable_message(&self) -> Option<&str> {
        match self {
            Self::Transport { message, .. } | Self::Protocol { message, .. } => Some(message),
            Self::Other(message) => Some(message),
            _ => None,
        }
    }

    /// Whether retrying elsewhere in the fallback chain could plausibly
    /// succeed, as opposed to a programmer error that should propagate
    /// unconditionally.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        !matches!(self, Self::UnsupportedDataType { .. })
    }

    /// Flatten nested [`FedError::AllProvidersFailed`] aggregates into a
    /// single flat list, preserving order.
    #[must_use]
    pub fn flatten(self) -> Vec<FedError> {
        match self {
            Self::AllProvidersFailed(errors) => {
                errors.into_iter().flat_map(FedError::flatten).collect()
            }
            other => vec![other],
        }
    }
}
