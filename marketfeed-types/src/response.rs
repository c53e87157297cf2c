//! The sole shape every provider adapter returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::asset::Asset;
use crate::data_type::DataType;

/// The response shape every adapter, and the engine's own merge output,
/// produce.
///
/// `data` is an intentionally opaque map rather than a per-`data_type` typed
/// payload, since provider shapes are heterogeneous. Callers validate the
/// fields they expect at the boundary instead of relying on the type system
/// to enforce a schema per `DataType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Name of the adapter that produced this response, or
    /// `"arbitration_engine"` for a merged result.
    pub provider: String,
    /// The asset this response answers for.
    pub asset: Asset,
    /// The data type this response answers for.
    pub data_type: DataType,
    /// Opaque field → value payload; shape depends on `data_type`.
    pub data: Map<String, Value>,
    /// When the underlying data was produced or observed.
    pub timestamp: DateTime<Utc>,
    /// Structural validity of `data`.
    pub is_valid: bool,
    /// Whether the adapter asserts this data is within its freshness budget.
    pub is_fresh: bool,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Free-form diagnostic data, not part of the answer itself.
    pub metadata: Map<String, Value>,
}

impl ProviderResponse {
    /// Build a response with `is_valid`/`is_fresh` true, confidence 1.0, and
    /// empty metadata — the common case for a healthy adapter.
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        asset: Asset,
        data_type: DataType,
        data: Map<String, Value>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            provider: provider.into(),
            asset,
            data_type,
            data,
            timestamp,
            is_valid: true,
            is_fresh: true,
            confidence: 1.0,
            metadata: Map::new(),
        }
    }

    /// Read `data[field]` as an `f64`, if present and numeric.
    #[must_use]
    pub fn number_field(&self, field: &str) -> Option<f64> {
        self.data.get(field).and_then(Value::as_f64)
    }

    /// Mark this response as structurally invalid or stale.
    #[must_use]
    pub fn invalidate(mut self) -> Self {
        self.is_valid = false;
        self
    }
}
