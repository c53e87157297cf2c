//! The subscription protocol's client/server message shapes.
//!
//! Field names are exactly as specified; this module only defines the JSON
//! shape, not how it is framed over a transport (that choice is left to the
//! embedder).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::asset::{AssetKind, Market};
use crate::data_type::DataType;

/// The shape of a subscription's outgoing updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    /// Price ticks.
    Price,
    /// OHLCV candle updates.
    Ohlcv,
    /// Bid/ask quote updates.
    Quote,
    /// Individual trade prints.
    Trades,
    /// Multiple asset kinds multiplexed on one subscription.
    MultiAsset,
}

/// Client → server: create or extend a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Requested stream shape.
    pub stream_type: StreamType,
    /// 1 to 50 symbols.
    pub symbols: Vec<String>,
    /// Asset kind shared by every symbol on this subscription.
    pub asset_kind: AssetKind,
    /// Market shared by every symbol on this subscription.
    pub market: Market,
    /// Poll period in milliseconds, `100..=60_000`.
    pub interval_ms: u64,
    /// The data type the poll loop requests from the arbitration engine.
    pub data_type: DataType,
    /// Free-form extra parameters, passed through uninterpreted.
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Client → server: remove symbols from, or destroy, a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    /// Which subscription(s) on this connection to narrow or cancel.
    pub stream_type: StreamType,
    /// If absent, every subscription matching `stream_type` is cancelled.
    /// If present, these symbols are removed; an emptied subscription is
    /// cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,
}

/// Server → client: acknowledges a successful subscribe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionAck {
    /// Echoes the request's stream type.
    pub stream_type: StreamType,
    /// The symbols now covered by this subscription.
    pub symbols: Vec<String>,
    /// Opaque subscription identifier, used by later unsubscribe requests.
    pub subscription_id: String,
    /// Echoes the request's poll interval.
    pub interval_ms: u64,
    /// When the subscription was created.
    pub timestamp: DateTime<Utc>,
}

/// A single price tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Symbol this update is for.
    pub symbol: String,
    /// Current price.
    pub price: f64,
    /// Absolute change since the prior close.
    pub change: f64,
    /// Percentage change since the prior close.
    pub change_percent: f64,
    /// Traded volume, if the source reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// When the underlying response was produced.
    pub timestamp: DateTime<Utc>,
    /// The adapter (or `"arbitration_engine"`) that produced this value.
    pub provider: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// A single OHLCV candle update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvUpdate {
    /// Symbol this update is for.
    pub symbol: String,
    /// Candle open time.
    pub timestamp: DateTime<Utc>,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume over the candle.
    pub volume: f64,
    /// Whether this candle is final (as opposed to still accumulating).
    pub is_closed: bool,
}

/// A single bid/ask quote update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteUpdate {
    /// Symbol this update is for.
    pub symbol: String,
    /// Best bid price.
    pub bid: f64,
    /// Best ask price.
    pub ask: f64,
    /// Size available at `bid`, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_size: Option<f64>,
    /// Size available at `ask`, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask_size: Option<f64>,
    /// `ask - bid`.
    pub spread: f64,
    /// When this quote was observed.
    pub timestamp: DateTime<Utc>,
}

/// A single trade print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeUpdate {
    /// Symbol this update is for.
    pub symbol: String,
    /// Trade price.
    pub price: f64,
    /// Trade size.
    pub quantity: f64,
    /// When the trade occurred.
    pub timestamp: DateTime<Utc>,
    /// Venue-assigned trade identifier, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,
    /// Aggressor side, if known (`"buy"` or `"sell"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
}

/// One element of a `data` message's update list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Update {
    /// See [`PriceUpdate`].
    Price(PriceUpdate),
    /// See [`OhlcvUpdate`].
    Ohlcv(OhlcvUpdate),
    /// See [`QuoteUpdate`].
    Quote(QuoteUpdate),
    /// See [`TradeUpdate`].
    Trade(TradeUpdate),
}

/// Server → client: one batched tick of updates for a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDataMessage {
    /// The subscription's stream type.
    pub stream_type: StreamType,
    /// The subscription this batch belongs to.
    pub subscription_id: String,
    /// One update per symbol that produced a response this tick.
    pub data: Vec<Update>,
    /// When this batch was assembled.
    pub timestamp: DateTime<Utc>,
}

/// Server → client: periodic liveness signal, independent of any
/// subscription's poll interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatMessage {
    /// When this heartbeat was emitted.
    pub timestamp: DateTime<Utc>,
    /// Count of subscriptions currently active on this connection.
    pub active_subscriptions: usize,
}

/// Server → client: a message-level failure. The connection remains open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsErrorMessage {
    /// One of `INVALID_JSON`, `INVALID_MESSAGE_TYPE`, or a validation code.
    pub error_code: String,
    /// Human-readable detail.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// When the error was raised.
    pub timestamp: DateTime<Utc>,
}
