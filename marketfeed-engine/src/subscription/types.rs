//! `Subscription` and the messages a connection receives.

use std::sync::{Arc, Mutex};

use marketfeed_types::{
    AssetKind, DataType, HeartbeatMessage, Market, StreamDataMessage, StreamType, SubscriptionAck,
    WsErrorMessage,
};

/// A message queued for delivery to one connection's client.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// Acknowledges a successful subscribe.
    Ack(SubscriptionAck),
    /// One batched tick of stream updates.
    Data(StreamDataMessage),
    /// A periodic liveness signal.
    Heartbeat(HeartbeatMessage),
    /// A message-level failure; the connection remains open.
    Error(WsErrorMessage),
}

/// One connection's live subscription.
///
/// The asset shape (`stream_type`, `asset_kind`, `market`, `data_type`,
/// `interval_ms`) is fixed at creation; only `symbols` is mutable, narrowed
/// by later unsubscribe requests. It is shared behind a lock so the stream
/// task reads the live set on every tick.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Opaque identifier used by later unsubscribe requests.
    pub id: String,
    /// The connection this subscription belongs to.
    pub connection_id: u64,
    /// The wire shape this subscription emits.
    pub stream_type: StreamType,
    /// Asset kind shared by every symbol on this subscription.
    pub asset_kind: AssetKind,
    /// Market shared by every symbol on this subscription.
    pub market: Market,
    /// The data type the poll loop requests from the arbitration engine.
    pub data_type: DataType,
    /// Poll period in milliseconds.
    pub interval_ms: u64,
    symbols: Arc<Mutex<Vec<String>>>,
}

impl Subscription {
    /// Build a subscription over `symbols`.
    #[must_use]
    pub fn new(
        id: String,
        connection_id: u64,
        stream_type: StreamType,
        asset_kind: AssetKind,
        market: Market,
        data_type: DataType,
        interval_ms: u64,
        symbols: Vec<String>,
    ) -> Self {
        Self {
            id,
            connection_id,
            stream_type,
            asset_kind,
            market,
            data_type,
            interval_ms,
            symbols: Arc::new(Mutex::new(symbols)),
        }
    }

    /// A snapshot of the symbols currently covered.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.symbols.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Remove `to_remove` from the covered symbol set.
    pub fn remove_symbols(&self, to_remove: &[String]) {
        let mut symbols = self.symbols.lock().unwrap_or_else(|e| e.into_inner());
        symbols.retain(|s| !to_remove.contains(s));
    }

    /// Whether no symbols remain on this subscription.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }
}
