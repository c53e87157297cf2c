//! Per-connection subscription lifecycle and stream task supervision.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use marketfeed_core::StreamHandle;
use marketfeed_types::{
    Asset, FedError, HeartbeatMessage, StreamDataMessage, SubscribeRequest, SubscriptionAck,
    SubscriptionLimits, UnsubscribeRequest,
};
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};

use crate::engine::ArbitrationEngine;
use crate::subscription::project::project;
use crate::subscription::types::{OutboundMessage, Subscription};

/// Depth of the per-connection outbound channel before a tick's message is
/// dropped rather than blocking the stream task (back-pressure).
const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

struct SubscriptionEntry {
    subscription: Subscription,
    handle: StreamHandle,
}

struct ConnectionState {
    sender: mpsc::Sender<OutboundMessage>,
    subscriptions: HashMap<String, SubscriptionEntry>,
    symbol_index: HashMap<String, HashSet<String>>,
    heartbeat: StreamHandle,
}

/// One instance per process: owns every live connection's subscriptions and
/// the tasks driving them.
///
/// Must be held behind an `Arc` — `connect`/`subscribe`/`unsubscribe`/
/// `disconnect` spawn tasks that outlive the calling stack frame and need
/// their own handle back to the manager.
pub struct SubscriptionManager {
    engine: ArbitrationEngine,
    limits: SubscriptionLimits,
    next_connection_id: AtomicU64,
    next_subscription_id: AtomicU64,
    connections: AsyncMutex<HashMap<u64, ConnectionState>>,
}

impl SubscriptionManager {
    /// Build a manager driving `engine`, bounded by `limits`.
    #[must_use]
    pub fn new(engine: ArbitrationEngine, limits: SubscriptionLimits) -> Self {
        Self {
            engine,
            limits,
            next_connection_id: AtomicU64::new(1),
            next_subscription_id: AtomicU64::new(1),
            connections: AsyncMutex::new(HashMap::new()),
        }
    }

    /// Register a new connection: assigns a connection id, starts its
    /// heartbeat loop, and returns the outbound channel the caller drains to
    /// deliver messages to its client.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn connect(self: &Arc<Self>) -> (u64, mpsc::Receiver<OutboundMessage>) {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);

        let heartbeat = self.spawn_heartbeat(connection_id, sender.clone());

        let mut connections = self.connections.lock().await;
        connections.insert(
            connection_id,
            ConnectionState {
                sender,
                subscriptions: HashMap::new(),
                symbol_index: HashMap::new(),
                heartbeat,
            },
        );
        (connection_id, receiver)
    }

    /// Create a subscription on `connection_id` and start its stream task.
    ///
    /// # Errors
    /// Returns [`FedError::SubscriptionInvalid`] if the symbol count or poll
    /// interval falls outside [`SubscriptionLimits`], or if `connection_id`
    /// is not registered. No subscription is created in either case.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, request), fields(?connection_id)))]
    pub async fn subscribe(
        self: &Arc<Self>,
        connection_id: u64,
        request: SubscribeRequest,
    ) -> Result<SubscriptionAck, FedError> {
        if !self.limits.symbol_count_in_bounds(request.symbols.len()) {
            return Err(FedError::subscription_invalid(
                "SYMBOL_COUNT",
                format!(
                    "expected 1..={} symbols, got {}",
                    self.limits.max_symbols,
                    request.symbols.len()
                ),
            ));
        }
        if !self.limits.interval_in_bounds(request.interval_ms) {
            return Err(FedError::subscription_invalid(
                "INTERVAL_OUT_OF_BOUNDS",
                format!(
                    "interval_ms {} outside [{}, {}]",
                    request.interval_ms, self.limits.min_interval_ms, self.limits.max_interval_ms
                ),
            ));
        }

        let mut connections = self.connections.lock().await;
        let Some(connection) = connections.get_mut(&connection_id) else {
            return Err(FedError::subscription_invalid(
                "UNKNOWN_CONNECTION",
                "connection is not registered",
            ));
        };

        let subscription_id = format!(
            "sub-{:016x}",
            self.next_subscription_id.fetch_add(1, Ordering::Relaxed)
        );
        let subscription = Subscription::new(
            subscription_id.clone(),
            connection_id,
            request.stream_type,
            request.asset_kind,
            request.market,
            request.data_type,
            request.interval_ms,
            request.symbols.clone(),
        );

        for symbol in &request.symbols {
            connection
                .symbol_index
                .entry(symbol.clone())
                .or_default()
                .insert(subscription_id.clone());
        }

        let handle =
            Self::spawn_stream_task(Arc::clone(self), subscription.clone(), connection.sender.clone());
        connection.subscriptions.insert(
            subscription_id.clone(),
            SubscriptionEntry { subscription, handle },
        );

        Ok(SubscriptionAck {
            stream_type: request.stream_type,
            symbols: request.symbols,
            subscription_id,
            interval_ms: request.interval_ms,
            timestamp: Utc::now(),
        })
    }

    /// Narrow or cancel subscriptions matching `request.stream_type` on
    /// `connection_id`.
    ///
    /// # Errors
    /// Returns [`FedError::SubscriptionInvalid`] if `connection_id` is not
    /// registered.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, request), fields(?connection_id)))]
    pub async fn unsubscribe(
        self: &Arc<Self>,
        connection_id: u64,
        request: UnsubscribeRequest,
    ) -> Result<(), FedError> {
        let mut connections = self.connections.lock().await;
        let Some(connection) = connections.get_mut(&connection_id) else {
            return Err(FedError::subscription_invalid(
                "UNKNOWN_CONNECTION",
                "connection is not registered",
            ));
        };

        let matching: Vec<String> = connection
            .subscriptions
            .iter()
            .filter(|(_, entry)| entry.subscription.stream_type == request.stream_type)
            .map(|(id, _)| id.clone())
            .collect();

        let mut to_cancel = Vec::new();
        match &request.symbols {
            None => to_cancel.extend(matching),
            Some(remove_symbols) => {
                for id in matching {
                    let entry = connection
                        .subscriptions
                        .get(&id)
                        .expect("id collected from this connection's own map");
                    entry.subscription.remove_symbols(remove_symbols);
                    for symbol in remove_symbols {
                        if let Some(subs) = connection.symbol_index.get_mut(symbol) {
                            subs.remove(&id);
                        }
                    }
                    if entry.subscription.is_empty() {
                        to_cancel.push(id);
                    }
                }
            }
        }

        let mut handles = Vec::with_capacity(to_cancel.len());
        for id in to_cancel {
            if let Some(entry) = connection.subscriptions.remove(&id) {
                handles.push(entry.handle);
            }
        }
        drop(connections);
        for handle in handles {
            handle.stop().await;
        }
        Ok(())
    }

    /// Cancel every stream task and the heartbeat task for `connection_id`,
    /// then release its state.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn disconnect(self: &Arc<Self>, connection_id: u64) {
        let mut connections = self.connections.lock().await;
        let Some(mut connection) = connections.remove(&connection_id) else {
            return;
        };
        drop(connections);

        let handles: Vec<StreamHandle> = connection
            .subscriptions
            .drain()
            .map(|(_, entry)| entry.handle)
            .collect();
        for handle in handles {
            handle.stop().await;
        }
        connection.heartbeat.stop().await;
    }

    fn spawn_heartbeat(self: &Arc<Self>, connection_id: u64, sender: mpsc::Sender<OutboundMessage>) -> StreamHandle {
        let manager = Arc::clone(self);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let period = Duration::from_millis(manager.limits.heartbeat_interval_ms);

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(period) => {}
                    _ = &mut stop_rx => break,
                }
                let active_subscriptions = {
                    let connections = manager.connections.lock().await;
                    connections
                        .get(&connection_id)
                        .map_or(0, |c| c.subscriptions.len())
                };
                let message = OutboundMessage::Heartbeat(HeartbeatMessage {
                    timestamp: Utc::now(),
                    active_subscriptions,
                });
                let _ = sender.try_send(message);
            }
        });
        StreamHandle::new(join, stop_tx)
    }

    fn spawn_stream_task(
        manager: Arc<Self>,
        subscription: Subscription,
        sender: mpsc::Sender<OutboundMessage>,
    ) -> StreamHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let period = Duration::from_millis(subscription.interval_ms);

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(period) => {}
                    _ = &mut stop_rx => break,
                }

                let symbols = subscription.symbols();
                if symbols.is_empty() {
                    continue;
                }

                let mut updates = Vec::with_capacity(symbols.len());
                for symbol in &symbols {
                    let asset = Asset::new(symbol, subscription.asset_kind, subscription.market);
                    // A single symbol's failure this tick is logged and
                    // swallowed; the task continues at the next tick.
                    match manager.engine.fetch(&asset, subscription.data_type, "global").await {
                        Ok(response) => {
                            if let Some(update) = project(subscription.stream_type, symbol, &response) {
                                updates.push(update);
                            }
                        }
                        Err(err) => trace_tick_failure(&subscription.id, symbol, &err),
                    }
                }

                if updates.is_empty() {
                    continue;
                }

                let message = OutboundMessage::Data(StreamDataMessage {
                    stream_type: subscription.stream_type,
                    subscription_id: subscription.id.clone(),
                    data: updates,
                    timestamp: Utc::now(),
                });
                let _ = sender.try_send(message);
            }
        });
        StreamHandle::new(join, stop_tx)
    }
}

fn trace_tick_failure(subscription_id: &str, symbol: &str, err: &FedError) {
    #[cfg(feature = "tracing")]
    tracing::debug!(subscription_id, symbol, %err, "tick fetch failed, symbol skipped this round");
    #[cfg(not(feature = "tracing"))]
    {
        let _ = (subscription_id, symbol, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketfeed_core::ProviderAdapter;
    use marketfeed_core::ProviderRegistry;
    use marketfeed_mock::MockAdapter;
    use marketfeed_types::{AssetKind, DataType, EngineConfig, Market, StreamType};

    async fn manager_with_mock_adapter() -> Arc<SubscriptionManager> {
        let adapter: Arc<dyn ProviderAdapter> = Arc::new(MockAdapter::new("m"));
        let registry = ProviderRegistry::new(vec![adapter]);
        registry.initialize().await.unwrap();
        let engine = ArbitrationEngine::new(Arc::new(registry), EngineConfig::default());
        Arc::new(SubscriptionManager::new(engine, SubscriptionLimits::default()))
    }

    #[tokio::test]
    async fn subscribe_rejects_too_many_symbols() {
        let manager = manager_with_mock_adapter().await;
        let (connection_id, _rx) = manager.connect().await;
        let request = SubscribeRequest {
            stream_type: StreamType::Price,
            symbols: (0..51).map(|i| format!("S{i}")).collect(),
            asset_kind: AssetKind::Equity,
            market: Market::Us,
            interval_ms: 1_000,
            data_type: DataType::Price,
            params: serde_json::Map::new(),
        };
        let err = manager.subscribe(connection_id, request).await.unwrap_err();
        assert!(matches!(err, FedError::SubscriptionInvalid { .. }));
    }

    #[tokio::test]
    async fn subscribe_then_unsubscribe_cancels_the_stream_task() {
        let manager = manager_with_mock_adapter().await;
        let (connection_id, _rx) = manager.connect().await;
        let request = SubscribeRequest {
            stream_type: StreamType::Price,
            symbols: vec!["AAPL".to_string()],
            asset_kind: AssetKind::Equity,
            market: Market::Us,
            interval_ms: 100,
            data_type: DataType::Price,
            params: serde_json::Map::new(),
        };
        let ack = manager.subscribe(connection_id, request).await.unwrap();
        assert_eq!(ack.symbols, vec!["AAPL".to_string()]);

        manager
            .unsubscribe(
                connection_id,
                UnsubscribeRequest {
                    stream_type: StreamType::Price,
                    symbols: None,
                },
            )
            .await
            .unwrap();

        let connections = manager.connections.lock().await;
        assert!(connections
            .get(&connection_id)
            .expect("connection still registered")
            .subscriptions
            .is_empty());
    }

    #[tokio::test]
    async fn disconnect_removes_the_connection() {
        let manager = manager_with_mock_adapter().await;
        let (connection_id, _rx) = manager.connect().await;
        manager.disconnect(connection_id).await;
        let connections = manager.connections.lock().await;
        assert!(!connections.contains_key(&connection_id));
    }
}
