//! End-to-end scenario coverage (spec scenarios S1, S2, S3, S5, S6; S4 is
//! covered by `merge`'s own unit tests).

use std::sync::Arc;
use std::time::Duration;

use marketfeed_core::{ProviderAdapter, ProviderRegistry};
use marketfeed_engine::{score, ArbitrationEngine, OutboundMessage, SubscriptionManager};
use marketfeed_mock::{Fault, MockAdapter};
use marketfeed_types::{
    Asset, AssetKind, DataType, EngineConfig, FedError, Market, StreamType, SubscribeRequest,
    SubscriptionLimits, UnsubscribeRequest,
};
use serde_json::Map;

fn aapl() -> Asset {
    Asset::new("AAPL", AssetKind::Equity, Market::Us)
}

async fn engine_over(adapters: Vec<Arc<dyn ProviderAdapter>>) -> ArbitrationEngine {
    let registry = ProviderRegistry::new(adapters);
    registry.initialize().await.unwrap();
    ArbitrationEngine::new(Arc::new(registry), EngineConfig::default())
}

#[tokio::test]
async fn s1_single_provider_success() {
    let adapter: Arc<dyn ProviderAdapter> =
        Arc::new(MockAdapter::new("M").with_price(150.0).with_change(-1.5, -1.48));
    let engine = engine_over(vec![adapter]).await;

    let plan = engine.plan(&aapl(), DataType::Price, "us", None).await.unwrap();
    assert_eq!(plan.primary, "M");
    assert!(plan.fallbacks.is_empty());
    assert!(plan.merge_strategy.is_none());

    let response = engine.fetch(&aapl(), DataType::Price, "us").await.unwrap();
    assert_eq!(response.number_field("price"), Some(150.0));
    assert_eq!(response.number_field("change"), Some(-1.5));
    assert_eq!(response.number_field("volume"), Some(1_000_000.0));
    assert!(response.is_valid && response.is_fresh);
}

#[tokio::test]
async fn s2_primary_fails_fallback_wins() {
    let a = Arc::new(
        MockAdapter::new("A")
            .with_latency_p95_ms(50.0)
            .with_price(999.0),
    );
    a.set_fault(Fault::Transport("simulated outage".to_string()));
    let b: Arc<dyn ProviderAdapter> =
        Arc::new(MockAdapter::new("B").with_latency_p95_ms(400.0).with_price(100.0));
    let a_dyn: Arc<dyn ProviderAdapter> = a.clone();

    let engine = engine_over(vec![a_dyn, b]).await;
    let response = engine.fetch(&aapl(), DataType::Price, "us").await.unwrap();

    assert_eq!(response.provider, "B");
    assert_eq!(response.number_field("price"), Some(100.0));
    assert_eq!(a.adapter_state().error_count(), 1);
}

#[tokio::test]
async fn s3_rate_limit_text_triggers_cooldown() {
    let r = Arc::new(MockAdapter::new("R"));
    r.set_fault(Fault::RateLimitText(
        "Rate limit exceeded. Wait 10s".to_string(),
    ));
    let r_dyn: Arc<dyn ProviderAdapter> = r.clone();

    let engine = engine_over(vec![r_dyn]).await;
    let err = engine
        .fetch(&aapl(), DataType::Price, "us")
        .await
        .unwrap_err();
    assert!(matches!(err, FedError::AllProvidersFailed(_)));

    assert!(r.is_in_cooldown());
    let remaining = r.adapter_state().cooldown_remaining().unwrap();
    assert!(remaining > Duration::from_secs(9) && remaining <= Duration::from_secs(11));

    let cooldown_score = score(r.as_ref(), &aapl(), DataType::Price, "us", 300.0).await;
    assert_eq!(cooldown_score.total, 0.0);
}

#[tokio::test]
async fn s5_no_providers_fails_before_calling_anything() {
    let engine = engine_over(vec![]).await;
    let future_asset = Asset::new("CORNZ", AssetKind::Future, Market::Cn);

    let err = engine
        .plan(&future_asset, DataType::Price, "cn", None)
        .await
        .unwrap_err();
    assert!(matches!(err, FedError::NoProviderAvailable { .. }));
}

#[tokio::test]
async fn s6_subscription_lifecycle() {
    let adapter: Arc<dyn ProviderAdapter> = Arc::new(MockAdapter::new("m"));
    let engine = engine_over(vec![adapter]).await;
    let manager = Arc::new(SubscriptionManager::new(engine, SubscriptionLimits::default()));

    let (connection_id, mut rx) = manager.connect().await;

    let ack = manager
        .subscribe(
            connection_id,
            SubscribeRequest {
                stream_type: StreamType::Price,
                symbols: vec!["AAPL".to_string(), "MSFT".to_string()],
                asset_kind: AssetKind::Equity,
                market: Market::Us,
                interval_ms: 100,
                data_type: DataType::Price,
                params: Map::new(),
            },
        )
        .await
        .unwrap();
    assert_eq!(ack.symbols.len(), 2);

    let first_data = next_data_message(&mut rx, Duration::from_secs(2))
        .await
        .expect("expected at least one data message within 2s");
    assert_eq!(first_data.subscription_id, ack.subscription_id);
    assert!(!first_data.data.is_empty());

    manager
        .unsubscribe(
            connection_id,
            UnsubscribeRequest {
                stream_type: StreamType::Price,
                symbols: Some(vec!["AAPL".to_string()]),
            },
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    if let Some(data) = next_data_message(&mut rx, Duration::from_secs(2)).await {
        for update in &data.data {
            let marketfeed_types::Update::Price(p) = update else {
                panic!("expected price updates on a price stream")
            };
            assert_ne!(p.symbol, "AAPL");
        }
    }

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

    manager.disconnect(connection_id).await;
}

async fn next_data_message(
    rx: &mut tokio::sync::mpsc::Receiver<OutboundMessage>,
    within: Duration,
) -> Option<marketfeed_types::StreamDataMessage> {
    let deadline = tokio::time::Instant::now() + within;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return None;
        }
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(OutboundMessage::Data(data))) => return Some(data),
            Ok(Some(_other)) => continue,
            Ok(None) | Err(_) => return None,
        }
    }
}
