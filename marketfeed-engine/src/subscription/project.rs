//! Project a `ProviderResponse` into one of the four wire update shapes.

use marketfeed_types::{
    OhlcvUpdate, PriceUpdate, ProviderResponse, QuoteUpdate, StreamType, TradeUpdate, Update,
};

/// Build the `Update` a stream tick emits for `symbol`, or `None` if the
/// response is missing a field its shape requires (the tick is skipped for
/// this symbol rather than failing the whole batch).
#[must_use]
pub fn project(stream_type: StreamType, symbol: &str, response: &ProviderResponse) -> Option<Update> {
    match stream_type {
        StreamType::Price | StreamType::MultiAsset => project_price(symbol, response).map(Update::Price),
        StreamType::Ohlcv => project_ohlcv(symbol, response).map(Update::Ohlcv),
        StreamType::Quote => project_quote(symbol, response).map(Update::Quote),
        StreamType::Trades => project_trade(symbol, response).map(Update::Trade),
    }
}

fn project_price(symbol: &str, response: &ProviderResponse) -> Option<PriceUpdate> {
    Some(PriceUpdate {
        symbol: symbol.to_string(),
        price: response.number_field("price")?,
        change: response.number_field("change").unwrap_or(0.0),
        change_percent: response.number_field("change_percent").unwrap_or(0.0),
        volume: response.number_field("volume"),
        timestamp: response.timestamp,
        provider: response.provider.clone(),
        confidence: response.confidence,
    })
}

fn project_ohlcv(symbol: &str, response: &ProviderResponse) -> Option<OhlcvUpdate> {
    let candle = response.data.get("candles")?.as_array()?.first()?;
    let timestamp = candle
        .get("timestamp")
        .and_then(|v| v.as_str())
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or(response.timestamp);
    Some(OhlcvUpdate {
        symbol: symbol.to_string(),
        timestamp,
        open: candle.get("open")?.as_f64()?,
        high: candle.get("high")?.as_f64()?,
        low: candle.get("low")?.as_f64()?,
        close: candle.get("close")?.as_f64()?,
        volume: candle.get("volume")?.as_f64()?,
        is_closed: true,
    })
}

/// Best-effort: most adapters in this ecosystem report a single last price
/// rather than a two-sided book, so an adapter response without explicit
/// `bid`/`ask` fields collapses to a zero-spread quote at that price.
fn project_quote(symbol: &str, response: &ProviderResponse) -> Option<QuoteUpdate> {
    let price = response.number_field("price")?;
    let bid = response.number_field("bid").unwrap_or(price);
    let ask = response.number_field("ask").unwrap_or(price);
    Some(QuoteUpdate {
        symbol: symbol.to_string(),
        bid,
        ask,
        bid_size: response.number_field("bid_size"),
        ask_size: response.number_field("ask_size"),
        spread: ask - bid,
        timestamp: response.timestamp,
    })
}

fn project_trade(symbol: &str, response: &ProviderResponse) -> Option<TradeUpdate> {
    Some(TradeUpdate {
        symbol: symbol.to_string(),
        price: response.number_field("price")?,
        quantity: response.number_field("volume").unwrap_or(0.0),
        timestamp: response.timestamp,
        trade_id: None,
        side: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use marketfeed_types::{Asset, AssetKind, DataType, Market};
    use serde_json::{json, Map};

    fn price_response(price: f64) -> ProviderResponse {
        let mut data = Map::new();
        data.insert("price".to_string(), json!(price));
        data.insert("change".to_string(), json!(-1.0));
        data.insert("change_percent".to_string(), json!(-0.5));
        ProviderResponse::new(
            "m",
            Asset::new("AAPL", AssetKind::Equity, Market::Us),
            DataType::Price,
            data,
            Utc::now(),
        )
    }

    #[test]
    fn price_stream_projects_a_price_update() {
        let update = project(StreamType::Price, "AAPL", &price_response(150.0)).unwrap();
        assert!(matches!(update, Update::Price(p) if p.price == 150.0));
    }

    #[test]
    fn quote_stream_falls_back_to_zero_spread_at_last_price() {
        let update = project(StreamType::Quote, "AAPL", &price_response(150.0)).unwrap();
        let Update::Quote(q) = update else { panic!("expected quote update") };
        assert_eq!(q.bid, 150.0);
        assert_eq!(q.ask, 150.0);
        assert_eq!(q.spread, 0.0);
    }

    #[test]
    fn ohlcv_stream_returns_none_without_a_candles_field() {
        assert!(project(StreamType::Ohlcv, "AAPL", &price_response(150.0)).is_none());
    }
}
