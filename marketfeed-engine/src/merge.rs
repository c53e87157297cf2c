//! Multi-source response merging.

use std::collections::HashSet;

use chrono::Utc;
use marketfeed_types::{DataType, FedError, ProviderResponse};
use serde_json::{json, Map, Value};

use crate::planning::merge_strategy_for;

const MERGED_PROVIDER_NAME: &str = "arbitration_engine";
/// Confidence assigned to a `take_most_recent` merge (fundamentals and the
/// data types that share its strategy).
const TAKE_MOST_RECENT_CONFIDENCE: f64 = 0.90;

/// Combine `responses` for `data_type` into a single response.
///
/// Zero responses is a programmer error: callers only reach this function
/// with the set of successful responses for one data type, which is never
/// empty by construction. A single response is returned unchanged (merge
/// identity).
///
/// # Errors
/// Returns an error if `responses` is empty, or if a response for a
/// `weighted_average` data type is missing the numeric field it merges over.
pub fn merge_multi_provider(
    responses: Vec<ProviderResponse>,
    data_type: DataType,
) -> Result<ProviderResponse, FedError> {
    if responses.is_empty() {
        return Err(FedError::Other(
            "merge_multi_provider called with zero responses".to_string(),
        ));
    }
    if responses.len() == 1 {
        return Ok(responses.into_iter().next().expect("len checked above"));
    }

    let asset = responses[0].asset.clone();
    let (data, confidence) = match data_type {
        DataType::Price => weighted_average_merge(&responses, "price")?,
        DataType::Sentiment => weighted_average_merge(&responses, "score")?,
        DataType::Ohlcv => (merge_ohlcv(&responses), 1.0),
        DataType::News => (merge_news(&responses), 1.0),
        DataType::Fundamentals
        | DataType::Technical
        | DataType::Macro
        | DataType::Correlation
        | DataType::Risk => (merge_take_most_recent(&responses), TAKE_MOST_RECENT_CONFIDENCE),
    };

    let mut metadata = Map::new();
    metadata.insert(
        "merge_strategy".to_string(),
        json!(merge_strategy_for(data_type)),
    );
    metadata.insert(
        "sources".to_string(),
        json!(responses.iter().map(|r| r.provider.clone()).collect::<Vec<_>>()),
    );

    Ok(ProviderResponse {
        provider: MERGED_PROVIDER_NAME.to_string(),
        asset,
        data_type,
        data,
        timestamp: Utc::now(),
        is_valid: true,
        is_fresh: true,
        confidence,
        metadata,
    })
}

/// Confidence-weighted mean over `value_field` across `responses` (price and
/// sentiment). Returns the merged data map and the output confidence.
fn weighted_average_merge(
    responses: &[ProviderResponse],
    value_field: &str,
) -> Result<(Map<String, Value>, f64), FedError> {
    let mut values = Vec::with_capacity(responses.len());
    let mut sources = Vec::with_capacity(responses.len());
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for r in responses {
        let value = r.number_field(value_field).ok_or_else(|| FedError::Protocol {
            provider: r.provider.clone(),
            message: format!("response missing numeric field `{value_field}`"),
        })?;
        weighted_sum += value * r.confidence;
        weight_sum += r.confidence;
        values.push(value);
        sources.push(r.provider.clone());
    }

    let mean = if weight_sum > 0.0 {
        weighted_sum / weight_sum
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    };

    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let stddev = variance.sqrt();
    let confidence = if stddev == 0.0 {
        1.0
    } else if mean.abs() > f64::EPSILON {
        1.0 / (1.0 + stddev / mean.abs())
    } else {
        0.0
    };

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut data = Map::new();
    data.insert(value_field.to_string(), json!(mean));
    data.insert("sources".to_string(), json!(sources));
    data.insert("source_count".to_string(), json!(values.len()));
    data.insert(format!("{value_field}_range"), json!({ "min": min, "max": max }));

    Ok((data, confidence))
}

/// Concatenate every source's `candles` array, preserving per-source
/// provenance (ohlcv). Concatenates rather than deduplicating by timestamp;
/// see `DESIGN.md` for why.
fn merge_ohlcv(responses: &[ProviderResponse]) -> Map<String, Value> {
    let mut candles = Vec::new();
    for r in responses {
        if let Some(Value::Array(arr)) = r.data.get("candles") {
            candles.extend(arr.iter().cloned());
        }
    }
    let mut data = Map::new();
    data.insert("candles".to_string(), Value::Array(candles));
    data.insert(
        "sources".to_string(),
        json!(responses.iter().map(|r| r.provider.clone()).collect::<Vec<_>>()),
    );
    data
}

/// Sort by timestamp descending; for each key across the union of every
/// response's `data` map, adopt the value from the first response (in that
/// order) whose value is non-null (fundamentals and "everything else").
///
/// Order-sensitive by construction: callers must pass `responses` in the
/// order they want ties among equally-recent responses broken.
fn merge_take_most_recent(responses: &[ProviderResponse]) -> Map<String, Value> {
    let mut by_recency: Vec<&ProviderResponse> = responses.iter().collect();
    by_recency.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut keys = Vec::new();
    for r in &by_recency {
        for key in r.data.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }

    let mut data = Map::new();
    for key in keys {
        for r in &by_recency {
            if let Some(value) = r.data.get(&key) {
                if !value.is_null() {
                    data.insert(key, value.clone());
                    break;
                }
            }
        }
    }
    data
}

/// Union of `articles` arrays, de-duplicated by canonical `url`, preserving
/// first-occurrence order (news).
fn merge_news(responses: &[ProviderResponse]) -> Map<String, Value> {
    let mut seen_urls = HashSet::new();
    let mut articles = Vec::new();
    for r in responses {
        if let Some(Value::Array(arr)) = r.data.get("articles") {
            for article in arr {
                let url = article.get("url").and_then(Value::as_str).unwrap_or_default();
                if seen_urls.insert(url.to_string()) {
                    articles.push(article.clone());
                }
            }
        }
    }
    let mut data = Map::new();
    data.insert("articles".to_string(), Value::Array(articles));
    data.insert("source_count".to_string(), json!(responses.len()));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketfeed_types::{Asset, AssetKind, Market};
    use serde_json::Map as JMap;

    fn price_response(provider: &str, price: f64, confidence: f64) -> ProviderResponse {
        let mut data = JMap::new();
        data.insert("price".to_string(), json!(price));
        ProviderResponse {
            confidence,
            ..ProviderResponse::new(
                provider,
                Asset::new("AAPL", AssetKind::Equity, Market::Us),
                DataType::Price,
                data,
                Utc::now(),
            )
        }
    }

    #[test]
    fn merge_identity_returns_single_response_unchanged() {
        let resp = price_response("m", 150.0, 1.0);
        let merged = merge_multi_provider(vec![resp.clone()], DataType::Price).unwrap();
        assert_eq!(merged, resp);
    }

    #[test]
    fn price_merge_matches_scenario_s4() {
        let responses = vec![
            price_response("a", 100.0, 0.9),
            price_response("b", 100.5, 0.8),
            price_response("c", 101.0, 0.7),
        ];
        let merged = merge_multi_provider(responses, DataType::Price).unwrap();
        let price = merged.number_field("price").unwrap();
        assert!((price - 100.458_333_333_333_33).abs() < 1e-6);
        assert_eq!(merged.data.get("source_count"), Some(&json!(3)));
        assert_eq!(
            merged.data.get("price_range"),
            Some(&json!({ "min": 100.0, "max": 101.0 }))
        );
        assert_eq!(merged.provider, "arbitration_engine");
    }

    #[test]
    fn identical_prices_merge_to_full_confidence() {
        let responses = vec![
            price_response("a", 100.0, 0.5),
            price_response("b", 100.0, 0.9),
        ];
        let merged = merge_multi_provider(responses, DataType::Price).unwrap();
        assert_eq!(merged.number_field("price"), Some(100.0));
        assert!((merged.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fundamentals_merge_prefers_most_recent_non_null_value() {
        let mut older = JMap::new();
        older.insert("pe_ratio".to_string(), json!(12.0));
        older.insert("eps".to_string(), json!(Value::Null));
        let older_resp = ProviderResponse::new(
            "a",
            Asset::new("AAPL", AssetKind::Equity, Market::Us),
            DataType::Fundamentals,
            older,
            Utc::now() - chrono::Duration::hours(1),
        );

        let mut newer = JMap::new();
        newer.insert("pe_ratio".to_string(), json!(15.0));
        newer.insert("eps".to_string(), json!(4.5));
        let newer_resp = ProviderResponse::new(
            "b",
            Asset::new("AAPL", AssetKind::Equity, Market::Us),
            DataType::Fundamentals,
            newer,
            Utc::now(),
        );

        let merged =
            merge_multi_provider(vec![older_resp, newer_resp], DataType::Fundamentals).unwrap();
        assert_eq!(merged.number_field("pe_ratio"), Some(15.0));
        assert_eq!(merged.number_field("eps"), Some(4.5));
        assert!((merged.confidence - 0.90).abs() < 1e-9);
    }

    #[test]
    fn news_merge_dedupes_by_url_preserving_first_occurrence() {
        let mut a = JMap::new();
        a.insert(
            "articles".to_string(),
            json!([{"url": "https://x/1", "title": "first"}, {"url": "https://x/2", "title": "second"}]),
        );
        let resp_a = ProviderResponse::new(
            "a",
            Asset::new("AAPL", AssetKind::Equity, Market::Us),
            DataType::News,
            a,
            Utc::now(),
        );
        let mut b = JMap::new();
        b.insert(
            "articles".to_string(),
            json!([{"url": "https://x/1", "title": "duplicate"}, {"url": "https://x/3", "title": "third"}]),
        );
        let resp_b = ProviderResponse::new(
            "b",
            Asset::new("AAPL", AssetKind::Equity, Market::Us),
            DataType::News,
            b,
            Utc::now(),
        );

        let merged = merge_multi_provider(vec![resp_a, resp_b], DataType::News).unwrap();
        let Value::Array(articles) = merged.data.get("articles").unwrap() else {
            panic!("expected array");
        };
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0]["title"], json!("first"));
    }
}
