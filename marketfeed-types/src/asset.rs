//! The subject of a query.

use serde::{Deserialize, Serialize};

/// Broad classification of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// A publicly traded equity.
    Equity,
    /// A cryptocurrency.
    Crypto,
    /// A foreign-exchange pair.
    Forex,
    /// A physical commodity.
    Commodity,
    /// A market index.
    Index,
    /// An exchange-traded fund.
    Etf,
    /// An options contract.
    Option,
    /// A futures contract.
    Future,
}

/// Region tag used for latency scoring and provider eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    /// United States.
    Us,
    /// United Kingdom.
    Uk,
    /// European Union.
    Eu,
    /// Japan.
    Jp,
    /// China.
    Cn,
    /// Hong Kong.
    Hk,
    /// Crypto markets trade continuously with no single region.
    Crypto,
    /// No region restriction.
    Global,
}

/// The subject of a query: a single asset identified by symbol, kind, and market.
///
/// `symbol` is always normalized to upper case on construction; this is the one
/// invariant every caller may rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    /// Upper-case, trimmed ticker or pair symbol.
    pub symbol: String,
    /// Broad asset classification.
    pub kind: AssetKind,
    /// Region tag.
    pub market: Market,
    /// Listing exchange, if known.
    pub exchange: Option<String>,
    /// Quote/base pair notation, for forex and crypto assets.
    pub pair: Option<String>,
    /// Settlement or quote currency.
    pub currency: Option<String>,
    /// Human-readable name.
    pub name: Option<String>,
}

impl Asset {
    /// Build a new asset, normalizing `symbol` to trimmed upper case.
    pub fn new(symbol: impl AsRef<str>, kind: AssetKind, market: Market) -> Self {
        Self {
            symbol: normalize_symbol(symbol.as_ref()),
            kind,
            market,
            exchange: None,
            pair: None,
            currency: None,
            name: None,
        }
    }

    /// Attach a listing exchange.
    #[must_use]
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Attach a pair notation.
    #[must_use]
    pub fn with_pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = Some(pair.into());
        self
    }

    /// Attach a settlement currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Attach a human-readable name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_is_normalized_to_upper_case() {
        let a = Asset::new("aapl", AssetKind::Equity, Market::Us);
        assert_eq!(a.symbol, "AAPL");
    }

    #[test]
    fn symbol_is_trimmed() {
        let a = Asset::new("  msft  ", AssetKind::Equity, Market::Us);
        assert_eq!(a.symbol, "MSFT");
    }

    #[test]
    fn already_upper_case_is_left_alone() {
        let a = Asset::new("BTC", AssetKind::Crypto, Market::Crypto);
        assert_eq!(a.symbol, "BTC");
    }
}
