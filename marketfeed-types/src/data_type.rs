//! The closed enumeration of answerable data shapes, and the bitflag set
//! adapters use to declare which of them they can ever answer.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// The shape of data a `ProviderResponse` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// A single current price observation.
    Price,
    /// OHLCV candlestick series.
    Ohlcv,
    /// Fundamental company data.
    Fundamentals,
    /// Derived technical indicators.
    Technical,
    /// Aggregate sentiment score.
    Sentiment,
    /// News articles.
    News,
    /// Macroeconomic series.
    Macro,
    /// Cross-asset correlation.
    Correlation,
    /// Risk metrics.
    Risk,
}

impl DataType {
    /// Stable kebab-case identifier, used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Ohlcv => "ohlcv",
            Self::Fundamentals => "fundamentals",
            Self::Technical => "technical",
            Self::Sentiment => "sentiment",
            Self::News => "news",
            Self::Macro => "macro",
            Self::Correlation => "correlation",
            Self::Risk => "risk",
        }
    }

    /// This data type's single bit within a `DataTypeSet`.
    #[must_use]
    pub const fn as_flag(self) -> DataTypeSet {
        match self {
            Self::Price => DataTypeSet::PRICE,
            Self::Ohlcv => DataTypeSet::OHLCV,
            Self::Fundamentals => DataTypeSet::FUNDAMENTALS,
            Self::Technical => DataTypeSet::TECHNICAL,
            Self::Sentiment => DataTypeSet::SENTIMENT,
            Self::News => DataTypeSet::NEWS,
            Self::Macro => DataTypeSet::MACRO,
            Self::Correlation => DataTypeSet::CORRELATION,
            Self::Risk => DataTypeSet::RISK,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// The static set of `DataType`s an adapter can ever answer.
    ///
    /// Returned by `ProviderAdapter::capabilities()`; the registry intersects
    /// this with `supports_asset` to build the candidate set for a request
    /// (see `marketfeed-core::registry`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DataTypeSet: u16 {
        /// See [`DataType::Price`].
        const PRICE = 1 << 0;
        /// See [`DataType::Ohlcv`].
        const OHLCV = 1 << 1;
        /// See [`DataType::Fundamentals`].
        const FUNDAMENTALS = 1 << 2;
        /// See [`DataType::Technical`].
        const TECHNICAL = 1 << 3;
        /// See [`DataType::Sentiment`].
        const SENTIMENT = 1 << 4;
        /// See [`DataType::News`].
        const NEWS = 1 << 5;
        /// See [`DataType::Macro`].
        const MACRO = 1 << 6;
        /// See [`DataType::Correlation`].
        const CORRELATION = 1 << 7;
        /// See [`DataType::Risk`].
        const RISK = 1 << 8;
    }
}

impl DataTypeSet {
    /// Whether this set includes `data_type`.
    #[must_use]
    pub const fn supports(self, data_type: DataType) -> bool {
        self.contains(data_type.as_flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_supports_checks_membership() {
        let set = DataTypeSet::PRICE | DataTypeSet::NEWS;
        assert!(set.supports(DataType::Price));
        assert!(set.supports(DataType::News));
        assert!(!set.supports(DataType::Ohlcv));
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(DataType::Sentiment.to_string(), "sentiment");
    }
}
