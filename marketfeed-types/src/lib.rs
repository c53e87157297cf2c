//! marketfeed-types
//!
//! Shared value types, configuration records, and the unified error type for
//! the marketfeed federation ecosystem.
//!
//! - `asset`: the subject of a query (`Asset`, `AssetKind`, `Market`).
//! - `data_type`: the closed `DataType` enumeration and capability bitflags.
//! - `response`: `ProviderResponse`, the one shape every adapter returns.
//! - `health`, `score`, `plan`: provider health/scoring/plan value types.
//! - `config`: static adapter/engine/subscription configuration records.
//! - `error`: `FedError`, the unified error type shared by every component.
//! - `wire`: the subscription protocol's client/server message shapes.
#![warn(missing_docs)]

mod asset;
mod config;
mod data_type;
mod error;
mod health;
mod plan;
mod response;
mod score;
mod wire;

pub use asset::{Asset, AssetKind, Market};
pub use config::{AdapterConfig, EngineConfig, SubscriptionLimits};
pub use data_type::{DataType, DataTypeSet};
pub use error::FedError;
pub use health::ProviderHealth;
pub use plan::{ArbitrationPlan, MergeStrategy};
pub use response::ProviderResponse;
pub use score::ProviderScore;
pub use wire::{
    HeartbeatMessage, OhlcvUpdate, PriceUpdate, QuoteUpdate, StreamDataMessage, StreamType,
    SubscribeRequest, SubscriptionAck, TradeUpdate, UnsubscribeRequest, Update, WsErrorMessage,
};
