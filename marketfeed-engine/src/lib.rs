//! marketfeed-engine
//!
//! The arbitration engine: scoring, plan construction, fallback execution,
//! multi-source merging, and the subscription manager driving the streaming
//! protocol.
#![warn(missing_docs)]

mod engine;
mod execute;
mod merge;
mod planning;
mod scoring;
mod subscription;

pub use engine::ArbitrationEngine;
pub use execute::{dispatch, execute_with_fallback};
pub use merge::merge_multi_provider;
pub use planning::{arbitrate_request, merge_strategy_for};
pub use scoring::{rank_and_filter, score};
pub use subscription::{OutboundMessage, Subscription, SubscriptionManager};
