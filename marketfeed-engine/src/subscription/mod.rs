//! The subscription manager and its supporting types.

mod manager;
mod project;
mod types;

pub use manager::SubscriptionManager;
pub use types::{OutboundMessage, Subscription};
