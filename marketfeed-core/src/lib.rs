//! marketfeed-core
//!
//! The uniform provider adapter contract, the per-adapter shared state it is
//! built on, the registry that selects adapters for a request, and the
//! cancellation primitives the subscription layer uses to stop long-lived
//! tasks.
#![warn(missing_docs)]

mod adapter;
mod registry;
mod state;
mod stream;

pub use adapter::ProviderAdapter;
pub use registry::ProviderRegistry;
pub use state::AdapterState;
pub use stream::{Abortable, StreamHandle, Stoppable};
