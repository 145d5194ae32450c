//! Progress events
//!
//! The orchestrator reports stage progress on a broadcast bus. Emitting is
//! fire-and-forget; a run behaves the same whether anyone listens or not.

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter};
pub use types::PipelineEvent;
