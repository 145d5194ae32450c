//! Stage agents
//!
//! The three pipeline stages share one agent type. Each stage owns a fixed
//! system contract, builds its user prompt from the task and digests of the
//! upstream results, and returns advisory JSON with producer metadata.

pub mod canned;
mod error;
mod result;
mod stage;
mod stage_agent;
pub mod summarize;

pub use error::StageError;
pub use result::{METADATA_KEY, StageResult};
pub use stage::Stage;
pub use stage_agent::{StageAgent, Upstream};
