//! Workflow pipeline: the orchestrator and the result it produces

mod orchestrator;
mod result;

pub use orchestrator::Orchestrator;
pub use result::{WorkflowResult, WorkflowStatus};
