//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Research stage system contract
pub const RESEARCH: &str = include_str!("../../prompts/research.pmt");

/// Research stage user prompt
pub const RESEARCH_TASK: &str = include_str!("../../prompts/research-task.pmt");

/// Planning stage system contract
pub const PLANNING: &str = include_str!("../../prompts/planning.pmt");

/// Planning stage user prompt
pub const PLANNING_TASK: &str = include_str!("../../prompts/planning-task.pmt");

/// Execution stage system contract
pub const EXECUTION: &str = include_str!("../../prompts/execution.pmt");

/// Execution stage user prompt
pub const EXECUTION_TASK: &str = include_str!("../../prompts/execution-task.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "research" => Some(RESEARCH),
        "research-task" => Some(RESEARCH_TASK),
        "planning" => Some(PLANNING),
        "planning-task" => Some(PLANNING_TASK),
        "execution" => Some(EXECUTION),
        "execution-task" => Some(EXECUTION_TASK),
        _ => None,
    };
    if found.is_none() {
        debug!("get_embedded: no match found");
    }
    found
}
