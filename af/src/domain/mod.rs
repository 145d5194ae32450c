//! Domain types: the task a run works on and the session history of runs

mod history;
mod task;

pub use history::{History, HistoryEntry};
pub use task::{Task, TaskError};
