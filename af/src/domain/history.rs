//! In-memory session history
//!
//! Completed workflow runs for the current session. Nothing is persisted and
//! failed runs are never recorded.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::Task;
use crate::pipeline::WorkflowResult;

/// One completed run
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// 1-based position in the session
    pub id: usize,
    pub task: Task,
    pub timestamp: DateTime<Utc>,
    pub result: WorkflowResult,
}

/// Append-only list of completed runs
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed run and return its id
    pub fn push(&mut self, task: Task, result: WorkflowResult) -> usize {
        let id = self.entries.len() + 1;
        debug!(%id, "History::push: called");
        self.entries.push(HistoryEntry {
            id,
            task,
            timestamp: Utc::now(),
            result,
        });
        id
    }

    pub fn get(&self, id: usize) -> Option<&HistoryEntry> {
        id.checked_sub(1).and_then(|idx| self.entries.get(idx))
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        debug!(count = self.entries.len(), "History::clear: called");
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::StageResult;
    use serde_json::Map;
    use std::time::Duration;
    use uuid::Uuid;

    fn result() -> WorkflowResult {
        let empty = || StageResult::from_map(Map::new());
        WorkflowResult::completed(Uuid::now_v7(), empty(), empty(), empty(), Duration::from_millis(1500))
    }

    #[test]
    fn test_ids_are_one_based_and_sequential() {
        let mut history = History::new();
        assert!(history.is_empty());
        assert!(history.latest().is_none());

        let first = history.push(Task::new("one", "").unwrap(), result());
        let second = history.push(Task::new("two", "ctx").unwrap(), result());

        assert_eq!((first, second), (1, 2));
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(1).unwrap().task.objective(), "one");
        assert_eq!(history.latest().unwrap().task.context(), "ctx");
        assert!(history.get(0).is_none());
        assert!(history.get(3).is_none());
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.push(Task::new("one", "").unwrap(), result());
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.push(Task::new("again", "").unwrap(), result()), 1);
    }
}
