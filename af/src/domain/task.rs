//! Task definition

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected task input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Task objective must not be empty")]
    EmptyObjective,
}

/// A free-text objective plus optional background
///
/// Validated on construction; immutable once handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    objective: String,
    context: String,
}

impl Task {
    /// Build a task, rejecting a blank objective
    pub fn new(objective: impl Into<String>, context: impl Into<String>) -> Result<Self, TaskError> {
        let objective = objective.into().trim().to_string();
        if objective.is_empty() {
            return Err(TaskError::EmptyObjective);
        }
        Ok(Self {
            objective,
            context: context.into().trim().to_string(),
        })
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    /// Background text; empty when none was given
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn has_context(&self) -> bool {
        !self.context.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_input() {
        let task = Task::new("  Build a CLI  ", "\tfor ops\n").unwrap();
        assert_eq!(task.objective(), "Build a CLI");
        assert_eq!(task.context(), "for ops");
        assert!(task.has_context());
    }

    #[test]
    fn test_empty_objective_rejected() {
        assert_eq!(Task::new("", ""), Err(TaskError::EmptyObjective));
        assert_eq!(Task::new("   \n", "context alone"), Err(TaskError::EmptyObjective));
    }

    #[test]
    fn test_context_optional() {
        let task = Task::new("Build a CLI", "").unwrap();
        assert!(!task.has_context());
    }
}
