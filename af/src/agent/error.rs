//! Stage error type

use thiserror::Error;

use super::Stage;

/// A stage failed; the whole workflow run fails with it
///
/// Carries the stage and the original cause verbatim.
#[derive(Debug, Clone, Error)]
#[error("{} processing failed: {message}", .stage.agent_name())]
pub struct StageError {
    pub stage: Stage,
    pub message: String,
}

impl StageError {
    pub fn new(stage: Stage, cause: impl ToString) -> Self {
        Self {
            stage,
            message: cause.to_string(),
        }
    }
}
