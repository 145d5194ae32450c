//! Event types for pipeline progress

use serde::{Deserialize, Serialize};

use crate::agent::Stage;

/// Observable activity of one workflow run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// A run has started
    WorkflowStarted { run_id: String, task: String },
    /// A stage has started
    StageStarted {
        run_id: String,
        stage: Stage,
        /// 1-based
        position: usize,
        total: usize,
    },
    /// A stage has produced its result
    StageCompleted {
        run_id: String,
        stage: Stage,
        elapsed_ms: u64,
        /// Whether the model's reply parsed as JSON
        parsed: bool,
    },
    /// A stage failed; the run ends here
    StageFailed { run_id: String, stage: Stage, error: String },
    /// All stages completed
    WorkflowCompleted { run_id: String, total_duration_ms: u64 },
}

impl PipelineEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::WorkflowStarted { .. } => "WorkflowStarted",
            Self::StageStarted { .. } => "StageStarted",
            Self::StageCompleted { .. } => "StageCompleted",
            Self::StageFailed { .. } => "StageFailed",
            Self::WorkflowCompleted { .. } => "WorkflowCompleted",
        }
    }

    pub fn run_id(&self) -> &str {
        match self {
            Self::WorkflowStarted { run_id, .. }
            | Self::StageStarted { run_id, .. }
            | Self::StageCompleted { run_id, .. }
            | Self::StageFailed { run_id, .. }
            | Self::WorkflowCompleted { run_id, .. } => run_id,
        }
    }

    /// Whether this event ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StageFailed { .. } | Self::WorkflowCompleted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let event = PipelineEvent::StageCompleted {
            run_id: "r1".to_string(),
            stage: Stage::Planning,
            elapsed_ms: 1200,
            parsed: true,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StageCompleted");
        assert_eq!(json["stage"], "planning");
        assert_eq!(event.run_id(), "r1");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_terminal_events() {
        let failed = PipelineEvent::StageFailed {
            run_id: "r1".to_string(),
            stage: Stage::Research,
            error: "boom".to_string(),
        };
        let done = PipelineEvent::WorkflowCompleted {
            run_id: "r1".to_string(),
            total_duration_ms: 10,
        };
        assert!(failed.is_terminal());
        assert!(done.is_terminal());
        assert_eq!(done.event_type(), "WorkflowCompleted");
    }
}
