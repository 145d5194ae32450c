//! Workflow result

use std::time::Duration;

use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::agent::{Stage, StageResult};

/// Terminal status of a run
///
/// Only completed runs produce a result; a failed run produces an error instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Completed,
}

/// The three stage results of one run plus its wall-clock duration
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub id: Uuid,
    pub status: WorkflowStatus,
    #[serde(rename = "research_results")]
    pub research: StageResult,
    #[serde(rename = "planning_results")]
    pub planning: StageResult,
    #[serde(rename = "execution_results")]
    pub execution: StageResult,
    /// Serialized as fractional seconds
    #[serde(serialize_with = "serialize_secs")]
    pub total_duration: Duration,
}

impl WorkflowResult {
    pub fn completed(
        id: Uuid,
        research: StageResult,
        planning: StageResult,
        execution: StageResult,
        total_duration: Duration,
    ) -> Self {
        Self {
            id,
            status: WorkflowStatus::Completed,
            research,
            planning,
            execution,
            total_duration,
        }
    }

    pub fn stage(&self, stage: Stage) -> &StageResult {
        match stage {
            Stage::Research => &self.research,
            Stage::Planning => &self.planning,
            Stage::Execution => &self.execution,
        }
    }

    /// Stages whose model reply could not be parsed
    pub fn unparsed_stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| !self.stage(*stage).is_parsed())
            .collect()
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
