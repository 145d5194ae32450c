//! Fixed inputs for the stage self-checks

use serde_json::{Value, json};

use super::{Stage, StageResult};
use crate::domain::{Task, TaskError};

const RESEARCH_CHECK_TASK: &str = "Create a simple to-do list application";
const DOWNSTREAM_CHECK_TASK: &str = "Create a web app";

/// Task the given stage's self-check runs against
pub fn task(stage: Stage) -> Result<Task, TaskError> {
    let objective = match stage {
        Stage::Research => RESEARCH_CHECK_TASK,
        Stage::Planning | Stage::Execution => DOWNSTREAM_CHECK_TASK,
    };
    Task::new(objective, "")
}

/// Research result fed to the planning self-check
pub fn research_for_planning() -> StageResult {
    fixture(json!({
        "task_analysis": {
            "main_objective": "Create a simple web application",
            "key_domains": ["Frontend", "Backend", "Database"],
            "complexity_level": "medium"
        },
        "research_questions": [
            {"question": "What framework to use?", "priority": "high"},
            {"question": "How to structure the database?", "priority": "medium"}
        ],
        "research_areas": [
            {"area": "Technology Stack", "description": "Choose appropriate technologies"}
        ]
    }))
}

/// Research result fed to the execution self-check
pub fn research_for_execution() -> StageResult {
    fixture(json!({
        "task_analysis": {
            "main_objective": "Create a simple web application",
            "key_domains": ["Frontend", "Backend"]
        },
        "research_questions": [
            {"question": "What framework to use?", "priority": "high"}
        ],
        "research_areas": [
            {"area": "Technology Stack", "description": "Choose appropriate technologies"}
        ]
    }))
}

/// Planning result fed to the execution self-check
pub fn planning_for_execution() -> StageResult {
    fixture(json!({
        "execution_plan": {
            "overview": "Build a simple web app using modern frameworks",
            "total_estimated_effort": "medium"
        },
        "phases": [
            {"phase_number": 1, "phase_name": "Setup and Planning"}
        ],
        "detailed_steps": [
            {"title": "Choose technology stack", "description": "Select appropriate frameworks"}
        ]
    }))
}

fn fixture(value: Value) -> StageResult {
    match value {
        Value::Object(map) => StageResult::from_map(map),
        _ => StageResult::from_map(Default::default()),
    }
}
