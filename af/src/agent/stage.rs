//! Pipeline stages

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One of the three pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Research,
    Planning,
    Execution,
}

impl Stage {
    /// All stages in the order the pipeline runs them
    pub const ALL: [Stage; 3] = [Stage::Research, Stage::Planning, Stage::Execution];

    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Planning => "planning",
            Self::Execution => "execution",
        }
    }

    /// Agent identifier recorded in metadata and error messages
    pub fn agent_name(&self) -> &'static str {
        match self {
            Self::Research => "Research Agent",
            Self::Planning => "Planning Agent",
            Self::Execution => "Execution Agent",
        }
    }

    /// Template holding the stage's system contract
    pub fn system_template(&self) -> &'static str {
        self.name()
    }

    /// Template for the per-run user prompt
    pub fn task_template(&self) -> &'static str {
        match self {
            Self::Research => "research-task",
            Self::Planning => "planning-task",
            Self::Execution => "execution-task",
        }
    }

    /// Top-level keys the stage's contract asks the model for
    ///
    /// Advisory only; consumers treat all of them as optional.
    pub fn expected_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Research => &["task_analysis", "research_questions", "research_areas", "success_criteria"],
            Self::Planning => &[
                "execution_plan",
                "phases",
                "detailed_steps",
                "risk_assessment",
                "resource_requirements",
            ],
            Self::Execution => &[
                "executive_summary",
                "deliverables",
                "implementation_guide",
                "code_templates",
                "quality_assurance",
                "next_steps",
            ],
        }
    }

    /// Keys the self-check requires
    pub fn required_keys(&self) -> &'static [&'static str] {
        &self.expected_keys()[..3]
    }

    /// Sampling temperature: research is the most deterministic, execution the least
    pub fn default_temperature(&self) -> f32 {
        match self {
            Self::Research => 0.3,
            Self::Planning => 0.4,
            Self::Execution => 0.5,
        }
    }

    /// Stage that runs after this one
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::Research => Some(Self::Planning),
            Self::Planning => Some(Self::Execution),
            Self::Execution => None,
        }
    }

    /// 1-based position in the pipeline
    pub fn position(&self) -> usize {
        match self {
            Self::Research => 1,
            Self::Planning => 2,
            Self::Execution => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "Stage::from_str: called");
        match s.trim().to_lowercase().as_str() {
            "research" => Ok(Self::Research),
            "planning" | "plan" => Ok(Self::Planning),
            "execution" | "execute" => Ok(Self::Execution),
            other => Err(format!(
                "Unknown stage: '{}'. Valid stages: research, planning, execution",
                other
            )),
        }
    }
}
