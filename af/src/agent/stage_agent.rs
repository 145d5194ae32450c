//! Stage agent
//!
//! One type serves all three stages; the [`Stage`] decides the system
//! contract, the user prompt template, the upstream digests and the sampling
//! temperature.

use std::sync::Arc;

use chrono::Utc;
use eyre::Result;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use super::{Stage, StageError, StageResult, canned, summarize};
use crate::config::StageSettings;
use crate::domain::Task;
use crate::generation::{GenerationOptions, GenerationService, ResponseFormat};
use crate::prompts::{PromptLoader, StagePromptContext};

/// Results of the stages that ran before this one
#[derive(Debug, Clone, Copy, Default)]
pub struct Upstream<'a> {
    pub research: Option<&'a StageResult>,
    pub planning: Option<&'a StageResult>,
}

impl<'a> Upstream<'a> {
    /// Nothing upstream (research stage)
    pub fn none() -> Self {
        Self::default()
    }

    /// Research only (planning stage)
    pub fn research(research: &'a StageResult) -> Self {
        Self {
            research: Some(research),
            planning: None,
        }
    }

    /// Research and planning (execution stage)
    pub fn research_and_planning(research: &'a StageResult, planning: &'a StageResult) -> Self {
        Self {
            research: Some(research),
            planning: Some(planning),
        }
    }
}

/// Digests built for one stage invocation
#[derive(Debug, Clone, Default, PartialEq)]
struct Digests {
    research: Option<String>,
    planning: Option<String>,
}

/// Runs one pipeline stage against the shared generation service
pub struct StageAgent {
    stage: Stage,
    /// Loaded once; constant for the agent's lifetime
    system_contract: String,
    settings: StageSettings,
    prompts: Arc<PromptLoader>,
    generation: Arc<GenerationService>,
}

impl StageAgent {
    /// Create an agent, loading the stage's system contract
    pub fn new(
        stage: Stage,
        generation: Arc<GenerationService>,
        prompts: Arc<PromptLoader>,
        settings: StageSettings,
    ) -> Result<Self> {
        debug!(%stage, temperature = settings.temperature, "StageAgent::new: called");
        let system_contract = prompts.system_contract(stage)?;
        Ok(Self {
            stage,
            system_contract,
            settings,
            prompts,
            generation,
        })
    }

    /// Agent using embedded prompts and the stage's default settings
    pub fn with_defaults(stage: Stage, generation: Arc<GenerationService>) -> Result<Self> {
        Self::new(
            stage,
            generation,
            Arc::new(PromptLoader::embedded_only()),
            StageSettings::for_stage(stage),
        )
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn system_contract(&self) -> &str {
        &self.system_contract
    }

    pub fn settings(&self) -> &StageSettings {
        &self.settings
    }

    /// Run the stage for a task
    ///
    /// Any failure (missing upstream input, prompt rendering, generation) is
    /// reported as a [`StageError`] for this stage; a partial result is never
    /// returned. Unparseable model output is not a failure.
    pub async fn process(&self, task: &Task, upstream: &Upstream<'_>) -> Result<StageResult, StageError> {
        info!(stage = %self.stage, task = %task.objective(), "{} processing task", self.stage.agent_name());

        match self.run(task, upstream).await {
            Ok(result) => {
                info!(stage = %self.stage, parsed = result.is_parsed(), "{} completed", self.stage.agent_name());
                Ok(result)
            }
            Err(e) => {
                error!(stage = %self.stage, error = %e, "{} failed", self.stage.agent_name());
                Err(e)
            }
        }
    }

    async fn run(&self, task: &Task, upstream: &Upstream<'_>) -> Result<StageResult, StageError> {
        let digests = self.digests(upstream)?;

        let mut context = StagePromptContext::new(task.objective(), task.context());
        if let Some(summary) = &digests.research {
            context = context.with_research_summary(summary.clone());
        }
        if let Some(summary) = &digests.planning {
            context = context.with_planning_summary(summary.clone());
        }

        let prompt = self
            .prompts
            .render_task(self.stage, &context)
            .map_err(|e| StageError::new(self.stage, e))?;
        debug!(stage = %self.stage, prompt_len = prompt.len(), "run: prompt rendered");

        let options = GenerationOptions::default()
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        let output = self
            .generation
            .generate_structured(&prompt, &self.system_contract, &ResponseFormat::Json, options)
            .await
            .map_err(|e| StageError::new(self.stage, e))?;

        Ok(StageResult::from_output(output, self.metadata(task, digests)))
    }

    fn digests(&self, upstream: &Upstream<'_>) -> Result<Digests, StageError> {
        debug!(stage = %self.stage, "digests: called");
        let research = || {
            upstream
                .research
                .ok_or_else(|| StageError::new(self.stage, "research results are required"))
        };
        let planning = || {
            upstream
                .planning
                .ok_or_else(|| StageError::new(self.stage, "planning results are required"))
        };

        match self.stage {
            Stage::Research => Ok(Digests::default()),
            Stage::Planning => Ok(Digests {
                research: Some(summarize::research_for_planning(research()?.data())),
                planning: None,
            }),
            Stage::Execution => Ok(Digests {
                research: Some(summarize::research_for_execution(research()?.data())),
                planning: Some(summarize::planning_for_execution(planning()?.data())),
            }),
        }
    }

    fn metadata(&self, task: &Task, digests: Digests) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("agent".to_string(), Value::from(self.stage.agent_name()));
        metadata.insert("task".to_string(), Value::from(task.objective()));
        if self.stage == Stage::Research {
            metadata.insert("context".to_string(), Value::from(task.context()));
        }
        if let Some(summary) = digests.research {
            metadata.insert("research_summary".to_string(), Value::from(summary));
        }
        if let Some(summary) = digests.planning {
            metadata.insert("planning_summary".to_string(), Value::from(summary));
        }
        metadata.insert("timestamp".to_string(), Value::from(Utc::now().to_rfc3339()));
        metadata
    }

    /// Smoke-test the stage against a fixed input
    ///
    /// True when the reply carries the stage's required top-level keys. Says
    /// nothing about the quality of the content.
    pub async fn validate(&self) -> bool {
        debug!(stage = %self.stage, "validate: called");
        let task = match canned::task(self.stage) {
            Ok(task) => task,
            Err(e) => {
                error!(stage = %self.stage, error = %e, "validate: bad canned task");
                return false;
            }
        };

        let research;
        let planning;
        let upstream = match self.stage {
            Stage::Research => Upstream::none(),
            Stage::Planning => {
                research = canned::research_for_planning();
                Upstream::research(&research)
            }
            Stage::Execution => {
                research = canned::research_for_execution();
                planning = canned::planning_for_execution();
                Upstream::research_and_planning(&research, &planning)
            }
        };

        match self.process(&task, &upstream).await {
            Ok(result) => {
                let missing: Vec<&str> = self
                    .stage
                    .required_keys()
                    .iter()
                    .copied()
                    .filter(|key| !result.contains_key(key))
                    .collect();
                if missing.is_empty() {
                    info!(stage = %self.stage, "{} validation passed", self.stage.agent_name());
                    true
                } else {
                    error!(stage = %self.stage, ?missing, "{} validation failed", self.stage.agent_name());
                    false
                }
            }
            Err(e) => {
                error!(stage = %self.stage, error = %e, "{} validation failed", self.stage.agent_name());
                false
            }
        }
    }
}
