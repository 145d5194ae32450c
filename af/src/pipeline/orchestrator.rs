//! Pipeline orchestrator
//!
//! Runs research, planning and execution strictly in order, threading each
//! stage's result into the next. A run is all-or-nothing: the first stage
//! failure ends it and no partial result is produced.

use std::sync::Arc;
use std::time::Instant;

use eyre::{Result, ensure};
use futures::future::join_all;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::WorkflowResult;
use crate::agent::{Stage, StageAgent, StageError, StageResult, Upstream};
use crate::config::Config;
use crate::domain::Task;
use crate::events::{EventBus, EventEmitter};
use crate::generation::GenerationService;
use crate::prompts::PromptLoader;

/// Sequential three-stage pipeline
pub struct Orchestrator {
    research: StageAgent,
    planning: StageAgent,
    execution: StageAgent,
    events: Option<EventBus>,
}

impl Orchestrator {
    /// Assemble a pipeline from one agent per stage
    pub fn new(research: StageAgent, planning: StageAgent, execution: StageAgent) -> Result<Self> {
        debug!("Orchestrator::new: called");
        ensure!(research.stage() == Stage::Research, "research slot holds the {} agent", research.stage());
        ensure!(planning.stage() == Stage::Planning, "planning slot holds the {} agent", planning.stage());
        ensure!(execution.stage() == Stage::Execution, "execution slot holds the {} agent", execution.stage());
        Ok(Self {
            research,
            planning,
            execution,
            events: None,
        })
    }

    /// Build all three agents over one shared generation service
    pub fn from_config(
        config: &Config,
        generation: Arc<GenerationService>,
        prompts: Arc<PromptLoader>,
    ) -> Result<Self> {
        debug!("Orchestrator::from_config: called");
        let build = |stage: Stage| {
            StageAgent::new(
                stage,
                Arc::clone(&generation),
                Arc::clone(&prompts),
                config.stages.get(stage).clone(),
            )
        };
        Self::new(build(Stage::Research)?, build(Stage::Planning)?, build(Stage::Execution)?)
    }

    /// Report progress of every run on the given bus
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn agent(&self, stage: Stage) -> &StageAgent {
        match stage {
            Stage::Research => &self.research,
            Stage::Planning => &self.planning,
            Stage::Execution => &self.execution,
        }
    }

    /// Run the whole pipeline for a task
    pub async fn run(&self, task: &Task) -> Result<WorkflowResult, StageError> {
        let id = Uuid::now_v7();
        info!(run_id = %id, task = %task.objective(), "Starting workflow");
        let emitter = self.events.as_ref().map(|bus| bus.emitter_for(id.to_string()));
        if let Some(emitter) = &emitter {
            emitter.workflow_started(task.objective());
        }

        let started = Instant::now();

        let research = self
            .run_stage(&self.research, task, Upstream::none(), emitter.as_ref())
            .await?;
        let planning = self
            .run_stage(&self.planning, task, Upstream::research(&research), emitter.as_ref())
            .await?;
        let execution = self
            .run_stage(
                &self.execution,
                task,
                Upstream::research_and_planning(&research, &planning),
                emitter.as_ref(),
            )
            .await?;

        let total_duration = started.elapsed();
        info!(run_id = %id, duration_secs = total_duration.as_secs_f64(), "Workflow completed");
        if let Some(emitter) = &emitter {
            emitter.workflow_completed(total_duration);
        }

        Ok(WorkflowResult::completed(id, research, planning, execution, total_duration))
    }

    async fn run_stage(
        &self,
        agent: &StageAgent,
        task: &Task,
        upstream: Upstream<'_>,
        emitter: Option<&EventEmitter>,
    ) -> Result<StageResult, StageError> {
        let stage = agent.stage();
        debug!(%stage, "run_stage: called");
        if let Some(emitter) = emitter {
            emitter.stage_started(stage);
        }

        let started = Instant::now();
        match agent.process(task, &upstream).await {
            Ok(result) => {
                if let Some(emitter) = emitter {
                    emitter.stage_completed(stage, started.elapsed(), result.is_parsed());
                }
                Ok(result)
            }
            Err(e) => {
                error!(%stage, error = %e, "Workflow failed");
                if let Some(emitter) = emitter {
                    emitter.stage_failed(stage, &e.to_string());
                }
                Err(e)
            }
        }
    }

    /// Run every agent's self-check concurrently
    pub async fn validate_agents(&self) -> Vec<(Stage, bool)> {
        debug!("validate_agents: called");
        let checks = Stage::ALL.map(|stage| async move { (stage, self.agent(stage).validate().await) });
        join_all(checks).await
    }
}
