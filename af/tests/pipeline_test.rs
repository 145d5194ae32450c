//! Integration tests for the AgentFlow pipeline
//!
//! These run the full research -> planning -> execution flow over a scripted
//! LLM client.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use agentflow::agent::Stage;
use agentflow::config::Config;
use agentflow::domain::{History, Task};
use agentflow::events::{EventBus, PipelineEvent};
use agentflow::generation::{GenerationService, JsonFieldExt};
use agentflow::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use agentflow::pipeline::Orchestrator;
use agentflow::prompts::PromptLoader;

const RESEARCH: &str = r#"```json
{
  "task_analysis": {
    "main_objective": "Build a to-do app",
    "complexity_level": "medium",
    "key_domains": ["web", "storage"],
    "estimated_scope": "small"
  },
  "research_questions": [
    {"question": "Which storage?", "category": "Technical", "priority": "high", "rationale": "Persistence"}
  ],
  "research_areas": [],
  "potential_challenges": [],
  "success_criteria": ["Tasks can be added"],
  "recommended_approach": "Start simple"
}
```"#;

const PLANNING: &str = r#"{
  "execution_plan": {"overview": "Two phases", "total_estimated_effort": "2 weeks", "key_milestones": ["MVP"]},
  "phases": [{"phase_number": 1, "phase_name": "Setup", "description": "Scaffold", "estimated_duration": "2 days"}],
  "detailed_steps": [{"step_number": 1, "title": "Init repo", "phase": "Setup"}]
}"#;

const EXECUTION: &str = r#"{
  "executive_summary": {"problem_statement": "Track tasks", "key_insights": ["Keep it small"]},
  "deliverables": [{"title": "Schema", "type": "document", "content": "tasks(id, title)"}],
  "next_steps": [{"action": "Ship", "timeline": "Friday", "owner": "Team"}]
}"#;

/// Replays scripted replies and records prompts
struct ScriptedClient {
    replies: Vec<Result<String, u16>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<&str, u16>>) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.into_iter().map(|r| r.map(String::from)).collect(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut prompts = self.prompts.lock().unwrap();
        let idx = prompts.len();
        prompts.push(request.messages[0].content.clone());
        match self.replies.get(idx) {
            Some(Ok(text)) => Ok(CompletionResponse::text(text.clone())),
            Some(Err(status)) => Err(LlmError::ApiError {
                status: *status,
                message: "scripted failure".to_string(),
            }),
            None => Err(LlmError::InvalidResponse("script exhausted".to_string())),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn orchestrator(client: Arc<ScriptedClient>) -> Orchestrator {
    let generation = Arc::new(GenerationService::new(client));
    Orchestrator::from_config(&Config::default(), generation, Arc::new(PromptLoader::embedded_only()))
        .expect("Failed to build orchestrator")
}

// =============================================================================
// Full runs
// =============================================================================

#[tokio::test]
async fn test_full_run_produces_all_stage_results() {
    let client = ScriptedClient::new(vec![Ok(RESEARCH), Ok(PLANNING), Ok(EXECUTION)]);
    let task = Task::new("Create a simple to-do list application", "Small team").unwrap();

    let result = orchestrator(client.clone()).run(&task).await.unwrap();

    // Fenced JSON is parsed like bare JSON
    assert!(result.unparsed_stages().is_empty());
    assert_eq!(
        result.research.field("task_analysis").unwrap().text("main_objective").as_deref(),
        Some("Build a to-do app")
    );

    let metadata = result.research.metadata().expect("research metadata");
    assert_eq!(metadata.text("agent").as_deref(), Some("Research Agent"));
    assert_eq!(metadata.text("context").as_deref(), Some("Small team"));
    assert!(result.planning.metadata().unwrap().contains_key("research_summary"));
    let execution_meta = result.execution.metadata().unwrap();
    assert!(execution_meta.contains_key("research_summary"));
    assert!(execution_meta.contains_key("planning_summary"));

    // Downstream prompts carry the upstream digests
    let prompts = client.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("TASK: Create a simple to-do list application"));
    assert!(prompts[0].contains("CONTEXT: Small team"));
    assert!(prompts[1].contains("RESEARCH FINDINGS:"));
    assert!(prompts[1].contains("Build a to-do app"));
    assert!(prompts[2].contains("EXECUTION PLAN:"));
    assert!(prompts[2].contains("Two phases"));
}

#[tokio::test]
async fn test_result_json_shape() {
    let client = ScriptedClient::new(vec![Ok(RESEARCH), Ok(PLANNING), Ok("Just prose, no JSON.")]);
    let task = Task::new("Create a web app", "").unwrap();

    let result = orchestrator(client).run(&task).await.unwrap();
    let json: Value = serde_json::to_value(&result).unwrap();

    assert_eq!(json["status"], "completed");
    assert!(json["total_duration"].is_f64());
    assert!(json["research_results"]["task_analysis"].is_object());
    assert!(json["planning_results"]["phases"].is_array());
    assert_eq!(json["execution_results"]["response"], "Just prose, no JSON.");
    assert_eq!(result.unparsed_stages(), vec![Stage::Execution]);
}

#[tokio::test]
async fn test_failed_run_reports_stage_and_stops() {
    let client = ScriptedClient::new(vec![Ok(RESEARCH), Ok(PLANNING), Err(429)]);
    let bus = EventBus::new(32);
    let mut rx = bus.subscribe();
    let task = Task::new("Create a web app", "").unwrap();

    let err = orchestrator(client.clone()).with_events(bus).run(&task).await.unwrap_err();

    assert_eq!(err.stage, Stage::Execution);
    assert!(err.to_string().starts_with("Execution Agent processing failed"));
    assert_eq!(client.prompts().len(), 3);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::StageFailed {
            stage: Stage::Execution,
            ..
        })
    ));
    assert!(!events.iter().any(|e| e.event_type() == "WorkflowCompleted"));
}

#[tokio::test]
async fn test_concurrent_runs_share_one_service() {
    let client = ScriptedClient::new(vec![Ok("{}"); 6]);
    let orchestrator = Arc::new(orchestrator(client.clone()));

    let a = Task::new("Task A", "").unwrap();
    let b = Task::new("Task B", "").unwrap();
    let (ra, rb) = tokio::join!(orchestrator.run(&a), orchestrator.run(&b));

    let (ra, rb) = (ra.unwrap(), rb.unwrap());
    assert_ne!(ra.id, rb.id);
    assert_eq!(client.prompts().len(), 6);
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn test_history_records_completed_runs() {
    let client = ScriptedClient::new(vec![Ok(RESEARCH), Ok(PLANNING), Ok(EXECUTION)]);
    let task = Task::new("Create a web app", "").unwrap();
    let result = orchestrator(client).run(&task).await.unwrap();

    let mut history = History::new();
    let id = history.push(task, result);

    assert_eq!(id, 1);
    let entry = history.get(1).unwrap();
    assert_eq!(entry.task.objective(), "Create a web app");
    assert!(entry.result.execution.contains_key("deliverables"));
}
