//! Terminal rendering of workflow results
//!
//! Every field is read with a default, so degenerate or partial stage output
//! renders instead of failing. A stage whose reply could not be parsed shows
//! the raw reply text.

use colored::{ColoredString, Colorize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::agent::{Stage, StageResult};
use crate::events::PipelineEvent;
use crate::generation::JsonFieldExt;
use crate::pipeline::WorkflowResult;

const NA: &str = "N/A";

/// Line buffer for a report
#[derive(Default)]
struct Report {
    out: String,
}

impl Report {
    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn heading(&mut self, text: &str) {
        self.blank();
        self.line(text.bright_cyan().bold().to_string());
    }

    fn label(&mut self, label: &str, value: impl AsRef<str>) {
        self.line(format!("{} {}", format!("{}:", label).bold(), value.as_ref()));
    }

    fn bullets(&mut self, label: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        self.line(format!("{}:", label).bold().to_string());
        for item in items {
            self.line(format!("  \u{2022} {}", item));
        }
    }
}

/// Render the progress summary line for a completed run
pub fn render_summary(result: &WorkflowResult) -> String {
    format!(
        "{} {} stages completed in {:.2}s | {} research questions | {} planned steps",
        "\u{2714}".green(),
        Stage::ALL.len(),
        result.total_duration.as_secs_f64(),
        result.research.items("research_questions").len(),
        result.planning.items("detailed_steps").len(),
    )
}

/// Render a full workflow result
pub fn render(result: &WorkflowResult) -> String {
    let mut report = Report::default();
    report.line(render_summary(result));
    if !result.unparsed_stages().is_empty() {
        let names: Vec<&str> = result.unparsed_stages().iter().map(Stage::name).collect();
        report.line(format!("Unstructured output from: {}", names.join(", ")).yellow().to_string());
    }

    research(&mut report, &result.research);
    planning(&mut report, &result.planning);
    execution(&mut report, &result.execution);
    report.out
}

/// One progress line for a pipeline event
pub fn render_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::WorkflowStarted { task, .. } => format!("{} {}", "Starting workflow:".bold(), task),
        PipelineEvent::StageStarted {
            stage, position, total, ..
        } => format!("[{}/{}] {}...", position, total, stage.agent_name()),
        PipelineEvent::StageCompleted {
            stage, elapsed_ms, parsed, ..
        } => {
            let note = if *parsed { String::new() } else { " (unstructured)".yellow().to_string() };
            format!(
                "{} {} done in {:.2}s{}",
                "\u{2714}".green(),
                stage.agent_name(),
                *elapsed_ms as f64 / 1000.0,
                note
            )
        }
        PipelineEvent::StageFailed { error, .. } => format!("{} {}", "\u{2718}".red(), error),
        PipelineEvent::WorkflowCompleted { total_duration_ms, .. } => format!(
            "{} Workflow completed in {:.2}s",
            "\u{2714}".green(),
            *total_duration_ms as f64 / 1000.0
        ),
    }
}

/// Print progress for every event on the receiver to stderr
///
/// With `until_terminal` the task ends after the first run finishes;
/// otherwise it runs until the bus closes.
pub fn spawn_progress_printer(mut rx: broadcast::Receiver<PipelineEvent>, until_terminal: bool) -> JoinHandle<()> {
    debug!(%until_terminal, "spawn_progress_printer: called");
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    eprintln!("{}", render_event(&event));
                    if until_terminal && event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%skipped, "Progress printer lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn priority_marker(priority: &str) -> ColoredString {
    match priority {
        "high" => "\u{25cf}".red(),
        "medium" => "\u{25cf}".yellow(),
        "low" => "\u{25cf}".green(),
        _ => "\u{25cb}".normal(),
    }
}

fn unparsed(report: &mut Report, result: &StageResult) -> bool {
    match result.raw_response() {
        Some(text) => {
            report.line("(response was not structured JSON)".dimmed().to_string());
            report.line(text);
            true
        }
        None => false,
    }
}

fn research(report: &mut Report, result: &StageResult) {
    report.heading("Research Results");
    if unparsed(report, result) {
        return;
    }

    if let Some(analysis) = result.field("task_analysis") {
        report.label("Main Objective", analysis.text_or("main_objective", NA));
        report.label("Complexity", analysis.text_or("complexity_level", NA));
        report.label("Key Domains", analysis.strings("key_domains").join(", "));
        report.label("Scope", analysis.text_or("estimated_scope", NA));
    }

    let questions = result.items("research_questions");
    if !questions.is_empty() {
        report.blank();
        report.line("Research Questions:".bold().to_string());
        for (i, q) in questions.iter().enumerate() {
            let priority = q.text_or("priority", "medium");
            report.line(format!(
                "{}. {} {}",
                i + 1,
                priority_marker(&priority),
                q.text_or("question", NA).bold()
            ));
            report.line(format!(
                "   Category: {} | Priority: {}",
                q.text_or("category", NA),
                q.text_or("priority", NA)
            ));
            report.line(format!("   Rationale: {}", q.text_or("rationale", NA)));
        }
    }

    let areas = result.items("research_areas");
    if !areas.is_empty() {
        report.blank();
        report.line("Research Areas:".bold().to_string());
        for area in areas {
            report.line(format!(
                "- {}: {}",
                area.text_or("area", NA).bold(),
                area.text_or("description", NA)
            ));
        }
    }
}

fn planning(report: &mut Report, result: &StageResult) {
    report.heading("Planning Results");
    if unparsed(report, result) {
        return;
    }

    if let Some(plan) = result.field("execution_plan") {
        report.label("Overview", plan.text_or("overview", NA));
        report.label("Estimated Effort", plan.text_or("total_estimated_effort", NA));
        report.label("Timeline", plan.text_or("estimated_timeline", NA));
        report.bullets("Milestones", &plan.strings("key_milestones"));
    }

    let phases = result.items("phases");
    if !phases.is_empty() {
        report.blank();
        report.line("Phases:".bold().to_string());
        for phase in phases {
            report.line(
                format!(
                    "Phase {}: {}",
                    phase.text_or("phase_number", NA),
                    phase.text_or("phase_name", NA)
                )
                .bold()
                .to_string(),
            );
            report.line(format!("   Description: {}", phase.text_or("description", NA)));
            report.line(format!("   Duration: {}", phase.text_or("estimated_duration", NA)));
        }
    }

    let steps = result.items("detailed_steps");
    if !steps.is_empty() {
        report.blank();
        report.line("Detailed Steps:".bold().to_string());
        for step in steps {
            report.line(
                format!("Step {}: {}", step.text_or("step_number", NA), step.text_or("title", NA))
                    .bold()
                    .to_string(),
            );
            report.line(format!("   Phase: {}", step.text_or("phase", NA)));
            report.line(format!("   Description: {}", step.text_or("description", NA)));
            report.line(format!("   Effort: {}", step.text_or("effort_estimate", NA)));
        }
    }
}

fn execution(report: &mut Report, result: &StageResult) {
    report.heading("Execution Results");
    if unparsed(report, result) {
        return;
    }

    if let Some(summary) = result.field("executive_summary") {
        report.label("Problem Statement", summary.text_or("problem_statement", NA));
        report.label("Solution Overview", summary.text_or("solution_overview", NA));
        report.bullets("Key Insights", &summary.strings("key_insights"));
        report.bullets("Recommendations", &summary.strings("recommendations"));
    }

    let deliverables = result.items("deliverables");
    if !deliverables.is_empty() {
        report.blank();
        report.line("Deliverables:".bold().to_string());
        for deliverable in deliverables {
            let priority = deliverable.text_or("priority", "medium");
            report.line(format!(
                "{} {}",
                priority_marker(&priority),
                deliverable.text_or("title", NA).bold()
            ));
            report.line(format!("   Type: {}", deliverable.text_or("type", NA)));
            report.line(format!("   Description: {}", deliverable.text_or("description", NA)));
            content_block(report, &deliverable.text_or("format", "text"), deliverable.field("content"));
        }
    }

    let templates = result.items("code_templates");
    if !templates.is_empty() {
        report.blank();
        report.line("Code Templates:".bold().to_string());
        for template in templates {
            report.line(template.text_or("purpose", NA).bold().to_string());
            report.line(format!("   Language: {}", template.text_or("language", NA)));
            report.line(format!("   Filename: {}", template.text_or("filename", NA)));
            content_block(report, &template.text_or("language", "text"), template.field("code"));
        }
    }

    let next_steps = result.items("next_steps");
    if !next_steps.is_empty() {
        report.blank();
        report.line("Next Steps:".bold().to_string());
        for (i, step) in next_steps.iter().enumerate() {
            report.line(format!("{}. {}", i + 1, step.text_or("action", NA).bold()));
            report.line(format!("   Timeline: {}", step.text_or("timeline", NA)));
            report.line(format!("   Owner: {}", step.text_or("owner", NA)));
        }
    }
}

/// Indented content, rendering structured content as pretty JSON
fn content_block(report: &mut Report, kind: &str, content: Option<&Value>) {
    let text = match content {
        None | Some(Value::Null) => return,
        Some(Value::String(s)) => s.clone(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_default(),
    };
    if text.trim().is_empty() {
        return;
    }
    report.line(format!("   --- {} ---", kind).dimmed().to_string());
    for line in text.lines() {
        report.line(format!("   {}", line));
    }
}
