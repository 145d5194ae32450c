//! Digests of upstream stage results
//!
//! Each function compresses one stage's output into a short plain-text block
//! for the next stage's prompt. They read every field with a default, cap
//! list lengths, and never fail: a result with nothing recognisable in it
//! yields a fixed "summary unavailable" line instead.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::generation::JsonFieldExt;

const NOT_AVAILABLE: &str = "N/A";

pub const RESEARCH_SUMMARY_UNAVAILABLE: &str = "Research results available but summary extraction failed";
pub const PLANNING_SUMMARY_UNAVAILABLE: &str = "Planning results available but summary extraction failed";

/// Questions carried into the planning prompt
const PLANNING_QUESTION_LIMIT: usize = 5;

/// Questions carried into the execution prompt
const EXECUTION_QUESTION_LIMIT: usize = 3;

/// Steps carried into the execution prompt
const EXECUTION_STEP_LIMIT: usize = 5;

/// Research areas carried into either downstream prompt
const AREA_LIMIT: usize = 5;

/// Phases carried into the execution prompt
const PHASE_LIMIT: usize = 5;

/// Research digest for the planning stage
///
/// Objective, domains and complexity, the first five questions with their
/// priority, and the first five research areas with their descriptions.
pub fn research_for_planning(research: &Map<String, Value>) -> String {
    debug!(keys = research.len(), "research_for_planning: called");
    let mut parts = Vec::new();

    if let Some(analysis) = research.get("task_analysis") {
        parts.push(format!("Main Objective: {}", analysis.text_or("main_objective", NOT_AVAILABLE)));
        parts.push(format!("Key Domains: {}", joined(analysis.strings("key_domains"))));
        parts.push(format!("Complexity: {}", analysis.text_or("complexity_level", NOT_AVAILABLE)));
    }

    if research.contains_key("research_questions") {
        let questions = research.items("research_questions");
        parts.push(format!("\nResearch Questions ({} total):", questions.len()));
        for (i, q) in questions.iter().take(PLANNING_QUESTION_LIMIT).enumerate() {
            parts.push(format!(
                "{}. {} ({} priority)",
                i + 1,
                q.text_or("question", NOT_AVAILABLE),
                q.text_or("priority", NOT_AVAILABLE)
            ));
        }
    }

    if research.contains_key("research_areas") {
        let areas = research.items("research_areas");
        parts.push(format!("\nResearch Areas ({} total):", areas.len()));
        for area in areas.iter().take(AREA_LIMIT) {
            parts.push(format!(
                "- {}: {}",
                area.text_or("area", NOT_AVAILABLE),
                area.text_or("description", NOT_AVAILABLE)
            ));
        }
    }

    finish(parts, RESEARCH_SUMMARY_UNAVAILABLE)
}

/// Research digest for the execution stage
///
/// Shorter than the planning digest: the first three questions and the first
/// five area names only.
pub fn research_for_execution(research: &Map<String, Value>) -> String {
    debug!(keys = research.len(), "research_for_execution: called");
    let mut parts = Vec::new();

    if let Some(analysis) = research.get("task_analysis") {
        parts.push(format!("Main Objective: {}", analysis.text_or("main_objective", NOT_AVAILABLE)));
        parts.push(format!("Key Domains: {}", joined(analysis.strings("key_domains"))));
    }

    if research.contains_key("research_questions") {
        let questions = research.items("research_questions");
        parts.push(format!("\nKey Research Questions ({} total):", questions.len()));
        for (i, q) in questions.iter().take(EXECUTION_QUESTION_LIMIT).enumerate() {
            parts.push(format!("{}. {}", i + 1, q.text_or("question", NOT_AVAILABLE)));
        }
    }

    if research.contains_key("research_areas") {
        let areas = research.items("research_areas");
        parts.push(format!("\nResearch Areas ({} total):", areas.len()));
        for area in areas.iter().take(AREA_LIMIT) {
            parts.push(format!("- {}", area.text_or("area", NOT_AVAILABLE)));
        }
    }

    finish(parts, RESEARCH_SUMMARY_UNAVAILABLE)
}

/// Planning digest for the execution stage
///
/// Overview, effort and timeline, the first five phases and the first five
/// step titles.
pub fn planning_for_execution(planning: &Map<String, Value>) -> String {
    debug!(keys = planning.len(), "planning_for_execution: called");
    let mut parts = Vec::new();

    if let Some(plan) = planning.get("execution_plan") {
        parts.push(format!("Plan Overview: {}", plan.text_or("overview", NOT_AVAILABLE)));
        parts.push(format!("Estimated Effort: {}", plan.text_or("total_estimated_effort", NOT_AVAILABLE)));
        parts.push(format!("Timeline: {}", plan.text_or("estimated_timeline", NOT_AVAILABLE)));
    }

    if planning.contains_key("phases") {
        let phases = planning.items("phases");
        parts.push(format!("\nExecution Phases ({} total):", phases.len()));
        for phase in phases.iter().take(PHASE_LIMIT) {
            parts.push(format!(
                "- Phase {}: {}",
                phase.text_or("phase_number", NOT_AVAILABLE),
                phase.text_or("phase_name", NOT_AVAILABLE)
            ));
        }
    }

    if planning.contains_key("detailed_steps") {
        let steps = planning.items("detailed_steps");
        parts.push(format!("\nDetailed Steps ({} total):", steps.len()));
        for (i, step) in steps.iter().take(EXECUTION_STEP_LIMIT).enumerate() {
            parts.push(format!("{}. {}", i + 1, step.text_or("title", NOT_AVAILABLE)));
        }
    }

    finish(parts, PLANNING_SUMMARY_UNAVAILABLE)
}

fn joined(items: Vec<String>) -> String {
    if items.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        items.join(", ")
    }
}

fn finish(parts: Vec<String>, fallback: &str) -> String {
    if parts.is_empty() {
        warn!("Failed to extract summary: no recognised keys in upstream result");
        return fallback.to_string();
    }
    parts.join("\n")
}
