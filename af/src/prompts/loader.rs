//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;
use crate::agent::Stage;

/// Values interpolated into a stage's user prompt
#[derive(Debug, Clone, Default, Serialize)]
pub struct StagePromptContext {
    /// The task objective
    pub task: String,
    /// Optional background; omitted from the prompt when empty
    pub context: String,
    /// Digest of the research result (planning and execution)
    pub research_summary: Option<String>,
    /// Digest of the planning result (execution only)
    pub planning_summary: Option<String>,
}

impl StagePromptContext {
    pub fn new(task: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            context: context.into(),
            ..Self::default()
        }
    }

    pub fn with_research_summary(mut self, summary: String) -> Self {
        self.research_summary = Some(summary);
        self
    }

    pub fn with_planning_summary(mut self, summary: String) -> Self {
        self.planning_summary = Some(summary);
        self
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.agentflow/prompts/`)
    user_dir: Option<PathBuf>,
    /// Repo default directory (e.g., `prompts/`)
    repo_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at the given directory
    ///
    /// Looks for `.agentflow/prompts/` and `prompts/` under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        debug!(?root, "PromptLoader::new: called");
        let user_dir = root.join(".agentflow/prompts");
        let repo_dir = root.join("prompts");

        let user_dir_exists = user_dir.exists();
        let repo_dir_exists = repo_dir.exists();
        debug!(
            ?user_dir,
            %user_dir_exists,
            ?repo_dir,
            %repo_dir_exists,
            "PromptLoader::new: checking directories"
        );

        Self {
            hbs: Self::engine(),
            user_dir: if user_dir_exists { Some(user_dir) } else { None },
            repo_dir: if repo_dir_exists { Some(repo_dir) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
            repo_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; task text must reach the model unmodified
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.agentflow/prompts/{name}.pmt`
    /// 2. Repo default: `prompts/{name}.pmt`
    /// 3. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.user_dir, &self.repo_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found on disk");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found");
        }

        debug!("PromptLoader::load_template: trying embedded fallback");
        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// System contract (schema plus role instructions) for a stage
    pub fn system_contract(&self, stage: Stage) -> Result<String> {
        debug!(%stage, "PromptLoader::system_contract: called");
        self.load_template(stage.system_template())
    }

    /// Render a named template with the given context
    pub fn render(&self, template_name: &str, context: &StagePromptContext) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the user prompt for a stage
    pub fn render_task(&self, stage: Stage, context: &StagePromptContext) -> Result<String> {
        self.render(stage.task_template(), context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_research_with_context() {
        let loader = PromptLoader::embedded_only();
        let ctx = StagePromptContext::new("Build a CLI & <parser>", "Rust only");

        let prompt = loader.render_task(Stage::Research, &ctx).unwrap();
        assert!(prompt.contains("TASK: Build a CLI & <parser>"));
        assert!(prompt.contains("CONTEXT: Rust only"));
    }

    #[test]
    fn test_render_research_without_context() {
        let loader = PromptLoader::embedded_only();
        let ctx = StagePromptContext::new("Build a CLI", "");

        let prompt = loader.render_task(Stage::Research, &ctx).unwrap();
        assert!(prompt.contains("TASK: Build a CLI"));
        assert!(!prompt.contains("CONTEXT:"));
    }

    #[test]
    fn test_render_execution_includes_both_digests() {
        let loader = PromptLoader::embedded_only();
        let ctx = StagePromptContext::new("Ship it", "")
            .with_research_summary("Main Objective: ship".to_string())
            .with_planning_summary("Plan Overview: in two phases".to_string());

        let prompt = loader.render_task(Stage::Execution, &ctx).unwrap();
        assert!(prompt.contains("ORIGINAL TASK: Ship it"));
        assert!(prompt.contains("RESEARCH FINDINGS:\nMain Objective: ship"));
        assert!(prompt.contains("EXECUTION PLAN:\nPlan Overview: in two phases"));
    }

    #[test]
    fn test_system_contract_per_stage() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.system_contract(Stage::Research).unwrap().contains("Research Agent"));
        assert!(loader.system_contract(Stage::Planning).unwrap().contains("Planning Agent"));
        assert!(loader.system_contract(Stage::Execution).unwrap().contains("Execution Agent"));
    }

    #[test]
    fn test_user_override_wins() {
        let root = TempDir::new().unwrap();
        let user_dir = root.path().join(".agentflow/prompts");
        let repo_dir = root.path().join("prompts");
        std::fs::create_dir_all(&user_dir).unwrap();
        std::fs::create_dir_all(&repo_dir).unwrap();
        std::fs::write(user_dir.join("research-task.pmt"), "USER {{task}}").unwrap();
        std::fs::write(repo_dir.join("research-task.pmt"), "REPO {{task}}").unwrap();
        std::fs::write(repo_dir.join("planning.pmt"), "repo planning contract").unwrap();

        let loader = PromptLoader::new(root.path());
        let ctx = StagePromptContext::new("x", "");
        assert_eq!(loader.render_task(Stage::Research, &ctx).unwrap(), "USER x");
        assert_eq!(loader.system_contract(Stage::Planning).unwrap(), "repo planning contract");
        // Anything not overridden falls through to the embedded copy
        assert!(loader.system_contract(Stage::Execution).unwrap().contains("Execution Agent"));
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
