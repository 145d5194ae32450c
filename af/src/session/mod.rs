//! Interactive AgentFlow session
//!
//! Reads tasks from the terminal, runs each through the pipeline and keeps
//! the completed results for later inspection.

mod command;
mod repl;

pub use command::SlashCommand;
pub use repl::Session;

use std::sync::Arc;

use eyre::Result;

use crate::config::Config;
use crate::events::EventBus;
use crate::generation::GenerationService;
use crate::pipeline::Orchestrator;
use crate::prompts::PromptLoader;

/// Run the interactive session
///
/// Entry point for `af` without a subcommand.
pub async fn run_interactive(config: &Config) -> Result<()> {
    // A missing key fails before the prompt appears
    let generation = Arc::new(GenerationService::from_config(&config.llm)?);
    let prompts = Arc::new(PromptLoader::new(std::env::current_dir()?));
    let bus = EventBus::with_default_capacity();
    let orchestrator = Orchestrator::from_config(config, generation, prompts)?.with_events(bus.clone());

    let mut session = Session::new(orchestrator, bus);
    session.run().await
}
