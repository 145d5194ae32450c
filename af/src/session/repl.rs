//! Interactive session loop

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info, warn};

use super::SlashCommand;
use crate::agent::Stage;
use crate::domain::{History, HistoryEntry, Task};
use crate::events::EventBus;
use crate::pipeline::Orchestrator;
use crate::report;

/// What the loop does after a command
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Interactive session over one pipeline
pub struct Session {
    orchestrator: Orchestrator,
    bus: EventBus,
    history: History,
    /// Context attached to every task entered until changed
    context: String,
}

impl Session {
    pub fn new(orchestrator: Orchestrator, bus: EventBus) -> Self {
        Self {
            orchestrator,
            bus,
            history: History::new(),
            context: String::new(),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Run the session main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let printer = report::spawn_progress_printer(self.bus.subscribe(), false);
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", "task>".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        if self.handle_command(SlashCommand::parse(input)) == Flow::Quit {
                            break;
                        }
                    } else {
                        self.run_task(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    printer.abort();
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        printer.abort();
        println!("Goodbye!");
        Ok(())
    }

    /// Run one task through the pipeline and record it on success
    ///
    /// Errors are shown and the session continues.
    pub async fn run_task(&mut self, objective: &str) -> Option<usize> {
        debug!(%objective, "run_task: called");
        let task = match Task::new(objective, self.context.clone()) {
            Ok(task) => task,
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                return None;
            }
        };

        match self.orchestrator.run(&task).await {
            Ok(result) => {
                println!();
                print!("{}", report::render(&result));
                let id = self.history.push(task, result);
                info!(%id, "Stored workflow result");
                println!();
                println!("{}", format!("Saved as #{} (/show {}, /json {})", id, id, id).dimmed());
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "Workflow failed");
                println!("{} {}", "Error:".red(), e);
                None
            }
        }
    }

    fn handle_command(&mut self, command: SlashCommand) -> Flow {
        debug!(?command, "handle_command: called");
        match command {
            SlashCommand::Help => self.print_help(),
            SlashCommand::Quit => return Flow::Quit,
            SlashCommand::Context(Some(context)) => {
                println!("{} {}", "Context set:".dimmed(), context);
                self.context = context;
            }
            SlashCommand::Context(None) => {
                self.context.clear();
                println!("{}", "Context cleared.".dimmed());
            }
            SlashCommand::History => self.print_history(),
            SlashCommand::Show(id) => {
                if let Some(entry) = self.entry(id) {
                    print!("{}", report::render(&entry.result));
                }
            }
            SlashCommand::Json(id) => {
                if let Some(entry) = self.entry(id) {
                    match serde_json::to_string_pretty(&entry.result) {
                        Ok(json) => println!("{}", json),
                        Err(e) => println!("{} {}", "Error:".red(), e),
                    }
                }
            }
            SlashCommand::Clear => {
                self.history.clear();
                println!("{}", "History cleared.".dimmed());
            }
            SlashCommand::Invalid(message) => println!("{} {}", "?".yellow(), message),
            SlashCommand::Unknown(cmd) => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        Flow::Continue
    }

    fn entry(&self, id: Option<usize>) -> Option<&HistoryEntry> {
        let entry = match id {
            Some(id) => self.history.get(id),
            None => self.history.latest(),
        };
        if entry.is_none() {
            match id {
                Some(id) => println!("{} No result #{}", "?".yellow(), id),
                None => println!("{}", "No results yet.".dimmed()),
            }
        }
        entry
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "AgentFlow Interactive Session".bright_cyan().bold());
        println!(
            "Stages: {}",
            Stage::ALL.iter().map(Stage::agent_name).collect::<Vec<_>>().join(" -> ")
        );
        println!("Type a task to run it, {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:16} Show this help", "/help".yellow());
        println!("  {:16} Exit the session", "/quit".yellow());
        println!("  {:16} Set context for later tasks (empty clears)", "/context <text>".yellow());
        println!("  {:16} List completed runs", "/history".yellow());
        println!("  {:16} Show a run as a report (latest by default)", "/show [n]".yellow());
        println!("  {:16} Show a run as JSON (latest by default)", "/json [n]".yellow());
        println!("  {:16} Forget all completed runs", "/clear".yellow());
        println!();
    }

    fn print_history(&self) {
        if self.history.is_empty() {
            println!("{}", "No completed runs.".dimmed());
            return;
        }

        println!();
        println!("{}", "Completed Runs:".bright_cyan());
        for entry in self.history.iter() {
            let preview: String = entry.task.objective().chars().take(60).collect();
            let preview = if entry.task.objective().chars().count() > 60 {
                format!("{}...", preview)
            } else {
                preview
            };
            println!(
                "  {:>3}  {}  {:>7.2}s  {}",
                format!("#{}", entry.id).yellow(),
                entry.timestamp.format("%H:%M:%S"),
                entry.result.total_duration.as_secs_f64(),
                preview
            );
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generation::GenerationService;
    use crate::llm::client::mock::MockLlmClient;
    use crate::prompts::PromptLoader;
    use std::sync::Arc;

    fn session(client: Arc<MockLlmClient>) -> Session {
        let generation = Arc::new(GenerationService::new(client));
        let bus = EventBus::new(32);
        let orchestrator = Orchestrator::from_config(&Config::default(), generation, Arc::new(PromptLoader::embedded_only()))
            .unwrap()
            .with_events(bus.clone());
        Session::new(orchestrator, bus)
    }

    #[tokio::test]
    async fn test_successful_runs_are_recorded() {
        let mock = Arc::new(MockLlmClient::new(vec!["{}", "{}", "{}", "{}", "{}", "{}"]));
        let mut session = session(mock);

        assert_eq!(session.run_task("First task").await, Some(1));
        assert_eq!(session.run_task("Second task").await, Some(2));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history().get(2).unwrap().task.objective(), "Second task");
    }

    #[tokio::test]
    async fn test_failed_and_empty_runs_are_not_recorded() {
        let mock = Arc::new(MockLlmClient::failing(500));
        let mut session = session(mock.clone());

        assert_eq!(session.run_task("Doomed").await, None);
        assert_eq!(session.run_task("   ").await, None);
        assert!(session.history().is_empty());
        // The empty task never reaches the provider
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_context_applies_to_later_tasks() {
        let mock = Arc::new(MockLlmClient::new(vec!["{}", "{}", "{}"]));
        let mut session = session(mock.clone());

        assert_eq!(
            session.handle_command(SlashCommand::Context(Some("Rust only".to_string()))),
            Flow::Continue
        );
        session.run_task("Build a CLI").await;

        assert!(mock.prompt(0).contains("CONTEXT: Rust only"));
        assert_eq!(session.history().latest().unwrap().task.context(), "Rust only");
    }

    #[test]
    fn test_quit_and_clear() {
        let mut session = session(Arc::new(MockLlmClient::new(vec![])));
        assert_eq!(session.handle_command(SlashCommand::Quit), Flow::Quit);
        assert_eq!(session.handle_command(SlashCommand::Clear), Flow::Continue);
        assert!(session.history().is_empty());
    }
}
