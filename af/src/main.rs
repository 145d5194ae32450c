//! AgentFlow - research, planning and execution agents
//!
//! CLI entry point for running the pipeline and checking its setup.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use agentflow::agent::{Stage, canned};
use agentflow::cli::{Cli, Command, OutputFormat, check_api_keys, generate_after_help, get_log_path};
use agentflow::config::Config;
use agentflow::domain::Task;
use agentflow::events::EventBus;
use agentflow::generation::GenerationService;
use agentflow::pipeline::Orchestrator;
use agentflow::prompts::PromptLoader;
use agentflow::{report, session};

fn setup_logging(cli_level: Option<&str>, config_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // CLI flag wins over config, config over the INFO default
    let level_str = cli_level.or(config_level).unwrap_or("INFO");
    let level = match level_str.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log level '{}', using INFO", level_str);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file in the working directory may carry the API keys
    dotenvy::dotenv().ok();

    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "AgentFlow loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        Some(Command::Run { task, context, format }) => {
            debug!(%format, "main: Run command");
            cmd_run(&config, &task, context.as_deref().unwrap_or(""), format).await
        }
        Some(Command::Validate { stage }) => {
            debug!(?stage, "main: Validate command");
            cmd_validate(&config, stage).await
        }
        Some(Command::Check) => {
            debug!("main: Check command");
            cmd_check(&config).await
        }
        Some(Command::Stages) => {
            debug!("main: Stages command");
            cmd_stages(&config)
        }
        None => {
            debug!("main: no command, starting interactive session");
            session::run_interactive(&config).await
        }
    }
}

fn build_generation(config: &Config) -> Result<Arc<GenerationService>> {
    let generation = GenerationService::from_config(&config.llm).context("Failed to create generation service")?;
    Ok(Arc::new(generation))
}

fn prompt_loader() -> Result<Arc<PromptLoader>> {
    Ok(Arc::new(PromptLoader::new(std::env::current_dir()?)))
}

/// Run the full pipeline once
async fn cmd_run(config: &Config, objective: &str, context: &str, format: OutputFormat) -> Result<()> {
    // Reject a blank task before touching the provider
    let task = Task::new(objective, context)?;
    let generation = build_generation(config)?;

    let bus = EventBus::with_default_capacity();
    let printer = match format {
        OutputFormat::Text => Some(report::spawn_progress_printer(bus.subscribe(), true)),
        OutputFormat::Json => None,
    };
    let orchestrator = Orchestrator::from_config(config, generation, prompt_loader()?)?.with_events(bus);

    let outcome = orchestrator.run(&task).await;
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    match outcome {
        Ok(result) => {
            match format {
                OutputFormat::Text => {
                    println!();
                    print!("{}", report::render(&result));
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Run failed");
            eprintln!("{} {}", "Error:".red(), e);
            std::process::exit(1);
        }
    }
}

/// Run the agent self-checks
async fn cmd_validate(config: &Config, stage: Option<Stage>) -> Result<()> {
    let generation = build_generation(config)?;
    let orchestrator = Orchestrator::from_config(config, generation, prompt_loader()?)?;

    println!("Validating agents against {}...", config.llm.model);
    let checks = match stage {
        Some(stage) => vec![(stage, orchestrator.agent(stage).validate().await)],
        None => orchestrator.validate_agents().await,
    };

    let mut all_ok = true;
    for (stage, ok) in checks {
        all_ok &= ok;
        let state = if ok { "ok".green() } else { "failed".red() };
        println!("  {:<16} {}", stage.agent_name(), state);
    }

    if !all_ok {
        eprintln!("See {} for details", get_log_path().display());
        std::process::exit(1);
    }
    Ok(())
}

/// Check API keys and provider connectivity
async fn cmd_check(config: &Config) -> Result<()> {
    println!("{}", "API Keys:".bright_cyan());
    for key in check_api_keys() {
        let state = if key.present { "set".green() } else { "not set".red() };
        println!("  {:<10} {:<20} {}", key.provider, key.env, state);
    }
    println!();

    let generation = build_generation(config)?;
    print!("Connecting to {} ({})... ", config.llm.provider, generation.model());
    io::stdout().flush()?;
    if generation.validate_connection().await {
        println!("{}", "ok".green());
        Ok(())
    } else {
        println!("{}", "failed".red());
        eprintln!("See {} for details", get_log_path().display());
        std::process::exit(1);
    }
}

/// List stages with their settings and expected output keys
fn cmd_stages(config: &Config) -> Result<()> {
    for stage in Stage::ALL {
        let settings = config.stages.get(stage);
        println!(
            "{}. {} ({})",
            stage.position(),
            stage.agent_name().bright_cyan().bold(),
            stage.name()
        );
        println!(
            "   temperature: {}  max-tokens: {}",
            settings.temperature, settings.max_tokens
        );
        println!("   output keys: {}", stage.expected_keys().join(", "));
        if let Ok(task) = canned::task(stage) {
            println!("   self-check task: {}", task.objective().dimmed());
        }
    }
    Ok(())
}
