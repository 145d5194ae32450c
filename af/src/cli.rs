//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::agent::Stage;

/// AgentFlow - research, planning and execution agents in one pipeline
#[derive(Parser)]
#[command(
    name = "af",
    about = "Three-stage LLM agent pipeline: research, planning, execution",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute; without one an interactive session starts
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline for a task
    Run {
        /// The task or problem statement
        task: String,

        /// Additional background for the task
        #[arg(short = 'x', long)]
        context: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run the agent self-checks against fixed inputs
    Validate {
        /// Only check this stage (research, planning, execution)
        stage: Option<Stage>,
    },

    /// Check that the LLM provider answers
    Check,

    /// List the pipeline stages
    Stages,
}

/// API key variables the supported providers read by default
const PROVIDER_KEY_VARS: &[(&str, &str)] = &[("openai", "OPENAI_API_KEY"), ("anthropic", "ANTHROPIC_API_KEY")];

/// Result of checking a provider's API key variable
pub struct KeyCheck {
    pub provider: &'static str,
    pub env: &'static str,
    pub present: bool,
}

/// Check which provider API keys are set in the environment
pub fn check_api_keys() -> Vec<KeyCheck> {
    debug!("check_api_keys: called");
    PROVIDER_KEY_VARS
        .iter()
        .map(|&(provider, env)| KeyCheck {
            provider,
            env,
            present: std::env::var(env).map(|v| !v.trim().is_empty()).unwrap_or(false),
        })
        .collect()
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentflow")
        .join("logs")
        .join("agentflow.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with API key checks and the log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("API Keys:\n");
    for key in check_api_keys() {
        let icon = if key.present { "\u{2705}" } else { "\u{274C}" };
        let state = if key.present { "set" } else { "not set" };
        help.push_str(&format!("  {} {:<10} {} {}\n", icon, key.provider, key.env, state));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for workflow results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["af"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["af", "run", "Build a CLI", "--context", "Rust only", "-f", "json"]);
        match cli.command {
            Some(Command::Run { task, context, format }) => {
                assert_eq!(task, "Build a CLI");
                assert_eq!(context.as_deref(), Some("Rust only"));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::parse_from(["af", "run", "Build a CLI"]);
        assert!(matches!(
            cli.command,
            Some(Command::Run {
                context: None,
                format: OutputFormat::Text,
                ..
            })
        ));
    }

    #[test]
    fn test_cli_parse_validate_stage() {
        let cli = Cli::parse_from(["af", "validate", "planning"]);
        assert!(matches!(
            cli.command,
            Some(Command::Validate {
                stage: Some(Stage::Planning)
            })
        ));

        let cli = Cli::parse_from(["af", "validate"]);
        assert!(matches!(cli.command, Some(Command::Validate { stage: None })));
    }

    #[test]
    fn test_cli_rejects_unknown_stage() {
        assert!(Cli::try_parse_from(["af", "validate", "review"]).is_err());
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["af", "stages", "-l", "debug", "-c", "/tmp/af.yml"]);
        assert!(matches!(cli.command, Some(Command::Stages)));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/af.yml")));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_log_path() {
        assert!(get_log_path().ends_with("agentflow/logs/agentflow.log"));
    }

    #[test]
    fn test_after_help_mentions_keys_and_logs() {
        let help = generate_after_help();
        assert!(help.contains("OPENAI_API_KEY"));
        assert!(help.contains("Logs are written to:"));
    }
}
