//! AgentFlow configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::agent::Stage;

/// Value shipped in the sample .env file; treated the same as an unset key
const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Fatal configuration problems, raised once when the generation service is built
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("LLM API key not found. Set the {env} environment variable.")]
    MissingApiKey { env: String },

    #[error("Unknown LLM provider: '{0}'. Supported: openai, anthropic")]
    UnknownProvider(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Main AgentFlow configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Per-stage generation settings
    pub stages: StagesConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `.agentflow.yml`, then
    /// `~/.config/agentflow/agentflow.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialised
    ///
    /// Any error is swallowed: the caller falls back to its own default.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::search_paths(),
        };

        candidates
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".agentflow.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("agentflow").join("agentflow.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" or "anthropic")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Upper bound on tokens per response; stage requests are capped to it
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Transport timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Transport retries on transient statuses (408, 5xx); 0 sends each request once
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 300_000,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String, ConfigurationError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() && key.trim() != PLACEHOLDER_API_KEY => Ok(key.trim().to_string()),
            _ => Err(ConfigurationError::MissingApiKey {
                env: self.api_key_env.clone(),
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Generation settings for every stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    pub research: StageSettings,
    pub planning: StageSettings,
    pub execution: StageSettings,
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            research: StageSettings::for_stage(Stage::Research),
            planning: StageSettings::for_stage(Stage::Planning),
            execution: StageSettings::for_stage(Stage::Execution),
        }
    }
}

impl StagesConfig {
    /// Settings for the given stage
    pub fn get(&self, stage: Stage) -> &StageSettings {
        match stage {
            Stage::Research => &self.research,
            Stage::Planning => &self.planning,
            Stage::Execution => &self.execution,
        }
    }
}

/// Sampling settings for one stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    pub temperature: f32,

    #[serde(rename = "max-tokens", default = "default_stage_max_tokens")]
    pub max_tokens: u32,
}

fn default_stage_max_tokens() -> u32 {
    2048
}

impl StageSettings {
    /// Stage defaults: research is most deterministic, execution the least
    pub fn for_stage(stage: Stage) -> Self {
        Self {
            temperature: stage.default_temperature(),
            max_tokens: default_stage_max_tokens(),
        }
    }
}
