//! LLM Client module
//!
//! Provider clients behind the [`LlmClient`] trait. The pipeline only ever
//! sees `Arc<dyn LlmClient>`; which provider backs it is a configuration choice.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::{ConfigurationError, LlmConfig};

/// Providers `create_client` knows how to build
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai", "anthropic"];

/// Create an LLM client based on the provider specified in config
///
/// Fails when the provider is unknown or the API key is not set.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, ConfigurationError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(ConfigurationError::UnknownProvider(other.to_string()))
        }
    }
}
