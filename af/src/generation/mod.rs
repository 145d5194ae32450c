//! Text generation service
//!
//! Turns (system prompt, user prompt, temperature, max tokens) into generated
//! text on top of an [`LlmClient`], and offers a structured call that asks for
//! JSON and parses it leniently.

use std::sync::Arc;

use tracing::{debug, info, warn};

mod error;
mod structured;

pub use error::GenerationError;
pub use structured::{JsonFieldExt, RESPONSE_KEY, ResponseFormat, StructuredOutput, parse_structured, strip_code_fence};

use crate::config::{ConfigurationError, LlmConfig};
use crate::llm::{CompletionRequest, LlmClient, create_client};

const CONNECTION_CHECK_PROMPT: &str = "Hello, please respond with 'API is working' if you can see this message.";

/// Sampling options for one generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

impl GenerationOptions {
    /// Defaults for structured extraction (more deterministic)
    pub fn structured() -> Self {
        Self {
            temperature: 0.3,
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Shared text generation service
///
/// Holds only the client handle, so one instance serves any number of
/// concurrent workflow runs. Constructed once and passed around as
/// `Arc<GenerationService>`.
pub struct GenerationService {
    client: Arc<dyn LlmClient>,
}

impl GenerationService {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        debug!(model = %client.model(), "GenerationService::new: called");
        Self { client }
    }

    /// Build the provider client from configuration
    ///
    /// A missing API key fails here, once, rather than on every call.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigurationError> {
        debug!(provider = %config.provider, "GenerationService::from_config: called");
        let client = create_client(config)?;
        info!(provider = %config.provider, model = %client.model(), "Generation service initialised");
        Ok(Self::new(client))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Generate text for a prompt
    ///
    /// A non-empty system prompt is prepended to the prompt, separated by a
    /// blank line, and the result is sent as one user message. The provider
    /// call runs on its own task so the caller's executor thread is never
    /// held by it.
    pub async fn generate(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, GenerationError> {
        debug!(
            prompt_len = prompt.len(),
            system_len = system_prompt.len(),
            temperature = options.temperature,
            max_tokens = options.max_tokens,
            "generate: called"
        );

        let full_prompt = combine_prompts(system_prompt, prompt);
        let request = CompletionRequest::single("", full_prompt, options.max_tokens, options.temperature);

        let client = Arc::clone(&self.client);
        let response = tokio::spawn(async move { client.complete(request).await })
            .await
            .map_err(|e| GenerationError::Dispatch(e.to_string()))?
            .inspect_err(|e| match e.hint() {
                Some(hint) => warn!(error = %e, %hint, "generate: provider call failed"),
                None => warn!(error = %e, "generate: provider call failed"),
            })?;

        match response.content {
            Some(text) if !text.trim().is_empty() => {
                info!(
                    len = text.len(),
                    output_tokens = response.usage.output_tokens,
                    "Generated response"
                );
                Ok(text)
            }
            _ => {
                warn!(model = %self.client.model(), "generate: empty response");
                Err(GenerationError::EmptyResponse {
                    model: self.client.model().to_string(),
                })
            }
        }
    }

    /// Generate and interpret structured output
    ///
    /// Malformed output is not an error: it comes back as
    /// [`StructuredOutput::Unparsed`].
    pub async fn generate_structured(
        &self,
        prompt: &str,
        system_prompt: &str,
        format: &ResponseFormat,
        options: GenerationOptions,
    ) -> Result<StructuredOutput, GenerationError> {
        debug!(%format, "generate_structured: called");
        let structured_prompt = format!("{}\n\nPlease respond in {} format.", prompt, format);
        let text = self.generate(&structured_prompt, system_prompt, options).await?;
        Ok(parse_structured(&text, format))
    }

    /// Check that the provider answers at all
    pub async fn validate_connection(&self) -> bool {
        debug!("validate_connection: called");
        let options = GenerationOptions::default().with_temperature(0.1);
        match self.generate(CONNECTION_CHECK_PROMPT, "", options).await {
            Ok(text) => {
                info!(reply = %text.trim(), "Provider connection OK");
                true
            }
            Err(e) => {
                warn!("Provider connection check failed: {}", e);
                false
            }
        }
    }
}

fn combine_prompts(system_prompt: &str, prompt: &str) -> String {
    if system_prompt.is_empty() {
        prompt.to_string()
    } else {
        format!("{}\n\n{}", system_prompt, prompt)
    }
}
