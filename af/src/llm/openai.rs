//! OpenAI API client implementation
//!
//! Implements the LlmClient trait for OpenAI's Chat Completions API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, StopReason, TokenUsage};
use crate::config::{ConfigurationError, LlmConfig};

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504)
}

/// OpenAI API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    timeout: Duration,
    /// Extra attempts on transient statuses; 0 unless configured
    max_retries: u32,
}

impl OpenAIClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key once; a missing key is a configuration error.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigurationError> {
        debug!(model = %config.model, base_url = %config.base_url, "OpenAIClient::from_config: called");
        let api_key = config.get_api_key()?;

        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigurationError::HttpClient)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            timeout,
            max_retries: config.max_retries,
        })
    }

    /// Reasoning models take max_completion_tokens and reject custom temperatures
    fn is_reasoning_model(&self) -> bool {
        self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3")
    }

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut messages = Vec::new();
        if !request.system_prompt.is_empty() {
            messages.push(serde_json::json!({
                "role": "system",
                "content": request.system_prompt,
            }));
        }
        messages.extend(self.convert_messages(&request.messages));

        let max_tokens = request.max_tokens.min(self.max_tokens);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if self.is_reasoning_model() {
            debug!("build_request_body: reasoning model, using max_completion_tokens");
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
            body["temperature"] = serde_json::json!(request.temperature);
        }

        body
    }

    /// Convert internal Message types to OpenAI API format
    fn convert_messages(&self, messages: &[Message]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role,
                    "content": msg.content,
                })
            })
            .collect()
    }

    /// Parse the OpenAI API response
    fn parse_response(&self, api_response: OpenAIResponse) -> CompletionResponse {
        debug!(choices = api_response.choices.len(), "parse_response: called");
        let (content, stop_reason) = match api_response.choices.into_iter().next() {
            Some(c) => (c.message.content, StopReason::from_openai(c.finish_reason.as_deref())),
            None => {
                debug!("parse_response: no choices");
                (None, StopReason::EndTurn)
            }
        };

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        CompletionResponse {
            content,
            stop_reason,
            usage,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(attempt, backoff_ms = backoff, "complete: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self
                .http
                .post(url.clone())
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) if e.is_timeout() => {
                    debug!(attempt, "complete: request timed out");
                    return Err(LlmError::Timeout(self.timeout));
                }
                Err(e) => {
                    debug!(attempt, error = %e, "complete: network error");
                    last_error = Some(LlmError::Network(e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                debug!("complete: rate limited (429)");
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);

                return Err(LlmError::RateLimited {
                    retry_after: Duration::from_secs(retry_after),
                });
            }

            if is_retryable_status(status) && attempt < self.max_retries {
                let text = response.text().await.unwrap_or_default();
                debug!(attempt, status, "complete: retryable error");
                last_error = Some(LlmError::ApiError { status, message: text });
                continue;
            }

            if !response.status().is_success() {
                debug!(%status, "complete: API error");
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::ApiError { status, message: text });
            }

            debug!("complete: success");
            let api_response: OpenAIResponse = response.json().await?;
            return Ok(self.parse_response(api_response));
        }

        Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(model: &str, max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            model: model.to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.openai.com".to_string(),
            http: Client::new(),
            max_tokens,
            timeout: Duration::from_secs(300),
            max_retries: 0,
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = client("gpt-4o-mini", 8192);
        let request = CompletionRequest::single("You are helpful", "Hello", 1000, 0.3);

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are helpful");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_empty_system_prompt_omitted() {
        let client = client("gpt-4o-mini", 8192);
        let request = CompletionRequest::single("", "Combined prompt", 1000, 0.7);

        let body = client.build_request_body(&request);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn test_max_tokens_capped() {
        let client = client("gpt-4o-mini", 1000);
        let request = CompletionRequest::single("Test", "Hi", 5000, 0.7);

        let body = client.build_request_body(&request);
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_reasoning_model_uses_completion_tokens() {
        let client = client("o3-mini", 8192);
        let request = CompletionRequest::single("", "Hi", 2048, 0.4);

        let body = client.build_request_body(&request);
        assert_eq!(body["max_completion_tokens"], 2048);
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_parse_response() {
        let client = client("gpt-4o-mini", 8192);
        let api: OpenAIResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"content": "{\"a\": 1}"}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 20}
        }))
        .unwrap();

        let resp = client.parse_response(api);
        assert_eq!(resp.content.as_deref(), Some("{\"a\": 1}"));
        assert_eq!(resp.stop_reason, StopReason::MaxTokens);
        assert_eq!(resp.usage.total(), 30);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let client = client("gpt-4o-mini", 8192);
        let api: OpenAIResponse = serde_json::from_value(serde_json::json!({ "choices": [] })).unwrap();

        let resp = client.parse_response(api);
        assert!(resp.content.is_none());
        assert_eq!(resp.usage, TokenUsage::default());
    }

    #[test]
    #[serial_test::serial]
    fn test_retries_come_from_config() {
        // SAFETY: serialized with other env-touching tests
        unsafe { std::env::set_var("AGENTFLOW_TEST_OPENAI_RETRY_KEY", "test-key") };
        let config = LlmConfig {
            api_key_env: "AGENTFLOW_TEST_OPENAI_RETRY_KEY".to_string(),
            ..LlmConfig::default()
        };

        // Each request is sent once unless retries are configured
        assert_eq!(OpenAIClient::from_config(&config).unwrap().max_retries, 0);

        let config = LlmConfig { max_retries: 2, ..config };
        assert_eq!(OpenAIClient::from_config(&config).unwrap().max_retries, 2);
        unsafe { std::env::remove_var("AGENTFLOW_TEST_OPENAI_RETRY_KEY") };
    }
}
