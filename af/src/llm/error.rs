//! LLM transport error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to an LLM provider
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited by provider, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Provider returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// HTTP status behind the error, when the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::RateLimited { .. } => Some(429),
            LlmError::ApiError { status, .. } => Some(*status),
            LlmError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// What an operator can do about it, for the log
    pub fn hint(&self) -> Option<&'static str> {
        match (self, self.status()) {
            (_, Some(401 | 403)) => Some("check the API key and its environment variable"),
            (_, Some(404)) => Some("check llm.model and llm.base-url"),
            (LlmError::RateLimited { .. }, _) => Some("provider quota exhausted, try again later"),
            (LlmError::Timeout(_), _) => Some("raise llm.timeout-ms or lower max-tokens"),
            _ => None,
        }
    }
}
