//! Generation error types

use thiserror::Error;

use crate::llm::LlmError;

/// A single text-generation call failed
///
/// Not retried above the transport layer; a failed call fails its stage.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to generate response: {0}")]
    Provider(#[from] LlmError),

    #[error("Failed to generate response: empty response from {model}")]
    EmptyResponse { model: String },

    #[error("Failed to generate response: generation task aborted: {0}")]
    Dispatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_keeps_cause() {
        let err = GenerationError::from(LlmError::ApiError {
            status: 500,
            message: "upstream exploded".to_string(),
        });
        let text = err.to_string();
        assert!(text.starts_with("Failed to generate response"));
        assert!(text.contains("500"));
        assert!(text.contains("upstream exploded"));
    }

    #[test]
    fn test_empty_response_names_model() {
        let err = GenerationError::EmptyResponse {
            model: "gpt-4o-mini".to_string(),
        };
        assert!(err.to_string().contains("gpt-4o-mini"));
    }
}
