//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// Implementations hold only fixed configuration (credential, model, base URL)
/// so one instance can be shared across concurrent workflow runs.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request and wait for the full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model identifier, used for logging
    fn model(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    type Responder = Box<dyn Fn(&CompletionRequest, usize) -> Result<CompletionResponse, LlmError> + Send + Sync>;

    /// Mock LLM client for unit tests
    ///
    /// Records every request so tests can assert on the prompts that were sent.
    pub struct MockLlmClient {
        responder: Responder,
        call_count: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        /// Replay the given texts in order, erroring once they run out
        pub fn new(texts: Vec<&str>) -> Self {
            debug!(response_count = %texts.len(), "MockLlmClient::new: called");
            let texts: Vec<String> = texts.into_iter().map(String::from).collect();
            Self::with_responder(move |_, idx| {
                texts
                    .get(idx)
                    .map(|t| CompletionResponse::text(t.clone()))
                    .ok_or_else(|| LlmError::InvalidResponse("No more mock responses".to_string()))
            })
        }

        /// Answer every request from a closure (request, call index)
        pub fn with_responder<F>(responder: F) -> Self
        where
            F: Fn(&CompletionRequest, usize) -> Result<CompletionResponse, LlmError> + Send + Sync + 'static,
        {
            Self {
                responder: Box::new(responder),
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Fail every request with the given HTTP status
        pub fn failing(status: u16) -> Self {
            Self::with_responder(move |_, _| {
                Err(LlmError::ApiError {
                    status,
                    message: "mock failure".to_string(),
                })
            })
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// All requests received so far
        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }

        /// Text of the single user message of the nth request
        pub fn prompt(&self, idx: usize) -> String {
            self.requests()
                .get(idx)
                .and_then(|r| r.messages.first())
                .map(|m| m.content.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(%idx, "MockLlmClient::complete: called");
            let result = (self.responder)(&request, idx);
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request);
            }
            result
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_returns_responses() {
            let client = MockLlmClient::new(vec!["Response 1", "Response 2"]);
            let req = CompletionRequest::single("Test", "hello", 1000, 0.7);

            let resp1 = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp1.content, Some("Response 1".to_string()));

            let resp2 = client.complete(req).await.unwrap();
            assert_eq!(resp2.content, Some("Response 2".to_string()));

            assert_eq!(client.call_count(), 2);
            assert_eq!(client.prompt(1), "hello");
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::new(vec![]);
            let req = CompletionRequest::single("Test", "hello", 1000, 0.7);

            assert!(client.complete(req).await.is_err());
            assert_eq!(client.requests().len(), 1);
        }
    }
}
