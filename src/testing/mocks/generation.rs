//! Scripted generation backend

use crate::error::{Error, Result};
use crate::generation::{GenerationBackend, GenerationRequest, GenerationResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Builder for creating configured mock generation backends
pub struct MockGenerationBackendBuilder {
    script: VecDeque<Result<GenerationResponse>>,
    default_response: Option<GenerationResponse>,
    delay: Option<Duration>,
}

impl MockGenerationBackendBuilder {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            default_response: None,
            delay: None,
        }
    }

    /// Queue a full response
    pub fn with_response(mut self, response: GenerationResponse) -> Self {
        self.script.push_back(Ok(response));
        self
    }

    /// Queue a response whose text is `text`, reported as model `mock`
    pub fn with_source(self, text: &str) -> Self {
        self.with_response(GenerationResponse {
            response: text.to_string(),
            model_used: Some("mock".to_string()),
            tokens_used: Some(text.len() as u64),
        })
    }

    /// Queue a failure
    pub fn with_failure(mut self, error: Error) -> Self {
        self.script.push_back(Err(error));
        self
    }

    /// Answer with `text` once the script is used up
    pub fn with_default_source(mut self, text: &str) -> Self {
        self.default_response = Some(GenerationResponse::text(text));
        self
    }

    /// Hold every call for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn build(self) -> MockGenerationBackend {
        MockGenerationBackend {
            script: Arc::new(Mutex::new(self.script)),
            default_response: self.default_response,
            delay: self.delay,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for MockGenerationBackendBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock implementation of GenerationBackend for testing.
///
/// Clones share the script and the request log.
#[derive(Clone)]
pub struct MockGenerationBackend {
    script: Arc<Mutex<VecDeque<Result<GenerationResponse>>>>,
    default_response: Option<GenerationResponse>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerationBackend {
    pub fn builder() -> MockGenerationBackendBuilder {
        MockGenerationBackendBuilder::new()
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(result) => result,
            None => self
                .default_response
                .clone()
                .ok_or_else(|| Error::Transport("mock backend has no scripted response".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ModelChoice;

    fn request() -> GenerationRequest {
        GenerationRequest {
            message: "hi".to_string(),
            session_id: "workspace_test".to_string(),
            model: ModelChoice::Auto,
        }
    }

    #[tokio::test]
    async fn test_script_is_played_in_order() {
        let mock = MockGenerationBackend::builder()
            .with_source("one")
            .with_failure(Error::NotSignedIn)
            .with_default_source("fallback")
            .build();

        assert_eq!(mock.generate(&request()).await.unwrap().response, "one");
        assert!(mock.generate(&request()).await.is_err());
        assert_eq!(
            mock.generate(&request()).await.unwrap().response,
            "fallback"
        );
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_script_without_default_fails() {
        let mock = MockGenerationBackend::builder().build();
        assert!(matches!(
            mock.generate(&request()).await,
            Err(Error::Transport(_))
        ));
    }
}
