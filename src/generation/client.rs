//! HTTP client for `POST /api/ai/chat` with retry logic

use super::{GenerationBackend, GenerationRequest, GenerationResponse};
use crate::api::{error_for_status, Endpoints};
use crate::auth::AuthSession;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Bounded exponential backoff for transient failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}

pub struct HttpGenerationClient {
    http: Client,
    endpoints: Endpoints,
    auth: Arc<AuthSession>,
    retry: RetryPolicy,
}

impl HttpGenerationClient {
    pub fn new(
        http: Client,
        endpoints: Endpoints,
        auth: Arc<AuthSession>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            endpoints,
            auth,
            retry,
        }
    }

    async fn send_once(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let url = self.endpoints.api("ai/chat")?;
        let response = self
            .auth
            .authorize(self.http.post(url))
            .json(request)
            .send()
            .await?;
        Ok(error_for_status(response).await?.json().await?)
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let mut retry_count = 0;
        loop {
            match self.send_once(request).await {
                Ok(response) => {
                    debug!(
                        model = response.model_used.as_deref().unwrap_or("unknown"),
                        tokens = response.tokens_used,
                        "Generation finished"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    if retry_count >= self.retry.max_retries || !e.is_retryable() {
                        return Err(e);
                    }

                    retry_count += 1;
                    let delay = self.retry.delay_for(retry_count);
                    warn!(
                        "Generation attempt {} failed: {}; retrying in {:?}",
                        retry_count, e, delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
