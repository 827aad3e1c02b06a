//! Contract with the backend generation endpoint

pub mod client;
pub mod prompt;
pub mod response;

pub use client::{HttpGenerationClient, RetryPolicy};
pub use prompt::PromptEngine;
pub use response::{looks_like_source, strip_code_fences};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model selector sent with each request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelChoice {
    /// Let the backend route the request
    #[default]
    Auto,
    Gpt4o,
    Claude,
    Gemini,
    Other(String),
}

impl ModelChoice {
    pub fn as_str(&self) -> &str {
        match self {
            ModelChoice::Auto => "auto",
            ModelChoice::Gpt4o => "gpt-4o",
            ModelChoice::Claude => "claude",
            ModelChoice::Gemini => "gemini",
            ModelChoice::Other(name) => name,
        }
    }
}

impl From<&str> for ModelChoice {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => ModelChoice::Auto,
            "gpt-4o" | "gpt4o" | "openai" => ModelChoice::Gpt4o,
            "claude" | "anthropic" => ModelChoice::Claude,
            "gemini" | "google" => ModelChoice::Gemini,
            _ => ModelChoice::Other(value.trim().to_string()),
        }
    }
}

impl From<String> for ModelChoice {
    fn from(value: String) -> Self {
        ModelChoice::from(value.as_str())
    }
}

impl From<ModelChoice> for String {
    fn from(value: ModelChoice) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Fully framed prompt text
    pub message: String,
    pub session_id: String,
    pub model: ModelChoice,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text, possibly wrapped in code fences
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u64>,
}

impl GenerationResponse {
    pub fn text(response: &str) -> Self {
        Self {
            response: response.to_string(),
            ..Self::default()
        }
    }
}

/// Something that turns a framed instruction into generated source
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;
}
