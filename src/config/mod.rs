use crate::api::Endpoints;
use crate::error::{Error, Result};
use crate::generation::{ModelChoice, RetryPolicy};
use crate::progress::TransportMode;
use crate::workspace::DEFAULT_PRIMARY_PATH;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod loader;

pub use loader::ConfigLoader;

/// Per-user directories for configuration and stored credentials
pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "crucibai")
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

/// Client settings. Every field has a default so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend root, with or without the trailing `/api`
    pub api_url: String,
    pub model: ModelChoice,
    pub log_level: Option<String>,
    pub transport: TransportMode,

    /// Upper bound for a whole submit, retries and backoff included
    #[serde(with = "humantime_serde")]
    pub generation_timeout: Duration,

    /// Upper bound for a single HTTP attempt; a timed-out attempt is retried
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// How long the push connect may take before polling is chosen
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_poll_failures: u32,
    pub primary_path: String,
    pub token_file: Option<PathBuf>,
    pub ledger_file: Option<PathBuf>,
    pub prompts: PromptOverrides,
}

/// Replacement Tera templates for the generation prompts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptOverrides {
    pub build: Option<String>,
    pub modify: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            model: ModelChoice::Auto,
            log_level: None,
            transport: TransportMode::Auto,
            generation_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_delay_ms: 500,
            max_poll_failures: 5,
            primary_path: DEFAULT_PRIMARY_PATH.to_string(),
            token_file: None,
            ledger_file: None,
            prompts: PromptOverrides::default(),
        }
    }
}

impl ClientConfig {
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_from(|key| std::env::var(key).ok())
    }

    /// Apply `CRUCIBAI_*` overrides read through `lookup`
    pub fn merge_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_url) = lookup("CRUCIBAI_API_URL") {
            self.api_url = api_url;
        }

        if let Some(model) = lookup("CRUCIBAI_MODEL") {
            self.model = ModelChoice::from(model);
        }

        if let Some(log_level) = lookup("CRUCIBAI_LOG_LEVEL") {
            self.log_level = Some(log_level);
        }

        if let Some(transport) = lookup("CRUCIBAI_TRANSPORT") {
            self.transport = transport.parse()?;
        }

        if let Some(token_file) = lookup("CRUCIBAI_TOKEN_FILE") {
            self.token_file = Some(PathBuf::from(token_file));
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        Endpoints::new(&self.api_url)?;

        if self.generation_timeout.is_zero() {
            return Err(Error::Config(
                "generation_timeout must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout > self.generation_timeout {
            return Err(Error::Config(format!(
                "request_timeout ({:?}) exceeds generation_timeout ({:?}), leaving no room for retries",
                self.request_timeout, self.generation_timeout
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::Config(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.primary_path.trim().is_empty() {
            return Err(Error::Config("primary_path is empty".to_string()));
        }

        Ok(())
    }

    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::new(&self.api_url)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    /// Where the bearer token lives: `token_file`, or the per-user data dir
    pub fn token_path(&self) -> Option<PathBuf> {
        self.token_file.clone().or_else(|| {
            project_dirs()
                .ok()
                .map(|dirs| dirs.data_dir().join("token"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.primary_path, "src/App.jsx");
    }

    #[test]
    fn test_humantime_durations() {
        let config: ClientConfig = toml::from_str(
            r#"
            generation_timeout = "90s"
            poll_interval = "500ms"
            transport = "poll"
            model = "gemini"
            "#,
        )
        .unwrap();
        assert_eq!(config.generation_timeout, Duration::from_secs(90));
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.transport, TransportMode::Poll);
        assert_eq!(config.model, ModelChoice::Gemini);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CRUCIBAI_API_URL", "https://crucib.ai/api"),
            ("CRUCIBAI_MODEL", "claude"),
            ("CRUCIBAI_TRANSPORT", "push"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config
            .merge_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api_url, "https://crucib.ai/api");
        assert_eq!(config.model, ModelChoice::Claude);
        assert_eq!(config.transport, TransportMode::Push);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_bad_transport_override_is_an_error() {
        let mut config = ClientConfig::default();
        let result = config.merge_from(|key| {
            (key == "CRUCIBAI_TRANSPORT").then(|| "smoke-signals".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_ok());

        let config = ClientConfig {
            api_url: "ftp://example.com".to_string(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            poll_interval: Duration::ZERO,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ClientConfig {
            request_timeout: Duration::from_secs(120),
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_explicit_token_file_wins() {
        let config = ClientConfig {
            token_file: Some(PathBuf::from("/tmp/crucibai-token")),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.token_path(),
            Some(PathBuf::from("/tmp/crucibai-token"))
        );
    }
}
