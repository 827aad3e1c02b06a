use super::{project_dirs, ClientConfig};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Reads `config.toml`, applies environment overrides and validates.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit file; unlike the default location it must exist
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    pub async fn load(&self) -> Result<ClientConfig> {
        let mut config = match &self.path {
            Some(path) => {
                if !fs::try_exists(path).await? {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                Self::load_file(path).await?
            }
            None => match Self::default_path() {
                Ok(path) if fs::try_exists(&path).await.unwrap_or(false) => {
                    Self::load_file(&path).await?
                }
                _ => ClientConfig::default(),
            },
        };

        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    async fn load_file(path: &Path) -> Result<ClientConfig> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path).await?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_url = \"https://crucib.ai\"\nmax_poll_failures = 3\npoll_interval = \"1s\"\n",
        )
        .unwrap();

        let config = ConfigLoader::with_path(&path).load().await.unwrap();
        assert_eq!(config.max_poll_failures, 3);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = ConfigLoader::with_path(dir.path().join("nope.toml"))
            .load()
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_toml_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = [").unwrap();

        let result = ConfigLoader::with_path(&path).load().await;
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[tokio::test]
    async fn test_invalid_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "generation_timeout = \"0s\"\n").unwrap();

        let result = ConfigLoader::with_path(&path).load().await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
