//! Project resources: build status, deploy archive and one-click deploy

use super::{error_for_status, Endpoints};
use crate::auth::AuthSession;
use crate::error::{Error, Result};
use crate::progress::state::{ProgressEvent, ProjectEnvelope};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Hosting providers the backend can deploy to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployProvider {
    Vercel,
    Netlify,
}

impl DeployProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployProvider::Vercel => "vercel",
            DeployProvider::Netlify => "netlify",
        }
    }
}

impl fmt::Display for DeployProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeployProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vercel" => Ok(DeployProvider::Vercel),
            "netlify" => Ok(DeployProvider::Netlify),
            other => Err(Error::Config(format!("unknown deploy provider: {other}"))),
        }
    }
}

/// Outcome of a deploy request; the URL is absent while the provider is
/// still building
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeployResult {
    #[serde(default)]
    pub url: Option<String>,
}

pub struct ProjectsClient {
    http: Client,
    endpoints: Endpoints,
    auth: Arc<AuthSession>,
}

impl ProjectsClient {
    pub fn new(http: Client, endpoints: Endpoints, auth: Arc<AuthSession>) -> Self {
        Self {
            http,
            endpoints,
            auth,
        }
    }

    /// Current build progress fields of a project, if the backend returned one
    pub async fn status(&self, project_id: &str) -> Result<Option<ProgressEvent>> {
        let url = self.endpoints.api(&format!("projects/{project_id}"))?;
        let response = self.auth.authorize(self.http.get(url)).send().await?;
        let envelope: ProjectEnvelope = error_for_status(response).await?.json().await?;
        Ok(envelope.project)
    }

    /// Save the deploy archive of a finished build to `dest`; returns its size
    pub async fn download_archive(&self, project_id: &str, dest: &Path) -> Result<u64> {
        let url = self
            .endpoints
            .api(&format!("projects/{project_id}/deploy/zip"))?;
        let response = self.auth.authorize(self.http.get(url)).send().await?;
        let response = match error_for_status(response).await {
            Err(Error::Api { status: 404, .. }) => {
                return Err(Error::NoDeploySnapshot(project_id.to_string()))
            }
            other => other?,
        };

        let bytes = response.bytes().await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        debug!("Wrote {} bytes to {}", bytes.len(), dest.display());
        Ok(bytes.len() as u64)
    }

    pub async fn deploy(&self, project_id: &str, provider: DeployProvider) -> Result<DeployResult> {
        let url = self
            .endpoints
            .api(&format!("projects/{project_id}/deploy/{provider}"))?;
        let request = self
            .auth
            .authorize(self.http.post(url))
            .json(&serde_json::json!({}));
        let response = match error_for_status(request.send().await?).await {
            Err(Error::Api { status: 402, message }) => {
                return Err(Error::DeployTokenMissing(message))
            }
            other => other?,
        };

        let result: DeployResult = response.json().await?;
        match &result.url {
            Some(url) => info!("Live on {}: {}", provider, url),
            None => info!("Deploy started on {}", provider),
        }
        Ok(result)
    }
}
