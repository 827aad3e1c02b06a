//! Shared clients for one CLI invocation

use crate::api::{http_client, Endpoints, ProjectsClient};
use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::generation::HttpGenerationClient;
use crate::progress::{PollSource, ProgressWatcher, PushSource};
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

pub struct CliContext {
    pub config: ClientConfig,
    pub endpoints: Endpoints,
    pub http: Client,
    pub auth: Arc<AuthSession>,
    pub projects: Arc<ProjectsClient>,
}

impl CliContext {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoints = config.endpoints()?;
        let http = http_client(&config)?;
        let auth = Arc::new(AuthSession::new(
            http.clone(),
            endpoints.clone(),
            config.token_path(),
        ));
        let projects = Arc::new(ProjectsClient::new(
            http.clone(),
            endpoints.clone(),
            auth.clone(),
        ));
        debug!("Using backend {}", endpoints.root());

        Ok(Self {
            config,
            endpoints,
            http,
            auth,
            projects,
        })
    }

    /// Like [`new`](Self::new), with the stored token restored
    pub async fn signed_in(config: ClientConfig) -> Result<Self> {
        let context = Self::new(config)?;
        context.auth.restore().await?;
        Ok(context)
    }

    pub fn generation_backend(&self) -> HttpGenerationClient {
        HttpGenerationClient::new(
            self.http.clone(),
            self.endpoints.clone(),
            self.auth.clone(),
            self.config.retry_policy(),
        )
    }

    pub fn progress_watcher(&self) -> ProgressWatcher {
        let push = PushSource::new(self.endpoints.clone());
        let poll = PollSource::new(
            self.projects.clone(),
            self.config.poll_interval,
            self.config.max_poll_failures,
        );
        ProgressWatcher::new(push, poll, self.config.transport)
            .with_connect_timeout(self.config.connect_timeout)
    }
}
