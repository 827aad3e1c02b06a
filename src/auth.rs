//! Signed-in user and bearer token
//!
//! `AuthSession` is constructed once by the caller and handed to the clients
//! that need a bearer token. It is the only place the token is mutated:
//! [`restore`](AuthSession::restore) on start-up, [`login`](AuthSession::login)
//! and [`logout`](AuthSession::logout).

use crate::api::{error_for_status, Endpoints};
use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Account details returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub token_balance: Option<i64>,
}

#[derive(Debug, Clone)]
struct Credentials {
    token: String,
    user: Option<UserProfile>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: UserProfile,
}

pub struct AuthSession {
    http: Client,
    endpoints: Endpoints,
    token_file: Option<PathBuf>,
    credentials: RwLock<Option<Credentials>>,
}

impl AuthSession {
    pub fn new(http: Client, endpoints: Endpoints, token_file: Option<PathBuf>) -> Self {
        Self {
            http,
            endpoints,
            token_file,
            credentials: RwLock::new(None),
        }
    }

    /// Session that sends a fixed token and never touches disk
    pub fn with_token(http: Client, endpoints: Endpoints, token: &str) -> Self {
        let session = Self::new(http, endpoints, None);
        session.set(Some(Credentials {
            token: token.to_string(),
            user: None,
        }));
        session
    }

    /// Load the stored token and confirm it with the backend.
    ///
    /// A token the backend rejects is discarded; network failures keep it so
    /// the next request can try again.
    pub async fn restore(&self) -> Result<Option<UserProfile>> {
        let token = match self.read_token_file().await? {
            Some(token) => token,
            None => return Ok(None),
        };

        match self.fetch_me(&token).await {
            Ok(user) => {
                debug!("Restored session for {}", user.email);
                self.set(Some(Credentials {
                    token,
                    user: Some(user.clone()),
                }));
                Ok(Some(user))
            }
            Err(Error::Unauthorized(reason)) => {
                warn!("Stored token rejected ({}); signing out", reason);
                self.logout().await?;
                Ok(None)
            }
            Err(e) => {
                warn!("Could not verify stored token: {}", e);
                self.set(Some(Credentials { token, user: None }));
                Ok(None)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let response = self
            .http
            .post(self.endpoints.api("auth/login")?)
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let login: LoginResponse = error_for_status(response).await?.json().await?;

        self.write_token_file(&login.token).await?;
        info!("Signed in as {}", login.user.email);
        self.set(Some(Credentials {
            token: login.token,
            user: Some(login.user.clone()),
        }));
        Ok(login.user)
    }

    /// Forget the token in memory and on disk
    pub async fn logout(&self) -> Result<()> {
        self.set(None);
        if let Some(path) = &self.token_file {
            if fs::try_exists(path).await? {
                fs::remove_file(path).await?;
            }
        }
        Ok(())
    }

    /// Fetch the current profile with the held token
    pub async fn me(&self) -> Result<UserProfile> {
        let token = self.bearer().ok_or(Error::NotSignedIn)?;
        let user = self.fetch_me(&token).await?;
        if let Some(creds) = self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            creds.user = Some(user.clone());
        }
        Ok(user)
    }

    pub fn bearer(&self) -> Option<String> {
        self.read().as_ref().map(|c| c.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().as_ref().and_then(|c| c.user.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.read().is_some()
    }

    /// Attach the bearer token, if any
    pub fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_me(&self, token: &str) -> Result<UserProfile> {
        let response = self
            .http
            .get(self.endpoints.api("auth/me")?)
            .bearer_auth(token)
            .send()
            .await?;
        Ok(error_for_status(response).await?.json().await?)
    }

    async fn read_token_file(&self) -> Result<Option<String>> {
        let Some(path) = &self.token_file else {
            return Ok(None);
        };
        if !fs::try_exists(path).await? {
            return Ok(None);
        }
        let token = fs::read_to_string(path).await?.trim().to_string();
        Ok((!token.is_empty()).then_some(token))
    }

    /// Write the token readable by the current user only
    async fn write_token_file(&self, token: &str) -> Result<()> {
        let Some(path) = &self.token_file else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(path).await?;

        // A file left by an older run keeps its mode on open
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        file.write_all(token.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    fn set(&self, credentials: Option<Credentials>) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = credentials;
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Credentials>> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
