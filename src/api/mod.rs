//! REST plumbing shared by every backend client

pub mod projects;

pub use projects::{DeployProvider, DeployResult, ProjectsClient};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use reqwest::{Client, Response, StatusCode};
use url::Url;

/// Resolves REST and WebSocket addresses against the backend root.
///
/// The root may be given with or without the trailing `/api` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    root: Url,
}

impl Endpoints {
    pub fn new(base: &str) -> Result<Self> {
        let trimmed = base.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix("/api").unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(Error::Config("api_url is empty".to_string()));
        }

        let root = Url::parse(&format!("{trimmed}/"))?;
        match root.scheme() {
            "http" | "https" => Ok(Self { root }),
            other => Err(Error::Config(format!(
                "api_url must use http or https, got {other}"
            ))),
        }
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    /// `<root>/api/<path>`
    pub fn api(&self, path: &str) -> Result<Url> {
        Ok(self
            .root
            .join("api/")?
            .join(path.trim_start_matches('/'))?)
    }

    /// `<root>/<path>` with `http`/`https` swapped for `ws`/`wss`
    pub fn ws(&self, path: &str) -> Result<Url> {
        let mut url = self.root.join(path.trim_start_matches('/'))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| Error::Config(format!("cannot derive websocket url from {url}")))?;
        Ok(url)
    }
}

/// HTTP client whose per-attempt timeout is `config.request_timeout`
pub fn http_client(config: &ClientConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("crucibai/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))
}

/// Pass 2xx responses through; turn anything else into a typed error,
/// preferring the backend's `detail` message.
pub(crate) async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = detail_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body
        }
    });

    match status {
        StatusCode::UNAUTHORIZED => Err(Error::Unauthorized(message)),
        _ => Err(Error::Api {
            status: status.as_u16(),
            message,
        }),
    }
}

fn detail_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_strip_api_suffix() {
        let a = Endpoints::new("https://crucib.ai/api/").unwrap();
        let b = Endpoints::new("https://crucib.ai").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.api("/ai/chat").unwrap().as_str(),
            "https://crucib.ai/api/ai/chat"
        );
    }

    #[test]
    fn test_endpoints_keep_path_prefix() {
        let e = Endpoints::new("http://localhost:8000/backend").unwrap();
        assert_eq!(
            e.api("projects/p1").unwrap().as_str(),
            "http://localhost:8000/backend/api/projects/p1"
        );
        assert_eq!(
            e.ws("ws/projects/p1/progress").unwrap().as_str(),
            "ws://localhost:8000/backend/ws/projects/p1/progress"
        );
    }

    #[test]
    fn test_ws_scheme_follows_tls() {
        let e = Endpoints::new("https://crucib.ai").unwrap();
        assert_eq!(
            e.ws("/ws/projects/p1/progress").unwrap().scheme(),
            "wss"
        );
    }

    #[test]
    fn test_endpoints_reject_bad_scheme() {
        assert!(matches!(
            Endpoints::new("ftp://crucib.ai"),
            Err(Error::Config(_))
        ));
        assert!(matches!(Endpoints::new("  "), Err(Error::Config(_))));
    }

    #[test]
    fn test_detail_message() {
        assert_eq!(
            detail_message(r#"{"detail": "Project not found"}"#).as_deref(),
            Some("Project not found")
        );
        assert_eq!(detail_message("<html>oops</html>"), None);
    }
}
