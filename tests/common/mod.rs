//! Common test utilities and helpers
#![allow(dead_code)]

use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use axum::Router;
use crucibai::api::{Endpoints, ProjectsClient};
use crucibai::auth::AuthSession;
use crucibai::progress::{PollSource, ProgressWatcher, PushSource, TransportMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Serve `app` on an ephemeral local port; returns the base URL
pub async fn serve(app: Router) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

pub fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client builds")
}

pub fn anonymous(base: &str) -> Result<(Endpoints, Arc<AuthSession>)> {
    let endpoints = Endpoints::new(base)?;
    let auth = Arc::new(AuthSession::new(http(), endpoints.clone(), None));
    Ok((endpoints, auth))
}

pub fn projects_client(base: &str) -> Result<Arc<ProjectsClient>> {
    let (endpoints, auth) = anonymous(base)?;
    Ok(Arc::new(ProjectsClient::new(http(), endpoints, auth)))
}

/// Watcher against `base` with test-friendly timings
pub fn watcher(
    base: &str,
    mode: TransportMode,
    poll_interval: Duration,
    max_poll_failures: u32,
) -> Result<ProgressWatcher> {
    let push = PushSource::new(Endpoints::new(base)?);
    let poll = PollSource::new(projects_client(base)?, poll_interval, max_poll_failures);
    Ok(ProgressWatcher::new(push, poll, mode).with_connect_timeout(Duration::from_secs(2)))
}

/// Shared request counter for handlers
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    /// Count a request and return its 0-based index
    pub fn record(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Send `frames` as text, then either close or wait for the client to hang up
pub async fn play_frames(mut socket: WebSocket, frames: Vec<String>, close: bool) {
    for frame in frames {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }

    if close {
        let _ = socket.send(Message::Close(None)).await;
    } else {
        while let Some(Ok(message)) = socket.recv().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    }
}
