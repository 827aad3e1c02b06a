//! Strategy interface for progress transports

use super::reconciler::ProgressReconciler;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concrete transport in use for an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Push,
    Poll,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Push => f.write_str("push"),
            TransportKind::Poll => f.write_str("poll"),
        }
    }
}

/// Which transports the watcher may use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Try push, fall back to polling
    #[default]
    Auto,
    Push,
    Poll,
}

impl FromStr for TransportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(TransportMode::Auto),
            "push" | "websocket" | "ws" => Ok(TransportMode::Push),
            "poll" | "polling" => Ok(TransportMode::Poll),
            other => Err(Error::Config(format!("unknown progress transport: {other}"))),
        }
    }
}

/// How a transport stopped following a build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// Reconciler reached completed/failed
    Terminal,
    /// Stream ended before a terminal status
    Disconnected,
}

/// A way of feeding server progress into a reconciler
#[async_trait]
pub trait ProgressSource: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Deliver events for `project_id` until terminal or the transport gives out
    async fn follow(
        &self,
        project_id: &str,
        reconciler: &ProgressReconciler,
    ) -> Result<FollowOutcome>;
}
