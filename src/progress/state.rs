//! Progress readout types and the wire shape of progress events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::debug;

/// Server-reported build status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl BuildStatus {
    /// Parse the status strings the backend is known to send.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "idle" | "pending" | "queued" => Some(BuildStatus::Idle),
            "running" | "in_progress" | "building" => Some(BuildStatus::Running),
            "completed" | "complete" | "success" | "succeeded" => Some(BuildStatus::Completed),
            "failed" | "error" | "cancelled" => Some(BuildStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Completed | BuildStatus::Failed)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStatus::Idle => "idle",
            BuildStatus::Running => "running",
            BuildStatus::Completed => "completed",
            BuildStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Latest coherent view of a server-side build
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressState {
    pub project_id: Option<String>,
    pub phase: u32,
    pub agent: String,
    pub status: BuildStatus,
    pub percent: u8,
    pub tokens_used: u64,
    /// Set when the transport has stopped delivering updates
    pub stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProgressState {
    pub fn for_project(project_id: &str) -> Self {
        Self {
            project_id: Some(project_id.to_string()),
            ..Self::default()
        }
    }

    /// Whether the server is still working on the build
    pub fn is_active(&self) -> bool {
        self.status == BuildStatus::Running
    }
}

/// One progress message; every field is optional and absent fields keep
/// their previous value.
///
/// Accepts both the push shape (`phase`, `agent`, `progress`) and the
/// project resource shape (`current_phase`, `current_agent`, `progress_percent`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(default, alias = "current_phase")]
    pub phase: Option<u32>,
    #[serde(default, alias = "current_agent")]
    pub agent: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<BuildStatus>,
    #[serde(default, alias = "progress_percent")]
    pub progress: Option<f64>,
    #[serde(default)]
    pub tokens_used: Option<u64>,
}

impl ProgressEvent {
    pub fn is_empty(&self) -> bool {
        self.phase.is_none()
            && self.agent.is_none()
            && self.status.is_none()
            && self.progress.is_none()
            && self.tokens_used.is_none()
    }

    pub fn phase(mut self, phase: u32) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn agent(mut self, agent: &str) -> Self {
        self.agent = Some(agent.to_string());
        self
    }

    pub fn status(mut self, status: BuildStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, percent: f64) -> Self {
        self.progress = Some(percent);
        self
    }

    pub fn tokens(mut self, tokens: u64) -> Self {
        self.tokens_used = Some(tokens);
        self
    }
}

/// Response body of the project status resource
#[derive(Debug, Deserialize)]
pub(crate) struct ProjectEnvelope {
    #[serde(default)]
    pub project: Option<ProgressEvent>,
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<BuildStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let parsed = BuildStatus::parse(&s);
        if parsed.is_none() {
            debug!("Ignoring unrecognised build status {:?}", s);
        }
        parsed
    }))
}
