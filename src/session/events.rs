//! Session notifications

use super::state::SubmitMode;
use super::SessionId;
use crate::workspace::VersionId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Events that can occur during a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Instruction accepted and sent to the backend
    Submitted { instruction: String, mode: SubmitMode },
    /// Generated source applied as a new version
    Applied {
        version: VersionId,
        model_used: Option<String>,
    },
    /// Backend answered with prose instead of source
    ChatReply { text: String },
    /// Generation failed or timed out
    Failed { message: String, retryable: bool },
    /// Working copy replaced by a stored version
    Restored { version: VersionId },
    /// Working copy snapshotted on request
    Checkpointed { version: VersionId, label: String },
    /// Single file edited directly
    FileEdited { path: String },
}

impl SessionEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::Submitted { instruction, mode } => {
                format!("Submitted ({mode}): {instruction}")
            }
            SessionEvent::Applied {
                version,
                model_used,
            } => format!(
                "Applied {} using {}",
                version,
                model_used.as_deref().unwrap_or("unknown model")
            ),
            SessionEvent::ChatReply { .. } => "Received a chat reply".to_string(),
            SessionEvent::Failed { message, .. } => format!("Generation failed: {message}"),
            SessionEvent::Restored { version } => format!("Restored {version}"),
            SessionEvent::Checkpointed { version, label } => {
                format!("Checkpoint {version}: {label}")
            }
            SessionEvent::FileEdited { path } => format!("Edited {path}"),
        }
    }

    /// Whether the event ended a submit
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::Applied { .. }
                | SessionEvent::ChatReply { .. }
                | SessionEvent::Failed { .. }
        )
    }
}

/// Event with timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub timestamp: DateTime<Utc>,
    pub event: SessionEvent,
}

impl TimestampedEvent {
    pub fn new(event: SessionEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Observer for session events
#[async_trait]
pub trait SessionObserver: Send + Sync {
    /// Called when an event occurs
    async fn on_event(&self, session_id: &SessionId, event: &SessionEvent);
}

/// Logging observer implementation
pub struct LoggingObserver;

#[async_trait]
impl SessionObserver for LoggingObserver {
    async fn on_event(&self, session_id: &SessionId, event: &SessionEvent) {
        match event {
            SessionEvent::Failed { .. } => warn!(session = %session_id, "{}", event.description()),
            _ => info!(session = %session_id, "{}", event.description()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_descriptions() {
        let event = SessionEvent::Submitted {
            instruction: "add a navbar".to_string(),
            mode: SubmitMode::Modify,
        };
        assert_eq!(event.description(), "Submitted (modify): add a navbar");

        let event = SessionEvent::Applied {
            version: VersionId::from_string("v0-1".to_string()),
            model_used: None,
        };
        assert_eq!(event.description(), "Applied v0-1 using unknown model");
    }

    #[test]
    fn test_terminal_events() {
        assert!(SessionEvent::ChatReply {
            text: "hi".to_string()
        }
        .is_terminal());
        assert!(!SessionEvent::FileEdited {
            path: "src/App.jsx".to_string()
        }
        .is_terminal());
    }

    #[test]
    fn test_timestamped_event() {
        let before = Utc::now();
        let stamped = TimestampedEvent::new(SessionEvent::FileEdited {
            path: "a".to_string(),
        });
        assert!(stamped.timestamp >= before);
    }
}
