//! Build session: one working copy, its version history and the single
//! in-flight generation request that may change them.

pub mod controller;
pub mod events;
pub mod state;

pub use controller::{SessionController, SessionOptions};
pub use events::{LoggingObserver, SessionEvent, SessionObserver, TimestampedEvent};
pub use state::{ControllerState, SubmitMode, SubmitOutcome};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier sent with every generation request of a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("workspace_{}", Uuid::new_v4()))
    }

    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("workspace_"));
    }
}
