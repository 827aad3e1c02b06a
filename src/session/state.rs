//! Controller state machine types

use crate::workspace::VersionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the controller is in the submit cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ControllerState {
    #[default]
    Idle,
    /// A generation request is outstanding
    Submitting,
    /// The response is being written into the working copy and ledger
    ApplyingResult,
    /// Last request failed and observers are being told; still holds the
    /// in-flight slot and returns to `Idle` once the report is done
    Failed { message: String },
}

impl ControllerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ControllerState::Idle)
    }

    /// Whether a submit owns the controller. Every non-idle state counts.
    pub fn is_busy(&self) -> bool {
        !self.is_idle()
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Idle => f.write_str("idle"),
            ControllerState::Submitting => f.write_str("submitting"),
            ControllerState::ApplyingResult => f.write_str("applying result"),
            ControllerState::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

/// Whether an instruction creates the project or changes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    /// No version exists yet
    Build,
    /// Existing primary file is sent along with the instruction
    Modify,
}

impl fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitMode::Build => f.write_str("build"),
            SubmitMode::Modify => f.write_str("modify"),
        }
    }
}

/// Result of an accepted submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Generated source replaced the primary file and a version was recorded
    Applied {
        version: VersionId,
        mode: SubmitMode,
        model_used: Option<String>,
    },
    /// Response did not look like source; files untouched
    ChatReply { text: String },
    /// Request failed or timed out; files and ledger untouched
    Failed { message: String, retryable: bool },
}

impl SubmitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SubmitOutcome::Applied { .. })
    }
}
