use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("A generation request is already in flight for this session")]
    SessionBusy,

    #[error("Instruction is empty")]
    EmptyInstruction,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Progress transport error: {0}")]
    Transport(String),

    #[error("No deploy snapshot for project {0}")]
    NoDeploySnapshot(String),

    #[error("Deploy provider token missing: {0}")]
    DeployTokenMissing(String),

    #[error("Ledger store error: {0}")]
    Ledger(String),
}

impl Error {
    /// Whether a retry of the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::Transport(_) => true,
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            Error::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
