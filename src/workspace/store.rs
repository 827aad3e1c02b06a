//! Append-only backends for the version ledger

use super::ledger::VersionEntry;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Append-only log of version entries
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persist one entry after the existing ones
    async fn append(&self, entry: &VersionEntry) -> Result<()>;

    /// All entries, oldest first
    async fn load(&self) -> Result<Vec<VersionEntry>>;
}

/// Keeps entries in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    entries: std::sync::Mutex<Vec<VersionEntry>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: &VersionEntry) -> Result<()> {
        self.entries
            .lock()
            .map_err(|e| Error::Ledger(e.to_string()))?
            .push(entry.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<VersionEntry>> {
        Ok(self
            .entries
            .lock()
            .map_err(|e| Error::Ledger(e.to_string()))?
            .clone())
    }
}

/// One JSON document per line, only ever appended to
pub struct JsonlLedgerStore {
    path: PathBuf,
}

impl JsonlLedgerStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl LedgerStore for JsonlLedgerStore {
    async fn append(&self, entry: &VersionEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn load(&self) -> Result<Vec<VersionEntry>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        let mut entries = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(line).map_err(|e| {
                Error::Ledger(format!(
                    "{}:{}: {}",
                    self.path.display(),
                    index + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
