//! Version history of the working copy with non-destructive restore

use super::files::FileMap;
use super::store::LedgerStore;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Unique, time-ordered identifier of a version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId(String);

impl VersionId {
    fn generate(sequence: u64, at: DateTime<Utc>) -> Self {
        Self(format!("v{sequence}-{}", at.timestamp_millis()))
    }

    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One immutable, restorable state of the working copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub id: VersionId,
    pub sequence: u64,
    pub instruction: String,
    pub files: FileMap,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    /// Newest first
    entries: VecDeque<Arc<VersionEntry>>,
    current: Option<VersionId>,
    next_sequence: u64,
}

/// Append-only, newest-first log of file map snapshots
#[derive(Debug, Default)]
pub struct VersionLedger {
    inner: RwLock<LedgerInner>,
}

impl VersionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from a persisted log. The newest entry becomes current.
    pub async fn replay(store: &dyn LedgerStore) -> Result<Self> {
        let mut inner = LedgerInner::default();
        for entry in store.load().await? {
            inner.next_sequence = inner.next_sequence.max(entry.sequence + 1);
            inner.current = Some(entry.id.clone());
            inner.entries.push_front(Arc::new(entry));
        }
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Record a copy of `files` produced by `instruction`; the new entry becomes current.
    pub fn append(&self, instruction: &str, files: &FileMap) -> Arc<VersionEntry> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let created_at = Utc::now();
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        let entry = Arc::new(VersionEntry {
            id: VersionId::generate(sequence, created_at),
            sequence,
            instruction: instruction.to_string(),
            files: files.clone(),
            created_at,
        });
        inner.current = Some(entry.id.clone());
        inner.entries.push_front(entry.clone());
        entry
    }

    /// Copy of the snapshot stored under `id`, which becomes current.
    ///
    /// Later entries are kept, so restoring a newer id acts as redo.
    pub fn restore(&self, id: &VersionId) -> Result<FileMap> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let files = inner
            .entries
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.files.clone())
            .ok_or_else(|| Error::VersionNotFound(id.to_string()))?;
        inner.current = Some(id.clone());
        Ok(files)
    }

    /// All entries, newest first
    pub fn list(&self) -> Vec<Arc<VersionEntry>> {
        self.read().entries.iter().cloned().collect()
    }

    pub fn get(&self, id: &VersionId) -> Option<Arc<VersionEntry>> {
        self.read().entries.iter().find(|e| &e.id == id).cloned()
    }

    pub fn current(&self) -> Option<Arc<VersionEntry>> {
        let inner = self.read();
        let id = inner.current.as_ref()?;
        inner.entries.iter().find(|e| &e.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, LedgerInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::store::InMemoryLedgerStore;

    fn files(content: &str) -> FileMap {
        [("src/App.jsx", content)].into_iter().collect()
    }

    #[test]
    fn test_append_is_newest_first() {
        let ledger = VersionLedger::new();
        let v1 = ledger.append("build a todo app", &files("const a = 1;"));
        let v2 = ledger.append("add dark mode", &files("const a = 2;"));

        let ids: Vec<_> = ledger.list().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec![v2.id.clone(), v1.id.clone()]);
        assert_eq!(ledger.current().unwrap().id, v2.id);
        assert!(v1.sequence < v2.sequence);
    }

    #[test]
    fn test_append_copies_input() {
        let ledger = VersionLedger::new();
        let mut live = files("const a = 1;");
        let entry = ledger.append("build", &live);

        live.insert("src/App.jsx", "mutated");

        assert_eq!(entry.files.get("src/App.jsx"), Some("const a = 1;"));
        assert_eq!(
            ledger.list()[0].files.get("src/App.jsx"),
            Some("const a = 1;")
        );
    }

    #[test]
    fn test_restore_is_non_destructive() {
        let ledger = VersionLedger::new();
        let v1 = ledger.append("one", &files("const one = 1;"));
        let v2 = ledger.append("two", &files("const two = 2;"));

        let restored = ledger.restore(&v1.id).unwrap();
        assert_eq!(restored, v1.files);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.current().unwrap().id, v1.id);

        // Redo by restoring the newer entry
        let redone = ledger.restore(&v2.id).unwrap();
        assert_eq!(redone, v2.files);
    }

    #[test]
    fn test_restore_twice_is_idempotent() {
        let ledger = VersionLedger::new();
        let v1 = ledger.append("one", &files("const one = 1;"));

        let first = ledger.restore(&v1.id).unwrap();
        let second = ledger.restore(&v1.id).unwrap();
        assert_eq!(first, second);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_restore_unknown_id() {
        let ledger = VersionLedger::new();
        let v1 = ledger.append("one", &files("const one = 1;"));

        let err = ledger
            .restore(&VersionId::from_string("v99-0".into()))
            .unwrap_err();
        assert!(matches!(err, Error::VersionNotFound(_)));
        assert_eq!(ledger.current().unwrap().id, v1.id);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_list_is_restartable() {
        let ledger = VersionLedger::new();
        ledger.append("one", &files("const one = 1;"));
        assert_eq!(ledger.list(), ledger.list());
    }

    #[tokio::test]
    async fn test_replay_restores_order_and_sequence() {
        let store = InMemoryLedgerStore::new();
        let source = VersionLedger::new();
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            let entry = source.append(text, &files(&format!("const n = {i};")));
            store.append(&entry).await.unwrap();
        }

        let ledger = VersionLedger::replay(&store).await.unwrap();
        assert_eq!(ledger.list(), source.list());
        assert_eq!(ledger.current().unwrap().instruction, "three");

        let next = ledger.append("four", &files("const n = 4;"));
        assert_eq!(next.sequence, 3);
    }
}
