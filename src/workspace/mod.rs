//! Generated project state: the live file map and its version history

pub mod files;
pub mod ledger;
pub mod store;

pub use files::{FileMap, FileStore, DEFAULT_PRIMARY_PATH};
pub use ledger::{VersionEntry, VersionId, VersionLedger};
pub use store::{InMemoryLedgerStore, JsonlLedgerStore, LedgerStore};
