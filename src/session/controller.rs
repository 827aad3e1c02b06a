//! Session controller: serialises generation requests against the working copy

use super::events::{SessionEvent, SessionObserver};
use super::state::{ControllerState, SubmitMode, SubmitOutcome};
use super::SessionId;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::generation::{
    looks_like_source, strip_code_fences, GenerationBackend, GenerationRequest, ModelChoice,
    PromptEngine,
};
use crate::workspace::{
    FileMap, FileStore, LedgerStore, VersionEntry, VersionId, VersionLedger, DEFAULT_PRIMARY_PATH,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-session knobs
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// File that generated source is written to
    pub primary_path: String,
    pub model: ModelChoice,
    /// Bound on one submit, including any retries made by the backend client
    pub generation_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            primary_path: DEFAULT_PRIMARY_PATH.to_string(),
            model: ModelChoice::Auto,
            generation_timeout: Duration::from_secs(60),
        }
    }
}

impl SessionOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            primary_path: config.primary_path.clone(),
            model: config.model.clone(),
            generation_timeout: config.generation_timeout,
        }
    }
}

/// Owns the working copy and version ledger of one build session.
///
/// At most one generation request is in flight. While it is, `submit`,
/// `restore` and `edit_file` are rejected with [`Error::SessionBusy`]. Nothing
/// touches the files or the ledger until a response has been accepted, so a
/// failed or abandoned request leaves both exactly as they were.
pub struct SessionController {
    id: SessionId,
    backend: Arc<dyn GenerationBackend>,
    prompts: PromptEngine,
    options: SessionOptions,
    files: FileStore,
    ledger: VersionLedger,
    ledger_store: Option<Arc<dyn LedgerStore>>,
    state: Mutex<ControllerState>,
    observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
}

impl SessionController {
    /// New session on the starter template
    pub fn new(backend: Arc<dyn GenerationBackend>, options: SessionOptions) -> Result<Self> {
        Ok(Self {
            id: SessionId::new(),
            backend,
            prompts: PromptEngine::new()?,
            options,
            files: FileStore::new(FileMap::default_template()),
            ledger: VersionLedger::new(),
            ledger_store: None,
            state: Mutex::new(ControllerState::Idle),
            observers: RwLock::new(Vec::new()),
        })
    }

    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    /// Start from `files` instead of the starter template
    pub fn with_files(self, files: FileMap) -> Self {
        self.files.replace_all(files);
        self
    }

    pub fn with_prompts(mut self, prompts: PromptEngine) -> Self {
        self.prompts = prompts;
        self
    }

    /// Mirror every new version into `store`
    pub fn with_ledger_store(mut self, store: Arc<dyn LedgerStore>) -> Self {
        self.ledger_store = Some(store);
        self
    }

    /// Rebuild the ledger from the attached store and check out its newest
    /// version. Without a store, or with an empty one, nothing changes.
    pub async fn load_history(self) -> Result<Self> {
        let Some(store) = self.ledger_store.clone() else {
            return Ok(self);
        };

        let ledger = VersionLedger::replay(store.as_ref()).await?;
        if let Some(current) = ledger.current() {
            info!("Resuming at {} ({} versions)", current.id, ledger.len());
            self.files.replace_all(current.files.clone());
        }
        Ok(Self { ledger, ..self })
    }

    pub fn add_observer(&self, observer: Arc<dyn SessionObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn state(&self) -> ControllerState {
        self.lock_state().clone()
    }

    pub fn files(&self) -> Arc<FileMap> {
        self.files.snapshot()
    }

    pub fn file(&self, path: &str) -> Result<String> {
        self.files.get(path)
    }

    /// Versions, newest first
    pub fn history(&self) -> Vec<Arc<VersionEntry>> {
        self.ledger.list()
    }

    pub fn current_version(&self) -> Option<Arc<VersionEntry>> {
        self.ledger.current()
    }

    /// All files of the working copy as one text document
    pub fn export_bundle(&self) -> String {
        self.files.snapshot().to_bundle()
    }

    /// Send `instruction` to the generation backend and apply the result.
    ///
    /// `Err` means the submit was refused (empty, busy, unusable prompt
    /// template). A request that was sent always yields `Ok`, with generation
    /// failures reported as [`SubmitOutcome::Failed`].
    pub async fn submit(&self, instruction: &str) -> Result<SubmitOutcome> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(Error::EmptyInstruction);
        }

        let guard = InFlight::acquire(&self.state)?;
        let mode = if self.ledger.is_empty() {
            SubmitMode::Build
        } else {
            SubmitMode::Modify
        };

        let path = self.options.primary_path.as_str();
        let message = match mode {
            SubmitMode::Build => self.prompts.render_build(instruction, path)?,
            SubmitMode::Modify => {
                let base = self.files.snapshot();
                self.prompts
                    .render_modify(instruction, path, base.get(path).unwrap_or_default())?
            }
        };

        self.notify(SessionEvent::Submitted {
            instruction: instruction.to_string(),
            mode,
        })
        .await;

        let request = GenerationRequest {
            message,
            session_id: self.id.to_string(),
            model: self.options.model.clone(),
        };
        let limit = self.options.generation_timeout;
        let result = match tokio::time::timeout(limit, self.backend.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(limit)),
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let message = e.to_string();
                let retryable = e.is_retryable();
                warn!("Generation for {} failed: {}", self.id, message);
                guard.set(ControllerState::Failed {
                    message: message.clone(),
                });
                self.notify(SessionEvent::Failed {
                    message: message.clone(),
                    retryable,
                })
                .await;
                return Ok(SubmitOutcome::Failed { message, retryable });
            }
        };

        let text = strip_code_fences(&response.response);
        if !looks_like_source(&text) {
            debug!("Response for {} is not source, leaving files alone", self.id);
            self.notify(SessionEvent::ChatReply { text: text.clone() })
                .await;
            return Ok(SubmitOutcome::ChatReply { text });
        }

        let entry = {
            let mut state = self.lock_state();
            *state = ControllerState::ApplyingResult;
            let next = self.files.snapshot().with_file(path, &text);
            self.files.replace_all(next);
            self.ledger.append(instruction, &self.files.snapshot())
        };
        self.persist(&entry).await;

        info!(
            "Applied {} ({}) via {}",
            entry.id,
            mode,
            response.model_used.as_deref().unwrap_or("unknown model")
        );
        self.notify(SessionEvent::Applied {
            version: entry.id.clone(),
            model_used: response.model_used.clone(),
        })
        .await;

        drop(guard);
        Ok(SubmitOutcome::Applied {
            version: entry.id.clone(),
            mode,
            model_used: response.model_used,
        })
    }

    /// Check out a stored version. Newer versions stay in the ledger.
    pub async fn restore(&self, id: &VersionId) -> Result<FileMap> {
        let files = {
            let state = self.lock_state();
            if state.is_busy() {
                return Err(Error::SessionBusy);
            }
            let files = self.ledger.restore(id)?;
            self.files.replace_all(files.clone());
            files
        };

        self.notify(SessionEvent::Restored { version: id.clone() })
            .await;
        Ok(files)
    }

    /// Direct edit of one file. Does not create a version.
    pub async fn edit_file(&self, path: &str, content: &str) -> Result<()> {
        {
            let state = self.lock_state();
            if state.is_busy() {
                return Err(Error::SessionBusy);
            }
            self.files.set_file(path, content);
        }

        self.notify(SessionEvent::FileEdited {
            path: path.to_string(),
        })
        .await;
        Ok(())
    }

    /// Record the working copy as-is, e.g. after manual edits
    pub async fn checkpoint(&self, label: &str) -> Result<Arc<VersionEntry>> {
        let label = match label.trim() {
            "" => "checkpoint",
            label => label,
        };

        let entry = {
            let state = self.lock_state();
            if state.is_busy() {
                return Err(Error::SessionBusy);
            }
            self.ledger.append(label, &self.files.snapshot())
        };
        self.persist(&entry).await;

        self.notify(SessionEvent::Checkpointed {
            version: entry.id.clone(),
            label: label.to_string(),
        })
        .await;
        Ok(entry)
    }

    async fn persist(&self, entry: &VersionEntry) {
        if let Some(store) = &self.ledger_store {
            if let Err(e) = store.append(entry).await {
                warn!("Failed to persist version {}: {}", entry.id, e);
            }
        }
    }

    async fn notify(&self, event: SessionEvent) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_event(&self.id, &event).await;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Claim on the single in-flight slot. Dropping it, including when the
/// submit future itself is dropped, puts the controller back to `Idle`.
struct InFlight<'a> {
    state: &'a Mutex<ControllerState>,
}

impl<'a> InFlight<'a> {
    fn acquire(state: &'a Mutex<ControllerState>) -> Result<Self> {
        let mut current = state.lock().unwrap_or_else(PoisonError::into_inner);
        if current.is_busy() {
            return Err(Error::SessionBusy);
        }
        *current = ControllerState::Submitting;
        Ok(Self { state })
    }

    fn set(&self, next: ControllerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // Busy states are only ever entered through this guard, so a busy
        // state here is ours to release
        if current.is_busy() {
            *current = ControllerState::Idle;
        }
    }
}
