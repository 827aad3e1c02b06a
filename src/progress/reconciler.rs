//! Turns a noisy progress stream into a monotonic readout

use super::state::{ProgressEvent, ProgressState};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, trace};

/// What happened to an event handed to [`ProgressReconciler::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Applied,
    /// Phase lower than the one already shown
    StalePhase,
    /// Observation already reached completed/failed
    Terminal,
    /// Event carried no fields
    Empty,
}

/// Merges progress events into a [`ProgressState`] and publishes it.
///
/// Events older than the current phase are dropped, and once a terminal
/// status has been seen nothing changes until [`observe`](Self::observe)
/// starts a new observation.
#[derive(Debug)]
pub struct ProgressReconciler {
    tx: watch::Sender<ProgressState>,
}

impl Default for ProgressReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReconciler {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ProgressState::default());
        Self { tx }
    }

    /// Start observing a (new or rebuilt) project, discarding prior state
    pub fn observe(&self, project_id: &str) {
        debug!("Observing build progress for project {}", project_id);
        self.tx.send_replace(ProgressState::for_project(project_id));
    }

    pub fn apply(&self, event: &ProgressEvent) -> Reconciled {
        let mut outcome = Reconciled::Empty;
        self.tx.send_if_modified(|state| {
            outcome = merge(state, event);
            outcome == Reconciled::Applied
        });
        trace!(?event, ?outcome, "Reconciled progress event");
        outcome
    }

    /// Flag the readout as no longer live; ignored once terminal
    pub fn mark_stale(&self) {
        self.tx.send_if_modified(|state| {
            if state.status.is_terminal() || state.stale {
                return false;
            }
            state.stale = true;
            true
        });
    }

    pub fn snapshot(&self) -> ProgressState {
        self.tx.borrow().clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.tx.borrow().status.is_terminal()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }
}

fn merge(state: &mut ProgressState, event: &ProgressEvent) -> Reconciled {
    if state.status.is_terminal() {
        return Reconciled::Terminal;
    }
    if matches!(event.phase, Some(phase) if phase < state.phase) {
        return Reconciled::StalePhase;
    }
    if event.is_empty() {
        return Reconciled::Empty;
    }

    if let Some(phase) = event.phase {
        state.phase = phase;
    }
    if let Some(agent) = &event.agent {
        state.agent = agent.clone();
    }
    if let Some(status) = event.status {
        state.status = status;
    }
    if let Some(progress) = event.progress {
        state.percent = clamp_percent(progress);
    }
    if let Some(tokens) = event.tokens_used {
        state.tokens_used = tokens;
    }
    state.stale = false;
    state.updated_at = Some(Utc::now());
    Reconciled::Applied
}

fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
