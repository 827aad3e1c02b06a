use crate::session::{SessionEvent, SessionId, SessionObserver};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// Observer that keeps every event it sees
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionObserver for RecordingObserver {
    async fn on_event(&self, _session_id: &SessionId, event: &SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
