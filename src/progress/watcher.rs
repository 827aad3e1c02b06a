//! Chooses a progress transport for a project and owns its background task

use super::poll::PollSource;
use super::push::{PushSource, PushStream};
use super::reconciler::ProgressReconciler;
use super::state::ProgressState;
use super::transport::{FollowOutcome, ProgressSource, TransportKind, TransportMode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct ProgressWatcher {
    push: Arc<PushSource>,
    poll: Arc<PollSource>,
    mode: TransportMode,
    connect_timeout: Duration,
}

impl ProgressWatcher {
    pub fn new(push: PushSource, poll: PollSource, mode: TransportMode) -> Self {
        Self {
            push: Arc::new(push),
            poll: Arc::new(poll),
            mode,
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Observe `project_id` with a fresh reconciler
    pub fn start(&self, project_id: &str) -> ProgressSubscription {
        self.start_with(project_id, Arc::new(ProgressReconciler::new()))
    }

    /// Observe `project_id`, resetting and feeding the given reconciler
    pub fn start_with(
        &self,
        project_id: &str,
        reconciler: Arc<ProgressReconciler>,
    ) -> ProgressSubscription {
        reconciler.observe(project_id);
        let (kind_tx, kind_rx) = watch::channel(None);

        let task = tokio::spawn(run(
            self.push.clone(),
            self.poll.clone(),
            self.mode,
            self.connect_timeout,
            project_id.to_string(),
            reconciler.clone(),
            kind_tx,
        ));

        ProgressSubscription {
            receiver: reconciler.subscribe(),
            reconciler,
            transport: kind_rx,
            task,
            finished: false,
        }
    }
}

async fn run(
    push: Arc<PushSource>,
    poll: Arc<PollSource>,
    mode: TransportMode,
    connect_timeout: Duration,
    project_id: String,
    reconciler: Arc<ProgressReconciler>,
    kind: watch::Sender<Option<TransportKind>>,
) {
    if mode != TransportMode::Poll {
        if let Some(stream) = try_push(&push, &project_id, connect_timeout).await {
            kind.send_replace(Some(TransportKind::Push));
            match stream.follow(&reconciler).await {
                Ok(FollowOutcome::Terminal) => return,
                Ok(FollowOutcome::Disconnected) => {
                    warn!("Progress socket for {} closed before the build finished", project_id)
                }
                Err(e) => warn!("Progress socket for {} failed: {}", project_id, e),
            }
        }

        if mode == TransportMode::Push {
            reconciler.mark_stale();
            return;
        }
        info!("Falling back to polling for {}", project_id);
    }

    kind.send_replace(Some(TransportKind::Poll));
    if let Err(e) = poll.follow(&project_id, &reconciler).await {
        warn!("Polling for {} stopped: {}", project_id, e);
        reconciler.mark_stale();
    }
}

/// Push is usable if the socket opens in time
async fn try_push(push: &PushSource, project_id: &str, limit: Duration) -> Option<PushStream> {
    match tokio::time::timeout(limit, push.connect(project_id)).await {
        Ok(Ok(stream)) => Some(stream),
        Ok(Err(e)) => {
            debug!("Push progress unavailable for {}: {}", project_id, e);
            None
        }
        Err(_) => {
            debug!("Push progress connect for {} timed out", project_id);
            None
        }
    }
}

/// Live handle on one observation. Dropping it stops the transport.
pub struct ProgressSubscription {
    reconciler: Arc<ProgressReconciler>,
    receiver: watch::Receiver<ProgressState>,
    transport: watch::Receiver<Option<TransportKind>>,
    task: JoinHandle<()>,
    finished: bool,
}

impl ProgressSubscription {
    pub fn receiver(&self) -> watch::Receiver<ProgressState> {
        self.receiver.clone()
    }

    pub fn state(&self) -> ProgressState {
        self.reconciler.snapshot()
    }

    /// Transport currently feeding the readout, once one has been chosen
    pub fn transport(&self) -> Option<TransportKind> {
        *self.transport.borrow()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Resolve once the build is terminal or the transport has given up
    pub async fn wait_terminal(&mut self) -> ProgressState {
        if !self.finished {
            let mut rx = self.receiver.clone();
            tokio::select! {
                _ = rx.wait_for(|s| s.status.is_terminal()) => {}
                _ = &mut self.task => self.finished = true,
            }
        }
        self.reconciler.snapshot()
    }

    /// Tear down the socket or poll loop
    pub fn close(self) {}
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
