//! Fixed-interval polling of the project status resource

use super::reconciler::ProgressReconciler;
use super::transport::{FollowOutcome, ProgressSource, TransportKind};
use crate::api::ProjectsClient;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

pub struct PollSource {
    projects: Arc<ProjectsClient>,
    interval: Duration,
    max_failures: u32,
}

impl PollSource {
    pub fn new(projects: Arc<ProjectsClient>, interval: Duration, max_failures: u32) -> Self {
        Self {
            projects,
            interval,
            max_failures: max_failures.max(1),
        }
    }
}

#[async_trait]
impl ProgressSource for PollSource {
    fn kind(&self) -> TransportKind {
        TransportKind::Poll
    }

    /// Poll until the reconciler is terminal. Consecutive failures past the
    /// threshold mark the readout stale; polling itself only ends on a
    /// terminal status or when the owning task is aborted.
    async fn follow(
        &self,
        project_id: &str,
        reconciler: &ProgressReconciler,
    ) -> Result<FollowOutcome> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures = 0u32;

        while !reconciler.is_terminal() {
            ticker.tick().await;

            match self.projects.status(project_id).await {
                Ok(Some(event)) => {
                    failures = 0;
                    reconciler.apply(&event);
                }
                Ok(None) => debug!("Status for {} carried no project", project_id),
                Err(e) => {
                    failures += 1;
                    warn!(
                        "Progress poll for {} failed ({} in a row): {}",
                        project_id, failures, e
                    );
                    if failures >= self.max_failures {
                        reconciler.mark_stale();
                    }
                }
            }
        }

        Ok(FollowOutcome::Terminal)
    }
}
