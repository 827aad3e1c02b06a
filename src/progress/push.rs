//! WebSocket progress transport

use super::reconciler::{ProgressReconciler, Reconciled};
use super::state::ProgressEvent;
use super::transport::{FollowOutcome, ProgressSource, TransportKind};
use crate::api::Endpoints;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

/// Streams progress from `<root>/ws/projects/<id>/progress`
#[derive(Debug, Clone)]
pub struct PushSource {
    endpoints: Endpoints,
}

impl PushSource {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }

    pub fn endpoint(&self, project_id: &str) -> Result<Url> {
        self.endpoints
            .ws(&format!("ws/projects/{project_id}/progress"))
    }

    /// Open the socket. Failure here means push is unavailable for this project.
    pub async fn connect(&self, project_id: &str) -> Result<PushStream> {
        let url = self.endpoint(project_id)?;
        debug!("Connecting to progress socket {}", url);
        let (stream, _response) = connect_async(url.as_str()).await?;
        Ok(PushStream { inner: stream })
    }
}

#[async_trait]
impl ProgressSource for PushSource {
    fn kind(&self) -> TransportKind {
        TransportKind::Push
    }

    async fn follow(
        &self,
        project_id: &str,
        reconciler: &ProgressReconciler,
    ) -> Result<FollowOutcome> {
        self.connect(project_id).await?.follow(reconciler).await
    }
}

/// An open progress socket
pub struct PushStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl PushStream {
    /// Read frames into `reconciler` until a terminal status or the socket closes.
    ///
    /// Pings are answered by tungstenite while reading. A connection that drops
    /// without a close frame is an [`Error::Transport`].
    pub async fn follow(mut self, reconciler: &ProgressReconciler) -> Result<FollowOutcome> {
        while let Some(frame) = self.inner.next().await {
            let frame =
                frame.map_err(|e| Error::Transport(format!("progress socket read failed: {e}")))?;
            let text = match frame {
                WsMessage::Text(text) => text.as_str().to_owned(),
                WsMessage::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                WsMessage::Close(frame) => {
                    debug!(?frame, "Progress socket closed by server");
                    break;
                }
                _ => continue,
            };

            apply_frame(&text, reconciler);
            if reconciler.is_terminal() {
                if let Err(e) = self.inner.close(None).await {
                    debug!("Closing progress socket: {}", e);
                }
                return Ok(FollowOutcome::Terminal);
            }
        }

        Ok(if reconciler.is_terminal() {
            FollowOutcome::Terminal
        } else {
            FollowOutcome::Disconnected
        })
    }
}

fn apply_frame(text: &str, reconciler: &ProgressReconciler) -> Option<Reconciled> {
    match serde_json::from_str::<ProgressEvent>(text) {
        Ok(event) => Some(reconciler.apply(&event)),
        Err(e) => {
            warn!("Skipping malformed progress frame: {}", e);
            None
        }
    }
}
