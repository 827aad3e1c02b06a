//! Server-side build progress
//!
//! A [`ProgressReconciler`] owns the single [`ProgressState`] for the project
//! being observed. Transports ([`PushSource`] over WebSocket, [`PollSource`]
//! over the project REST resource) only deliver [`ProgressEvent`]s into it;
//! [`ProgressWatcher`] picks between them and hands back a
//! [`ProgressSubscription`] whose drop tears the transport down.

pub mod display;
pub mod poll;
pub mod push;
pub mod reconciler;
pub mod state;
pub mod transport;
pub mod watcher;

pub use display::ProgressDisplay;
pub use poll::PollSource;
pub use push::{PushSource, PushStream};
pub use reconciler::{ProgressReconciler, Reconciled};
pub use state::{BuildStatus, ProgressEvent, ProgressState};
pub use transport::{FollowOutcome, ProgressSource, TransportKind, TransportMode};
pub use watcher::{ProgressSubscription, ProgressWatcher};
