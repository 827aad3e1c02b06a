//! Mock implementations for testing
//!
//! Stand-ins for the generation backend and session observers so the session
//! state machine can be driven without a network.

pub mod generation;
pub mod observer;

pub use generation::{MockGenerationBackend, MockGenerationBackendBuilder};
pub use observer::RecordingObserver;
