//! Testing utilities and fixtures
//!
//! Exposed outside `cfg(test)` so integration tests under `tests/` can build
//! sessions on top of the same mocks as the unit tests.

pub mod mocks;

use crate::error::Result;
use crate::generation::GenerationBackend;
use crate::session::{SessionController, SessionOptions};
use crate::workspace::FileMap;
use std::sync::Arc;
use std::time::Duration;

/// Small starter project with a recognisable primary file
pub fn sample_files() -> FileMap {
    [
        ("src/App.jsx", "export default function App() { return <h1>v0</h1>; }"),
        ("src/index.css", "body { margin: 0; }"),
        ("package.json", "{\"name\": \"sample\"}"),
    ]
    .into_iter()
    .collect()
}

/// Session over `backend` with a short generation timeout
pub fn session_with(
    backend: Arc<dyn GenerationBackend>,
    timeout: Duration,
) -> Result<SessionController> {
    let options = SessionOptions {
        generation_timeout: timeout,
        ..SessionOptions::default()
    };
    Ok(SessionController::new(backend, options)?.with_files(sample_files()))
}
