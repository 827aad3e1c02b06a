//! # CrucibAI
//!
//! Client-side build sessions for the CrucibAI app generator.
//!
//! ## Usage
//!
//! ```bash
//! crucibai login you@example.com
//! crucibai session [--ledger history.jsonl]
//! crucibai watch <project>
//! ```
//!
//! ## Modules
//!
//! - `workspace` - File map store, version ledger and its append-only persistence
//! - `session` - Session controller: single-flight generation requests against the working copy
//! - `generation` - Generation endpoint contract, prompt templates and response handling
//! - `progress` - Build progress reconciler with WebSocket push and REST polling transports
//! - `auth` - Bearer token session
//! - `api` - Backend endpoints and project resources (status, export, deploy)
//! - `config` - Configuration loading from TOML and environment
//! - `cli` - Command-line front end
//! - `testing` - Mocks for driving sessions without a backend
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod progress;
pub mod session;
pub mod workspace;

pub mod testing;

pub use error::{Error, Result};
