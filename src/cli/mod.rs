//! CLI command handlers
//!
//! Argument parsing, the per-invocation client context and one handler per
//! subcommand. Handlers return `anyhow::Result`; everything below this
//! module reports [`crate::error::Error`].

pub mod args;
pub mod commands;
pub mod context;
pub mod repl;
pub mod router;

pub use args::{Cli, Commands};
pub use context::CliContext;
pub use router::execute_command;

/// Tracing filter for a `-v` count
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,reqwest=debug,tungstenite=debug",
    }
}
