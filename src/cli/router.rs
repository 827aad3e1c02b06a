//! Command routing and execution

use crate::cli::args::Commands;
use crate::cli::commands::*;
use crate::config::ClientConfig;
use anyhow::Result;

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(command: Option<Commands>, config: ClientConfig) -> Result<()> {
    match command {
        Some(Commands::Login { email, password }) => run_login(config, &email, password).await,
        Some(Commands::Logout) => run_logout(config).await,
        Some(Commands::Whoami) => run_whoami(config).await,
        Some(Commands::Session { from, ledger, model }) => {
            run_session(config, SessionArgs { from, ledger, model }).await
        }
        Some(Commands::Watch { project, transport }) => {
            run_watch(config, &project, transport).await
        }
        Some(Commands::Export { project, out }) => run_export(config, &project, out).await,
        Some(Commands::Deploy { project, provider }) => {
            run_deploy(config, &project, &provider).await
        }
        None => {
            run_session(
                config,
                SessionArgs {
                    from: None,
                    ledger: None,
                    model: None,
                },
            )
            .await
        }
    }
}
