use crate::api::DeployProvider;
use crate::cli::context::CliContext;
use crate::config::ClientConfig;
use crate::progress::{BuildStatus, ProgressDisplay};
use anyhow::{bail, Result};
use std::path::PathBuf;

pub async fn run_watch(mut config: ClientConfig, project: &str, transport: Option<String>) -> Result<()> {
    if let Some(transport) = transport {
        config.transport = transport.parse()?;
    }

    let context = CliContext::signed_in(config).await?;
    let mut subscription = context.progress_watcher().start(project);
    let mut updates = subscription.receiver();
    let display = ProgressDisplay::new();

    loop {
        tokio::select! {
            _ = subscription.wait_terminal() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                display.update(&state);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let state = subscription.state();
    display.finish(&state);
    if let Some(kind) = subscription.transport() {
        println!("Progress delivered by {kind}");
    }
    subscription.close();

    if state.status == BuildStatus::Failed {
        bail!("Build of {} failed", project);
    }
    Ok(())
}

pub async fn run_export(config: ClientConfig, project: &str, out: Option<PathBuf>) -> Result<()> {
    let out = out.unwrap_or_else(|| PathBuf::from(format!("{project}.zip")));
    let context = CliContext::signed_in(config).await?;
    let size = context.projects.download_archive(project, &out).await?;
    println!("Saved {} ({} bytes)", out.display(), size);
    Ok(())
}

pub async fn run_deploy(config: ClientConfig, project: &str, provider: &str) -> Result<()> {
    let provider: DeployProvider = provider.parse()?;
    let context = CliContext::signed_in(config).await?;
    let result = context.projects.deploy(project, provider).await?;
    match result.url {
        Some(url) => println!("Live: {url}"),
        None => println!("Deploy started on {provider}; the URL will appear once it finishes"),
    }
    Ok(())
}
