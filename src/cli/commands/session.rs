use crate::cli::context::CliContext;
use crate::cli::repl::{parse_line, ReplCommand, HELP};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::generation::{ModelChoice, PromptEngine};
use crate::session::{LoggingObserver, SessionController, SessionOptions, SubmitOutcome};
use crate::workspace::{FileMap, JsonlLedgerStore, VersionId};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

pub struct SessionArgs {
    pub from: Option<PathBuf>,
    pub ledger: Option<PathBuf>,
    pub model: Option<String>,
}

pub async fn run_session(config: ClientConfig, args: SessionArgs) -> Result<()> {
    let context = CliContext::signed_in(config).await?;
    match context.auth.user() {
        Some(user) => println!("Signed in as {}", user.email),
        None => println!("Not signed in; requests are sent anonymously"),
    }

    let mut options = SessionOptions::from_config(&context.config);
    if let Some(model) = args.model {
        options.model = ModelChoice::from(model);
    }

    let prompts = PromptEngine::with_overrides(&context.config.prompts)
        .context("Invalid prompt template in configuration")?;
    let mut session = SessionController::new(Arc::new(context.generation_backend()), options)?
        .with_prompts(prompts);

    if let Some(bundle) = &args.from {
        let text = tokio::fs::read_to_string(bundle)
            .await
            .with_context(|| format!("Failed to read {}", bundle.display()))?;
        session = session.with_files(FileMap::from_bundle(&text));
    }
    if let Some(path) = args.ledger.or_else(|| context.config.ledger_file.clone()) {
        session = session
            .with_ledger_store(Arc::new(JsonlLedgerStore::new(path)))
            .load_history()
            .await?;
    }
    session.add_observer(Arc::new(LoggingObserver));

    println!("Session {} (:help for commands)", session.id());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt(&session);
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_line(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Invalid(message) => println!("{message}"),
            ReplCommand::Instruction(text) => submit(&session, &text).await,
            ReplCommand::History => print_history(&session),
            ReplCommand::Files => {
                for (path, content) in session.files().iter() {
                    println!("  {:<32} {:>7} bytes", path, content.len());
                }
            }
            ReplCommand::Show(path) => {
                let path = path.unwrap_or_else(|| session.options().primary_path.clone());
                report(session.file(&path).map(|content| println!("{content}")));
            }
            ReplCommand::Restore(id) => {
                let id = VersionId::from_string(id);
                report(
                    session
                        .restore(&id)
                        .await
                        .map(|files| println!("Restored {} ({} files)", id, files.len())),
                );
            }
            ReplCommand::Edit { path, source } => match tokio::fs::read_to_string(&source).await {
                Ok(content) => report(
                    session
                        .edit_file(&path, &content)
                        .await
                        .map(|()| println!("Updated {path} (use :checkpoint to record it)")),
                ),
                Err(e) => println!("Failed to read {}: {}", source.display(), e),
            },
            ReplCommand::Checkpoint(label) => report(
                session
                    .checkpoint(&label)
                    .await
                    .map(|entry| println!("Recorded {}", entry.id)),
            ),
            ReplCommand::Export(file) => {
                match tokio::fs::write(&file, session.export_bundle()).await {
                    Ok(()) => println!("Wrote {}", file.display()),
                    Err(e) => println!("Failed to write {}: {}", file.display(), e),
                }
            }
        }
    }

    Ok(())
}

async fn submit(session: &SessionController, text: &str) {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Generating...");

    // Ctrl-C abandons the request; the session is immediately usable again
    let outcome = tokio::select! {
        outcome = session.submit(text) => Some(outcome),
        _ = tokio::signal::ctrl_c() => None,
    };
    spinner.finish_and_clear();

    match outcome {
        None => println!("Cancelled"),
        Some(Ok(SubmitOutcome::Applied {
            version,
            mode,
            model_used,
        })) => println!(
            "Done ({mode}, {}): {version}. What would you like to change?",
            model_used.as_deref().unwrap_or("unknown model")
        ),
        Some(Ok(SubmitOutcome::ChatReply { text })) => println!("{text}"),
        Some(Ok(SubmitOutcome::Failed { message, retryable })) => {
            println!("Something went wrong: {message}");
            if retryable {
                println!("This looks temporary; try again.");
            }
        }
        Some(Err(e)) => println!("{e}"),
    }
}

fn print_history(session: &SessionController) {
    let history = session.history();
    if history.is_empty() {
        println!("No versions yet");
        return;
    }

    let current = session.current_version().map(|entry| entry.id.clone());
    for entry in history {
        let marker = if Some(&entry.id) == current.as_ref() { "*" } else { " " };
        let mut label: String = entry.instruction.chars().take(48).collect();
        if entry.instruction.chars().count() > 48 {
            label.push_str("...");
        }
        println!(
            "{} {:<20} {}  {}",
            marker,
            entry.id.as_str(),
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            label
        );
    }
}

fn prompt(session: &SessionController) {
    let version = session
        .current_version()
        .map(|entry| entry.id.to_string())
        .unwrap_or_else(|| "new".to_string());
    print!("[{version}]> ");
    let _ = std::io::stdout().flush();
}

fn report(result: std::result::Result<(), Error>) {
    if let Err(e) = result {
        println!("{e}");
    }
}
