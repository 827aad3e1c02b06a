use clap::Parser;
use crucibai::cli::{execute_command, get_log_level, Cli};
use crucibai::config::ConfigLoader;
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load().await?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
        config.validate()?;
    }

    // -v wins over the configured level
    let log_level = match (cli.verbose, config.log_level.as_deref()) {
        (0, Some(level)) => level.to_string(),
        (verbose, _) => get_log_level(verbose).to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .with_line_number(cli.verbose >= 3)
        .with_writer(std::io::stderr)
        .init();

    debug!("crucibai started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    execute_command(cli.command, config).await
}
