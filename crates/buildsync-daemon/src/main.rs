//! buildsyncd - keeps scheduled build jobs in sync with a source repository
//!
//! Runs a sync pass on a timer and whenever `POST /api/v1/sync` is called.
//! With `--once` it runs a single pass, prints the report and exits.

use buildsync_daemon::error::DaemonError;
use buildsync_daemon::{DaemonConfig, DaemonResult, Server};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// buildsync daemon CLI
#[derive(Parser)]
#[command(name = "buildsyncd")]
#[command(about = "Keeps scheduled build jobs in sync with a source repository", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BUILDSYNC_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides the configuration file
    #[arg(short, long, env = "BUILDSYNC_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level, overrides the configuration file
    #[arg(long, env = "BUILDSYNC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "BUILDSYNC_LOG_JSON")]
    json: bool,

    /// Run one sync pass and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Initialize tracing
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());

    if cli.json || config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting buildsyncd");

    let server = Server::new(config).await?;

    if cli.once {
        let outcome = server.run_once().await?;
        let report = serde_json::to_string_pretty(&outcome)
            .map_err(|e| DaemonError::Server(format!("Cannot encode report: {}", e)))?;
        println!("{}", report);
        return Ok(());
    }

    server.run().await
}
