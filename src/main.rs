use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use zonewatch::telemetry::init_logging;
use zonewatch::{
    MemoryRecordStore, MemoryZoneRepository, OpenMeteoClient, OpenMeteoParser, Orchestrator,
    RunReport, Scheduler, ZonewatchConfig,
};

#[derive(Parser)]
#[command(name = "zonewatch", version, about = "Periodic weather collection for registered zones")]
struct Cli {
    /// Path to the configuration file (defaults to ./zonewatch.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect on the configured interval until interrupted
    Run,
    /// Run a single collection and print its report
    Collect,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ZonewatchConfig::load_from_path(cli.config.as_deref())?;
    init_logging(&config.logging, cli.verbose)?;

    let zones = Arc::new(MemoryZoneRepository::with_zones(config.zones.clone()));
    let records = Arc::new(MemoryRecordStore::new());
    let fetcher = Arc::new(OpenMeteoClient::new(&config.weather)?);

    let orchestrator = Orchestrator::from_config(
        &config,
        zones,
        records.clone(),
        fetcher,
        Arc::new(OpenMeteoParser),
    )?;

    match cli.command {
        Command::Collect => {
            let report = orchestrator.run().await.map_err(|e| {
                error!("{}", e.user_message());
                e
            })?;
            print_report(&report)?;
        }
        Command::Run => {
            let scheduler = Scheduler::new(Arc::new(orchestrator), config.collector.interval())?;
            let handle = scheduler.start()?;

            shutdown_signal().await;
            scheduler.stop();
            handle.await.context("Scheduler task failed")?;

            let stored = records.len().await;
            info!(records = stored, "Collector shut down");
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(report).context("Failed to render run report")?;
    println!("{rendered}");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Error setting up signal handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Error setting up SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received shutdown signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
