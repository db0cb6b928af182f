//! Ticketing Server
//!
//! Loads an event plan, enrolls its vendors, and runs every event's vendor
//! and customer actors until the tickets sell out or a shutdown signal
//! arrives.

mod config;
mod shutdown;
mod simulation;

use clap::Parser;
use config::ConfigLoader;
use shutdown::shutdown_signal;
use simulation::Simulation;
use std::path::PathBuf;
use std::sync::Arc;
use ticketing_core::repositories::{InMemoryConfigurationRepository, InMemoryVendorRepository};
use ticketing_core::services::TicketingService;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Event ticketing simulator with concurrent vendors and customers
#[derive(Parser, Debug)]
#[command(name = "ticketing-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "TICKETING_CONFIG", default_value = "./ticketing.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false")]
    log_json: bool,

    /// Write the final report to this file instead of stdout
    #[arg(short, long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.log_json);

    tracing::info!("Starting ticketing-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let loaded_config = ConfigLoader::new(&args.config).load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!(
        vendors = loaded_config.vendors.len(),
        events = loaded_config.events.len(),
        "Configuration loaded from {:?}",
        args.config
    );

    let service = Arc::new(TicketingService::with_repositories(
        Arc::new(InMemoryConfigurationRepository::new()),
        Arc::new(InMemoryVendorRepository::new()),
        loaded_config.pacing,
    ));

    // Halt every event on SIGTERM/SIGINT; awaited events then finish early
    let halt_handle = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            shutdown_signal().await;
            service.configs().halt().await;
        })
    };

    let result = Simulation::new(Arc::clone(&service))
        .run(&loaded_config)
        .await;
    halt_handle.abort();

    // Events left behind by a failed run
    for report in service.configs().stop_all().await {
        service.settle(&report).await;
    }

    let report = result.map_err(|e| {
        tracing::error!("Simulation failed: {}", e);
        e
    })?;

    let json = serde_json::to_string_pretty(&report)?;
    match args.report {
        Some(path) => {
            std::fs::write(&path, json)?;
            tracing::info!("Report written to {:?}", path);
        }
        None => println!("{json}"),
    }

    tracing::info!("Ticketing server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
