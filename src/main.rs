//! DHL tracking gateway - parcel status polling service
//!
//! Registers DHL tracking numbers, persists them to a JSON file, polls the
//! carrier API on a fixed cadence, and keeps one live entity per package.
//!
//! Module structure:
//! - `domain/` - Core types (TrackingId, TrackedParcel, shipment model)
//! - `io/` - External interfaces (carrier API, registrations file, command socket)
//! - `services/` - Business logic (command handlers, registry, poller)
//! - `infra/` - Infrastructure (config, metrics)

use clap::Parser;
use dhl_tracker::infra::{Config, Metrics};
use dhl_tracker::io::{
    start_command_listener, CarrierClient, CommandListenerConfig, RegistrationStore,
};
use dhl_tracker::services::{run_command_worker, CommandHandler, ParcelRegistry, Poller};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// DHL tracking gateway - parcel status polling service
#[derive(Parser, Debug)]
#[command(name = "dhl-tracker", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("dhl-tracker starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        api_url = %config.api_url(),
        registrations_file = %config.registrations_file(),
        scan_interval_mins = %config.scan_interval_mins(),
        commands_enabled = %config.commands_enabled(),
        commands_port = %config.commands_port(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Create shared components
    let store = RegistrationStore::load(config.registrations_file());
    let client = Arc::new(CarrierClient::new(&config)?);
    let registry = Arc::new(ParcelRegistry::new());
    let metrics = Arc::new(Metrics::new());

    let handler = Arc::new(CommandHandler::new(
        store,
        registry.clone(),
        client.clone(),
        metrics.clone(),
    ));

    // One entity per already-registered package, handed over in one batch;
    // the poller's first tick performs their initial refresh
    handler.restore_registered().await;

    // Command channel (bounded) feeding the single command worker
    let (command_tx, command_rx) = mpsc::channel(64);
    let worker_handler = handler.clone();
    tokio::spawn(async move {
        run_command_worker(worker_handler, command_rx).await;
    });

    // Start the command listener
    let listener_config = CommandListenerConfig {
        bind_address: config.commands_bind_address().to_string(),
        port: config.commands_port(),
        enabled: config.commands_enabled(),
    };
    let listener_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = start_command_listener(listener_config, command_tx, listener_shutdown).await
        {
            tracing::error!(error = %e, "command listener error");
        }
    });

    // Start metrics reporter
    let report_metrics = metrics.clone();
    let report_registry = registry.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            let summary = report_metrics.report(report_registry.len());
            summary.log();
        }
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Run the poll engine until shutdown
    let poller = Poller::new(registry, client, metrics, config.scan_interval());
    poller.run(shutdown_rx).await;

    info!("dhl-tracker shutdown complete");
    Ok(())
}
