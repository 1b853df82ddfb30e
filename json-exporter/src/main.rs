//! Prometheus exporter for JSON endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use json_exporter::config::LogFormat;
use json_exporter::{AppState, ExporterConfig, ExporterMetrics, HttpServer, Prober};

/// Prometheus exporter for JSON endpoints.
#[derive(Parser, Debug)]
#[command(name = "json-exporter")]
#[command(about = "Expose values from JSON endpoints as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The address to listen on for HTTP requests (overrides config).
    #[arg(long)]
    listen_address: Option<String>,

    /// Log level (trace, debug, info, warn, error), overrides config.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    if let Some(listen) = args.listen_address {
        config.server.listen = listen;
        config.validate()?;
    }

    // Initialize logging
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.logging.level)
        .parse()
        .unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("json_exporter={}", log_level).parse()?)
        .add_directive(format!("hyper={}", Level::WARN).parse()?)
        .add_directive(format!("reqwest={}", Level::WARN).parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!("Starting JSON exporter");

    let listen_addr = config.server.listen_addr()?;
    let prober = Prober::new(&config.probe)
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
    let state = AppState::new(
        prober,
        Arc::new(ExporterMetrics::new()),
        &config.probe.field_prefix,
        &config.server.metrics_path,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    // Bind failures end the process here
    HttpServer::new(state, listen_addr).run(shutdown_rx).await?;

    info!("Exporter stopped");
    Ok(())
}

async fn wait_for_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(_) => std::future::pending::<()>().await,
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}
