//! PulseCast Server - standalone headless runner for the audio-reactive
//! light-show engine.
//!
//! This binary is a minimal supervisor: it loads configuration, starts the
//! show engine, and exposes a line-oriented stdin console for the handful of
//! control operations a full HTTP surface would otherwise expose
//! (`start`/`stop`/`set_config`/`status`). The HTTP/REST surface itself is
//! outside this crate's scope.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pulsecast_core::{LampTransport, ShowEngine};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

use crate::config::ServerConfig;

/// PulseCast Server - headless audio-reactive LAN lamp controller.
#[derive(Parser, Debug)]
#[command(name = "pulsecast-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "PULSECAST_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Override the FIFO path from the config file.
    #[arg(short = 'f', long, env = "PULSECAST_FIFO_PATH")]
    fifo_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("PulseCast Server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(fifo_path) = args.fifo_path {
        config.fifo_path = fifo_path;
    }

    log::info!(
        "Configuration: fifo_path={}, device_ids={:?}, default_mode={}",
        config.fifo_path.display(),
        config.device_ids,
        config.default_mode
    );

    let core_config = Arc::new(config.to_core_config());
    core_config.validate().context("Invalid core configuration")?;

    let transport = Arc::new(LampTransport::new(Arc::clone(&core_config)));
    let engine = Arc::new(ShowEngine::new(Arc::clone(&transport), Arc::clone(&core_config)));

    if config.device_ids.is_empty() {
        log::warn!("no device_ids configured; the engine will stay idle until `start` is issued");
    } else {
        match engine
            .start(
                &config.default_mode,
                &config.device_ids,
                config.default_latency_ms,
                config.default_intensity,
            )
            .await
        {
            Ok(()) => log::info!("show engine started in {} mode", config.default_mode),
            Err(e) => log::error!("failed to start show engine: {}", e),
        }
    }

    let console_engine = Arc::clone(&engine);
    let console_task = tokio::spawn(async move {
        if let Err(e) = run_console(console_engine).await {
            log::warn!("console loop ended: {}", e);
        }
    });

    shutdown_signal().await;
    log::info!("shutdown signal received, cleaning up...");

    engine.stop().await;
    console_task.abort();

    log::info!("shutdown complete");
    Ok(())
}

/// A minimal line-oriented control console standing in for the excluded HTTP
/// surface: `status`, `stop`, `set-mode <mode>`, `set-intensity <n>`,
/// `set-latency <ms>`.
async fn run_console(engine: Arc<ShowEngine>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("status") => {
                let status = engine.status().await;
                log::info!("{:?}", status);
            }
            Some("stop") => {
                engine.stop().await;
                log::info!("engine stopped");
            }
            Some("set-mode") => match parts.next() {
                Some(mode) => match engine.set_mode(mode).await {
                    Ok(()) => log::info!("mode set to {}", mode),
                    Err(e) => log::warn!("set-mode failed: {}", e),
                },
                None => log::warn!("usage: set-mode <pulse|ambient|party|off>"),
            },
            Some("set-intensity") => match parts.next().and_then(|s| s.parse().ok()) {
                Some(intensity) => {
                    engine.set_intensity(intensity).await;
                    log::info!("intensity set to {}", intensity);
                }
                None => log::warn!("usage: set-intensity <1..=10>"),
            },
            Some("set-latency") => match parts.next().and_then(|s| s.parse().ok()) {
                Some(latency_ms) => match engine.set_latency(latency_ms).await {
                    Ok(()) => log::info!("latency set to {}ms", latency_ms),
                    Err(e) => log::warn!("set-latency failed: {}", e),
                },
                None => log::warn!("usage: set-latency <-500..=500>"),
            },
            Some(other) => log::warn!("unrecognized command: {}", other),
            None => {}
        }
    }

    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
