// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sked worker daemon (skedd)
//!
//! Registers with the controller, keeps the agent alive and runs the jobs
//! the controller assigns to its cluster until SIGINT or SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use sked_daemon::{build, start, DaemonConfig, LifecycleError, LoggingConfig};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "skedd", version, about = "sked worker agent")]
struct Args {
    /// Path to the daemon's TOML config
    #[arg(short, long, default_value = "skedd.toml")]
    config: PathBuf,

    /// Override the controller URL from the config file
    #[arg(long)]
    controller: Option<String>,

    /// Override the worker name from the config file
    #[arg(long)]
    worker: Option<String>,

    /// Validate the config and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = DaemonConfig::load(&args.config)?;
    if let Some(url) = args.controller {
        config.controller.url = url;
    }
    if let Some(worker) = args.worker {
        config.worker.worker = worker;
    }
    config.validate()?;

    if args.check {
        println!("{}: ok", args.config.display());
        return Ok(());
    }

    let _log_guard = setup_logging(&config.logging)?;
    info!(config = %args.config.display(), "starting skedd");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // Registration can retry for minutes; signals abort it
    let mut worker = build(&config);
    let started = tokio::select! {
        result = start(&mut worker) => Some(result),
        _ = sigterm.recv() => {
            info!("received SIGTERM during startup, shutting down");
            None
        }
        _ = sigint.recv() => {
            info!("received SIGINT during startup, shutting down");
            None
        }
    };
    match started {
        Some(Ok(())) => {
            if let Some(agent) = worker.agent() {
                info!(agent = %agent.id, "worker ready");
            }
            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                _ = sigint.recv() => info!("received SIGINT, shutting down"),
            }
        }
        Some(Err(e)) => {
            error!("failed to start worker: {}", e);
            return Err(e.into());
        }
        None => {}
    }

    worker.shutdown().await;
    info!("skedd stopped");
    Ok(())
}

fn setup_logging(
    config: &LoggingConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| LifecycleError::Logging(format!("filter {:?}: {}", config.filter, e)))?,
    };

    let Some(path) = &config.file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| LifecycleError::Logging(e.to_string()))?;
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    std::fs::create_dir_all(dir)?;
    let name = path
        .file_name()
        .ok_or_else(|| LifecycleError::Logging(format!("not a file: {}", path.display())))?;

    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| LifecycleError::Logging(e.to_string()))?;

    Ok(Some(guard))
}
