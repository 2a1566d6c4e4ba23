// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration and worker startup

use crate::jobs::{register_builtin, ShellDefaults};
use serde::{Deserialize, Serialize};
use sked_adapters::{HttpWorkerChannel, LocalEngineFactory, TracedWorkerChannel};
use sked_core::{JobRegistry, RandomWorkerNames, SystemClock, WorkerConfig};
use sked_engine::{WorkerController, WorkerDeps, WorkerError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Worker controller with the production adapters
pub type DaemonWorker = WorkerController<
    LocalEngineFactory,
    TracedWorkerChannel<HttpWorkerChannel>,
    SystemClock,
    RandomWorkerNames,
>;

/// Where the controller lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Base URL of the controller API
    pub url: String,
    /// Bound on every controller call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    /// Log file; stderr when unset
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Working directory of shell jobs that name none
    pub workdir: Option<PathBuf>,
}

/// Contents of the daemon's TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub worker: WorkerConfig,
    pub controller: ControllerConfig,
    pub logging: LoggingConfig,
    pub shell: ShellConfig,
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LifecycleError::ReadConfig(path.to_path_buf(), e))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, LifecycleError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LifecycleError> {
        if self.controller.url.trim().is_empty() {
            return Err(LifecycleError::MissingControllerUrl);
        }
        if self.controller.timeout.is_zero() {
            return Err(LifecycleError::ZeroTimeout);
        }
        self.worker
            .validate()
            .map_err(|e| LifecycleError::Worker(e.into()))
    }
}

/// Daemon startup errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot read config {0}: {1}")]
    ReadConfig(PathBuf, #[source] std::io::Error),
    #[error("invalid config: {0}")]
    ParseConfig(#[from] toml::de::Error),
    #[error("controller.url is required")]
    MissingControllerUrl,
    #[error("controller.timeout must be greater than zero")]
    ZeroTimeout,
    #[error("cannot set up logging: {0}")]
    Logging(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Job registry with the built-in job types
pub fn registry(config: &DaemonConfig) -> JobRegistry {
    let mut registry = JobRegistry::new();
    register_builtin(
        &mut registry,
        ShellDefaults {
            workdir: config.shell.workdir.clone(),
        },
    );
    registry
}

/// Build, register and start the worker
/// Build the worker with the production adapters, without starting it
pub fn build(config: &DaemonConfig) -> DaemonWorker {
    let channel = TracedWorkerChannel::new(HttpWorkerChannel::new(
        &config.controller.url,
        config.controller.timeout,
    ));
    info!(controller = %channel.inner().base_url(), "using controller");

    WorkerController::new(
        config.worker.clone(),
        WorkerDeps {
            engines: LocalEngineFactory::default(),
            channel,
            registry: registry(config),
            clock: SystemClock,
            names: RandomWorkerNames,
        },
    )
}

/// Initialize the worker and register it with the controller
///
/// Cancel-safe: dropping the future mid-registration leaves the worker in a
/// state that [`WorkerController::shutdown`] cleans up.
pub async fn start(worker: &mut DaemonWorker) -> Result<(), LifecycleError> {
    worker.initialize().await?;
    worker.execute().await?;
    Ok(())
}

pub async fn startup(config: &DaemonConfig) -> Result<DaemonWorker, LifecycleError> {
    let mut worker = build(config);
    start(&mut worker).await?;
    Ok(worker)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
