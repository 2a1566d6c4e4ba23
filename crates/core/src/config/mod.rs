// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration
//!
//! All fields have defaults so a partial file (or none at all) yields a
//! usable configuration. Call [`WorkerConfig::validate`] before use.

use crate::agent::AgentIdentity;
use crate::naming::WorkerNames;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Cluster name applied when none is configured
pub const DEFAULT_CLUSTER: &str = "default";

/// Invalid configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("JDBC clustering requires {0}")]
    MissingDataSource(&'static str),
}

/// How the trigger engine stores its job table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusteringType {
    /// In-memory store private to this process
    #[default]
    #[serde(alias = "standalone")]
    Standalone,
    /// Shared persistent store coordinating several processes
    #[serde(alias = "jdbc")]
    Jdbc,
}

/// Clustering options of the trigger engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub clustering_type: ClusteringType,
    pub data_source: Option<String>,
    pub data_source_uri: Option<String>,
    pub data_source_username: Option<String>,
    pub data_source_password: Option<String>,
}

impl ClusterConfig {
    pub fn is_clustered(&self) -> bool {
        self.clustering_type == ClusteringType::Jdbc
    }
}

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub attempts: u32,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 100,
            delay: Duration::from_secs(5),
        }
    }
}

/// What a sync cycle does when the controller answers only partially
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutagePolicy {
    /// Reconcile every pair that answered; drop only the silent ones
    #[default]
    Apply,
    /// Skip orphan cleanup and all removals if any exchange was absent
    SuspendRemovals,
}

/// Configuration of one worker agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Logical cluster name; blank means [`DEFAULT_CLUSTER`]
    pub cluster: String,
    /// Node name; blank means a random UUID at startup
    pub worker: String,
    /// Also drive the sync loop
    pub supervise: bool,
    #[serde(with = "humantime_serde")]
    pub worker_signal_rate: Duration,
    #[serde(with = "humantime_serde")]
    pub job_sync_rate: Duration,
    /// Maximum concurrent job executions
    pub parallelism: usize,
    pub clustering: ClusterConfig,
    pub registration: RetryPolicy,
    pub outage_policy: OutagePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cluster: DEFAULT_CLUSTER.to_string(),
            worker: String::new(),
            supervise: true,
            worker_signal_rate: Duration::from_secs(30),
            job_sync_rate: Duration::from_secs(30),
            parallelism: 10,
            clustering: ClusterConfig::default(),
            registration: RetryPolicy::default(),
            outage_policy: OutagePolicy::default(),
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_signal_rate.is_zero() {
            return Err(ConfigError::Zero("worker_signal_rate"));
        }
        if self.job_sync_rate.is_zero() {
            return Err(ConfigError::Zero("job_sync_rate"));
        }
        if self.parallelism == 0 {
            return Err(ConfigError::Zero("parallelism"));
        }
        if self.registration.attempts == 0 {
            return Err(ConfigError::Zero("registration.attempts"));
        }
        if self.clustering.is_clustered() {
            if is_blank(&self.clustering.data_source) {
                return Err(ConfigError::MissingDataSource("data_source"));
            }
            if is_blank(&self.clustering.data_source_uri) {
                return Err(ConfigError::MissingDataSource("data_source_uri"));
            }
        }
        Ok(())
    }

    /// Cluster name with the default applied
    pub fn cluster_name(&self) -> &str {
        match self.cluster.trim() {
            "" => DEFAULT_CLUSTER,
            cluster => cluster,
        }
    }

    /// Resolve the `worker@cluster` identity, generating a worker name if blank
    pub fn identity(&self, names: &impl WorkerNames) -> AgentIdentity {
        let worker = match self.worker.trim() {
            "" => names.generate(),
            worker => worker.to_string(),
        };
        AgentIdentity::new(worker, self.cluster_name())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
