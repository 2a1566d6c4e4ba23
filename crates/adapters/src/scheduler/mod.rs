// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler engine: the live table of jobs and triggers
//!
//! The worker never mutates the live schedule directly; every change goes
//! through a [`SchedulerEngine`]. Engines are built by an [`EngineFactory`]
//! and report firings to [`ExecutionListener`]s.

mod local;
mod timeline;

pub use local::{LocalEngineFactory, LocalScheduler};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sked_core::{
    ClusterConfig, ClusteringType, JobDefinition, JobDetail, JobKey, TriggerKey, TriggerSpec,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from engine construction or operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid engine options: {0}")]
    InvalidOptions(String),
    #[error("job store not supported by this engine: {0}")]
    UnsupportedStore(String),
    #[error("job already scheduled: {0}")]
    AlreadyExists(JobKey),
    #[error("no triggers given for job {0}")]
    NoTriggers(JobKey),
    #[error("no trigger of job {0} will ever fire")]
    NeverFires(JobKey),
    #[error("scheduler has been shut down")]
    ShutDown,
}

/// Where the engine keeps its job table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStore {
    /// Private to this process
    Memory,
    /// Shared with other processes of the same cluster
    Jdbc {
        data_source: String,
        uri: String,
        username: Option<String>,
        password: Option<String>,
    },
}

impl JobStore {
    pub fn from_cluster(cluster: &ClusterConfig) -> Self {
        match cluster.clustering_type {
            ClusteringType::Standalone => JobStore::Memory,
            ClusteringType::Jdbc => JobStore::Jdbc {
                data_source: cluster.data_source.clone().unwrap_or_default(),
                uri: cluster.data_source_uri.clone().unwrap_or_default(),
                username: cluster.data_source_username.clone(),
                password: cluster.data_source_password.clone(),
            },
        }
    }
}

/// Construction options of an engine instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Shared by every agent of a cluster
    pub instance_name: String,
    /// Unique per agent process
    pub instance_id: String,
    /// Maximum concurrent job executions
    pub parallelism: usize,
    pub store: JobStore,
}

impl EngineOptions {
    /// Options scoped to `cluster`, identified by `agent_id`
    pub fn for_cluster(
        cluster: &str,
        agent_id: &str,
        parallelism: usize,
        clustering: &ClusterConfig,
    ) -> Self {
        Self {
            instance_name: format!("sked-{}", cluster),
            instance_id: agent_id.to_string(),
            parallelism,
            store: JobStore::from_cluster(clustering),
        }
    }
}

/// Builds engine instances
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: SchedulerEngine;

    fn build(&self, options: &EngineOptions) -> Result<Self::Engine, EngineError>;
}

/// One finished job execution
#[derive(Debug, Clone)]
pub struct JobCompletion {
    pub key: JobKey,
    pub trigger: TriggerKey,
    /// Definition attached to the execution, if the engine still has it
    pub definition: Option<JobDefinition>,
    pub fired_at: DateTime<Utc>,
    pub runtime: Duration,
    /// Failure detail, `None` on success
    pub error: Option<String>,
}

/// A trigger that will never fire again
#[derive(Debug, Clone)]
pub struct TriggerFinalized {
    pub trigger: TriggerKey,
    pub key: JobKey,
    pub definition: Option<JobDefinition>,
}

/// Engine callbacks; both hooks default to doing nothing
#[async_trait]
pub trait ExecutionListener: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn on_job_completed(&self, _completion: &JobCompletion) {}

    async fn on_trigger_finalized(&self, _finalized: &TriggerFinalized) {}
}

/// Facade over a trigger execution engine
#[async_trait]
pub trait SchedulerEngine: Clone + Send + Sync + 'static {
    async fn check_exists(&self, key: &JobKey) -> Result<bool, EngineError>;

    /// Install `detail` with exactly `triggers`
    ///
    /// With `replace`, an existing job of the same key is swapped out together
    /// with all its triggers in one step.
    async fn schedule_job(
        &self,
        detail: JobDetail,
        triggers: Vec<TriggerSpec>,
        replace: bool,
    ) -> Result<(), EngineError>;

    async fn job_detail(&self, key: &JobKey) -> Result<Option<JobDetail>, EngineError>;

    /// Remove a job and its triggers; `false` if it was not scheduled
    async fn delete_job(&self, key: &JobKey) -> Result<bool, EngineError>;

    /// Remove one trigger; the job goes with its last trigger
    async fn unschedule_trigger(&self, trigger: &TriggerKey) -> Result<bool, EngineError>;

    async fn triggers_of_job(&self, key: &JobKey) -> Result<Vec<TriggerKey>, EngineError>;

    async fn job_keys(&self, group: &str) -> Result<Vec<JobKey>, EngineError>;

    async fn job_group_names(&self) -> Result<Vec<String>, EngineError>;

    fn add_listener(&self, listener: Arc<dyn ExecutionListener>);

    /// Begin firing triggers
    async fn start(&self) -> Result<(), EngineError>;

    /// Stop firing; with `wait_for_jobs`, return once running jobs are done
    async fn shutdown(&self, wait_for_jobs: bool) -> Result<(), EngineError>;
}
