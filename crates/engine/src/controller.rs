// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker controller: lifecycle of one agent process
//!
//! `initialize` builds the engine and wires the listeners, `execute`
//! registers with the controller and starts the heartbeat and sync loops,
//! `shutdown` stops everything and signals the controller.

use crate::error::WorkerError;
use crate::heartbeat::Heartbeat;
use crate::listener::{CompletionMarker, IterationReporter};
use crate::periodic::spawn_periodic;
use crate::reconcile::{Reconciler, SyncReport};
use sked_adapters::{EngineFactory, EngineOptions, SchedulerEngine, WorkerChannel};
use sked_core::{
    AgentActivityType, AgentDefinition, AgentIdentity, Clock, JobDefinition, JobFactory, JobKey,
    JobRegistry, OperationOutcome, WorkerConfig, WorkerNames,
};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lifecycle state of the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Uninitialized,
    Initialized,
    Registering,
    Running,
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Uninitialized => write!(f, "uninitialized"),
            WorkerState::Initialized => write!(f, "initialized"),
            WorkerState::Registering => write!(f, "registering"),
            WorkerState::Running => write!(f, "running"),
            WorkerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Collaborators of the worker controller
pub struct WorkerDeps<F, W, C, N> {
    pub engines: F,
    pub channel: W,
    pub registry: JobRegistry,
    pub clock: C,
    pub names: N,
}

pub struct WorkerController<F: EngineFactory, W, C, N> {
    config: WorkerConfig,
    engines: F,
    channel: W,
    jobs: JobFactory,
    clock: C,
    names: N,
    state: WorkerState,
    identity: Option<AgentIdentity>,
    agent: Option<AgentDefinition>,
    reconciler: Option<Reconciler<F::Engine, W>>,
    cancel: CancellationToken,
    loops: Vec<JoinHandle<()>>,
}

impl<F, W, C, N> WorkerController<F, W, C, N>
where
    F: EngineFactory,
    W: WorkerChannel,
    C: Clock,
    N: WorkerNames,
{
    pub fn new(config: WorkerConfig, deps: WorkerDeps<F, W, C, N>) -> Self {
        Self {
            config,
            engines: deps.engines,
            channel: deps.channel,
            jobs: JobFactory::new(deps.registry),
            clock: deps.clock,
            names: deps.names,
            state: WorkerState::Uninitialized,
            identity: None,
            agent: None,
            reconciler: None,
            cancel: CancellationToken::new(),
            loops: Vec::new(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Resolved `worker@cluster` identity, set by `initialize`
    pub fn identity(&self) -> Option<&AgentIdentity> {
        self.identity.as_ref()
    }

    /// Agent as accepted by the controller, set by `execute`
    pub fn agent(&self) -> Option<&AgentDefinition> {
        self.agent.as_ref()
    }

    pub fn engine(&self) -> Option<&F::Engine> {
        self.reconciler.as_ref().map(Reconciler::engine)
    }

    /// Build the engine and attach the execution listeners
    pub async fn initialize(&mut self) -> Result<(), WorkerError> {
        self.expect_state("initialize", WorkerState::Uninitialized)?;
        self.config.validate()?;

        let identity = self.config.identity(&self.names);
        let options = EngineOptions::for_cluster(
            &identity.cluster,
            &identity.id(),
            self.config.parallelism,
            &self.config.clustering,
        );
        let engine = self.engines.build(&options).map_err(|e| {
            tracing::error!(agent = %identity, error = %e, "cannot build scheduler engine");
            WorkerError::EngineUnavailable(e)
        })?;

        engine.add_listener(Arc::new(IterationReporter::new(
            self.channel.clone(),
            self.clock.clone(),
        )));
        engine.add_listener(Arc::new(CompletionMarker::new(self.channel.clone())));

        self.reconciler = Some(Reconciler::new(
            engine,
            self.channel.clone(),
            self.jobs.clone(),
            identity.cluster.clone(),
            self.config.outage_policy,
        ));
        tracing::info!(
            agent = %identity,
            instance = %options.instance_name,
            parallelism = options.parallelism,
            job_types = ?self.jobs.types(),
            "worker initialized"
        );
        self.identity = Some(identity);
        self.state = WorkerState::Initialized;
        Ok(())
    }

    /// Register, start the background loops and start firing jobs
    pub async fn execute(&mut self) -> Result<(), WorkerError> {
        self.expect_state("execute", WorkerState::Initialized)?;
        let (Some(identity), Some(reconciler)) = (self.identity.clone(), self.reconciler.clone())
        else {
            return Err(self.invalid("execute"));
        };

        self.state = WorkerState::Registering;
        let agent = match self.register(&identity).await {
            Ok(agent) => agent,
            Err(e) => {
                tracing::error!(agent = %identity, error = %e, "worker not started");
                self.state = WorkerState::Stopped;
                if let Err(e) = reconciler.engine().shutdown(false).await {
                    tracing::warn!(error = %e, "engine shutdown failed");
                }
                return Err(e);
            }
        };

        let heartbeat = Heartbeat::new(self.channel.clone(), self.clock.clone(), agent.id.clone());
        self.loops.push(spawn_periodic(
            "heartbeat",
            self.config.worker_signal_rate,
            self.cancel.child_token(),
            move || {
                let heartbeat = heartbeat.clone();
                async move {
                    heartbeat.signal(AgentActivityType::Heartbeat).await;
                }
            },
        ));

        if self.config.supervise {
            let sync = reconciler.clone();
            self.loops.push(spawn_periodic(
                "sync",
                self.config.job_sync_rate,
                self.cancel.child_token(),
                move || {
                    let sync = sync.clone();
                    async move {
                        sync.sync().await;
                    }
                },
            ));
        }

        if let Err(e) = reconciler.engine().start().await {
            tracing::error!(agent = %agent.id, error = %e, "cannot start scheduler engine");
            self.stop_loops().await;
            self.state = WorkerState::Stopped;
            return Err(WorkerError::EngineUnavailable(e));
        }

        tracing::info!(
            agent = %agent.id,
            supervisor = self.config.supervise,
            "worker running"
        );
        self.agent = Some(agent);
        self.state = WorkerState::Running;
        Ok(())
    }

    async fn register(&self, identity: &AgentIdentity) -> Result<AgentDefinition, WorkerError> {
        let policy = &self.config.registration;
        for attempt in 1..=policy.attempts {
            let agent = AgentDefinition::registration(
                identity,
                self.config.supervise,
                self.config.worker_signal_rate,
                self.clock.now(),
            );
            if let Some(accepted) = self.channel.registration(agent).await {
                tracing::info!(agent = %accepted.id, attempt, "agent registered");
                return Ok(accepted);
            }

            tracing::warn!(agent = %identity, attempt, of = policy.attempts, "registration failed");
            if attempt < policy.attempts {
                tokio::time::sleep(policy.delay).await;
            }
        }
        Err(WorkerError::RegistrationExhausted {
            attempts: policy.attempts,
        })
    }

    /// Install a job unless its key is already live
    pub async fn schedule(
        &self,
        definition: JobDefinition,
    ) -> Result<OperationOutcome, WorkerError> {
        Ok(self.reconciler("schedule")?.schedule(definition).await)
    }

    /// Replace a live job's definition and triggers
    pub async fn reschedule(
        &self,
        definition: JobDefinition,
    ) -> Result<OperationOutcome, WorkerError> {
        Ok(self.reconciler("reschedule")?.reschedule(definition).await)
    }

    pub async fn unschedule(
        &self,
        code: &str,
        group: &str,
    ) -> Result<OperationOutcome, WorkerError> {
        let key = JobKey::new(code, group);
        Ok(self.reconciler("unschedule")?.unschedule(&key).await)
    }

    /// Run one sync cycle now; `None` when the cycle failed (already logged)
    pub async fn sync(&self) -> Result<Option<SyncReport>, WorkerError> {
        Ok(self.reconciler("sync")?.sync().await)
    }

    /// Stop the loops, signal SHUTDOWN and wait for running jobs
    pub async fn shutdown(&mut self) {
        if self.state == WorkerState::Stopped {
            return;
        }
        self.stop_loops().await;

        if let Some(agent) = &self.agent {
            Heartbeat::new(self.channel.clone(), self.clock.clone(), agent.id.clone())
                .signal(AgentActivityType::Shutdown)
                .await;
        }
        if let Some(reconciler) = &self.reconciler {
            if let Err(e) = reconciler.engine().shutdown(true).await {
                tracing::warn!(error = %e, "engine shutdown failed");
            }
        }

        self.state = WorkerState::Stopped;
        tracing::info!("worker stopped");
    }

    async fn stop_loops(&mut self) {
        self.cancel.cancel();
        for handle in self.loops.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background loop ended abnormally");
            }
        }
    }

    fn reconciler(
        &self,
        operation: &'static str,
    ) -> Result<&Reconciler<F::Engine, W>, WorkerError> {
        match (&self.reconciler, self.state) {
            (_, WorkerState::Stopped) | (None, _) => Err(self.invalid(operation)),
            (Some(reconciler), _) => Ok(reconciler),
        }
    }

    fn expect_state(
        &self,
        operation: &'static str,
        expected: WorkerState,
    ) -> Result<(), WorkerError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> WorkerError {
        WorkerError::InvalidState {
            operation,
            state: self.state,
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
