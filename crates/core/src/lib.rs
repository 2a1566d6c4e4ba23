// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! sked-core: data model and pure building blocks of the sked worker agent
//!
//! This crate provides:
//! - Agent, job, exchange and iteration value types shared with the controller
//! - Clock and worker naming abstractions
//! - Worker configuration
//! - Cron parsing and the trigger specification builder
//! - The job handler registry and job factory

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod agent;
pub mod clock;
pub mod config;
pub mod cron;
pub mod exchange;
pub mod factory;
pub mod naming;
pub mod iteration;
pub mod job;
pub mod operation;
pub mod trigger;

pub use agent::{AgentActivityType, AgentDefinition, AgentHealth, AgentIdentity};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    ClusterConfig, ClusteringType, ConfigError, OutagePolicy, RetryPolicy, WorkerConfig,
    DEFAULT_CLUSTER,
};
pub use cron::{CronError, CronExpression};
pub use exchange::{JobMetadata, JobState, JobStatusExchangeRequest, JobStatusExchangeResponse};
pub use factory::{
    JobContext, JobDetail, JobError, JobFactory, JobHandler, JobModules, JobRegistry,
};
pub use naming::{FixedWorkerName, RandomWorkerNames, WorkerNames};
pub use iteration::{IterationStatus, JobIteration};
pub use job::{CronTrigger, JobDefinition, JobExecution, JobKey, JobScheduleType, JobStatus};
pub use operation::{OperationOutcome, SchedulingOperation, SkipReason};
pub use trigger::{build_triggers, TriggerKey, TriggerSchedule, TriggerSpec};
