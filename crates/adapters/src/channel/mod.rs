// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker channel: the worker's contract with the controller
//!
//! Every call answers `None` when the controller is unreachable or answers
//! nothing usable. Implementations log the cause; callers treat `None` as a
//! transient condition and retry on their next tick.

mod http;

pub use http::HttpWorkerChannel;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ChannelCall, FakeWorkerChannel};

use async_trait::async_trait;
use sked_core::{
    AgentDefinition, AgentHealth, JobDefinition, JobIteration, JobMetadata, JobStatus,
    JobStatusExchangeRequest, JobStatusExchangeResponse,
};

/// Calls from a worker agent to its controller
#[async_trait]
pub trait WorkerChannel: Clone + Send + Sync + 'static {
    /// Register an agent; the answer is its accepted identity
    async fn registration(&self, agent: AgentDefinition) -> Option<AgentDefinition>;

    /// Report a liveness signal for a registered agent
    async fn heartbeat(&self, agent_id: &str, health: AgentHealth) -> Option<AgentDefinition>;

    /// Groups and types the controller knows for a cluster
    async fn metadata(&self, cluster: &str) -> Option<JobMetadata>;

    /// Exchange the worker's state of one (group, type) pair for the delta
    async fn status_exchange(
        &self,
        request: JobStatusExchangeRequest,
    ) -> Option<JobStatusExchangeResponse>;

    /// Report one execution record
    async fn iterate(&self, iteration: JobIteration) -> Option<JobIteration>;

    /// Set a job's status on the controller
    async fn mark_as(&self, job_id: &str, status: JobStatus) -> Option<JobDefinition>;
}
