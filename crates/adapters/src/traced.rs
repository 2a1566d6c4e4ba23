// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced channel wrapper for consistent observability

use crate::channel::WorkerChannel;
use async_trait::async_trait;
use sked_core::{
    AgentDefinition, AgentHealth, JobDefinition, JobIteration, JobMetadata, JobStatus,
    JobStatusExchangeRequest, JobStatusExchangeResponse,
};
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any WorkerChannel
#[derive(Clone)]
pub struct TracedWorkerChannel<W> {
    inner: W,
}

impl<W> TracedWorkerChannel<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[async_trait]
impl<W: WorkerChannel> WorkerChannel for TracedWorkerChannel<W> {
    async fn registration(&self, agent: AgentDefinition) -> Option<AgentDefinition> {
        let span = tracing::info_span!("channel.registration", agent = %agent.id);
        async {
            let start = Instant::now();
            let result = self.inner.registration(agent).await;
            match &result {
                Some(agent) => tracing::info!(
                    id = %agent.id,
                    elapsed_ms = elapsed_ms(start),
                    "agent registered"
                ),
                None => tracing::warn!(elapsed_ms = elapsed_ms(start), "registration absent"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn heartbeat(&self, agent_id: &str, health: AgentHealth) -> Option<AgentDefinition> {
        let span = tracing::info_span!("channel.heartbeat", agent_id);
        async {
            let activity = health.activity_type;
            let start = Instant::now();
            let result = self.inner.heartbeat(agent_id, health).await;
            match &result {
                Some(_) => {
                    tracing::debug!(%activity, elapsed_ms = elapsed_ms(start), "signal sent")
                }
                None => {
                    tracing::warn!(%activity, elapsed_ms = elapsed_ms(start), "signal absent")
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn metadata(&self, cluster: &str) -> Option<JobMetadata> {
        let span = tracing::info_span!("channel.metadata", cluster);
        async {
            let start = Instant::now();
            let result = self.inner.metadata(cluster).await;
            match &result {
                Some(metadata) => tracing::debug!(
                    groups = metadata.groups.len(),
                    types = metadata.types.len(),
                    elapsed_ms = elapsed_ms(start),
                    "metadata received"
                ),
                None => tracing::warn!(elapsed_ms = elapsed_ms(start), "metadata absent"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn status_exchange(
        &self,
        request: JobStatusExchangeRequest,
    ) -> Option<JobStatusExchangeResponse> {
        let span = tracing::info_span!(
            "channel.exchange",
            group = %request.group,
            job_type = %request.job_type
        );
        async {
            tracing::debug!(known = request.state.len(), "exchanging status");
            let start = Instant::now();
            let result = self.inner.status_exchange(request).await;
            match &result {
                Some(response) => tracing::debug!(
                    removed = response.removed.len(),
                    added = response.added.len(),
                    updated = response.updated.len(),
                    elapsed_ms = elapsed_ms(start),
                    "delta received"
                ),
                None => tracing::warn!(elapsed_ms = elapsed_ms(start), "exchange absent"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn iterate(&self, iteration: JobIteration) -> Option<JobIteration> {
        let span = tracing::info_span!(
            "channel.iterate",
            job_id = %iteration.job_id,
            status = %iteration.status
        );
        async {
            let start = Instant::now();
            let result = self.inner.iterate(iteration).await;
            match &result {
                Some(saved) => tracing::debug!(
                    id = saved.id.as_deref().unwrap_or_default(),
                    elapsed_ms = elapsed_ms(start),
                    "iteration reported"
                ),
                None => {
                    tracing::warn!(elapsed_ms = elapsed_ms(start), "iteration report absent")
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn mark_as(&self, job_id: &str, status: JobStatus) -> Option<JobDefinition> {
        let span = tracing::info_span!("channel.mark_as", job_id, %status);
        async {
            let start = Instant::now();
            let result = self.inner.mark_as(job_id, status).await;
            match &result {
                Some(_) => tracing::info!(elapsed_ms = elapsed_ms(start), "job marked"),
                None => tracing::warn!(elapsed_ms = elapsed_ms(start), "mark absent"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
