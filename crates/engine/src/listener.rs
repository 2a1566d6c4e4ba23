// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine listeners that report executions back to the controller

use async_trait::async_trait;
use sked_adapters::{ExecutionListener, JobCompletion, TriggerFinalized, WorkerChannel};
use sked_core::{Clock, JobIteration, JobStatus};

/// Reports one iteration per finished execution
pub struct IterationReporter<W, C> {
    channel: W,
    clock: C,
}

impl<W: WorkerChannel, C: Clock> IterationReporter<W, C> {
    pub fn new(channel: W, clock: C) -> Self {
        Self { channel, clock }
    }
}

#[async_trait]
impl<W: WorkerChannel, C: Clock> ExecutionListener for IterationReporter<W, C> {
    fn name(&self) -> &str {
        "iteration-reporter"
    }

    async fn on_job_completed(&self, completion: &JobCompletion) {
        let Some(definition) = &completion.definition else {
            tracing::warn!(job = %completion.key, "execution without definition, not reported");
            return;
        };
        if definition.is_silent() {
            tracing::debug!(
                job = %completion.key,
                runtime_ms = completion.runtime.as_millis() as u64,
                failed = completion.error.is_some(),
                "silent iteration"
            );
            return;
        }

        let iteration = JobIteration::from_run(
            definition.id.as_str(),
            completion.runtime,
            completion.error.clone(),
            self.clock.now(),
        );
        let status = iteration.status;
        match self.channel.iterate(iteration).await {
            Some(saved) => tracing::debug!(
                job = %completion.key,
                iteration = saved.id.as_deref().unwrap_or("-"),
                %status,
                "iteration reported"
            ),
            None => tracing::warn!(job = %completion.key, %status, "iteration not recorded"),
        }
    }
}

/// Marks a job completed once its trigger will never fire again
pub struct CompletionMarker<W> {
    channel: W,
}

impl<W: WorkerChannel> CompletionMarker<W> {
    pub fn new(channel: W) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl<W: WorkerChannel> ExecutionListener for CompletionMarker<W> {
    fn name(&self) -> &str {
        "completion-marker"
    }

    async fn on_trigger_finalized(&self, finalized: &TriggerFinalized) {
        let Some(definition) = &finalized.definition else {
            tracing::warn!(job = %finalized.key, "finalized trigger without definition");
            return;
        };
        match self.channel.mark_as(&definition.id, JobStatus::Completed).await {
            Some(_) => tracing::info!(
                job = %finalized.key,
                trigger = %finalized.trigger,
                "job completed"
            ),
            None => tracing::warn!(job = %finalized.key, "completion not recorded"),
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
