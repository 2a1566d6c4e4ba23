// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation of the live schedule against the controller
//!
//! A sync cycle pulls cluster metadata, unschedules jobs of groups the
//! controller no longer lists, then exchanges the local state of every
//! (group, type) pair and applies the returned delta: removals, then
//! additions, then updates. Single operations never fail the cycle; they
//! are logged and recorded in the [`SyncReport`].

use crate::error::SyncError;
use sked_adapters::{EngineError, SchedulerEngine, WorkerChannel};
use sked_core::{
    JobDefinition, JobFactory, JobKey, JobState, JobStatusExchangeRequest,
    JobStatusExchangeResponse, OperationOutcome, OutagePolicy, SchedulingOperation, SkipReason,
};
use std::collections::BTreeSet;

/// One operation attempted during a sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOperation {
    pub operation: SchedulingOperation,
    pub key: JobKey,
    pub outcome: OperationOutcome,
}

/// What one sync cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub operations: Vec<AppliedOperation>,
    /// Local groups the controller no longer lists
    pub pruned_groups: Vec<String>,
    /// (group, type) pairs whose exchange came back absent
    pub absent_pairs: Vec<(String, String)>,
    /// Removals not applied because of an outage
    pub suspended_removals: usize,
}

impl SyncReport {
    fn record(&mut self, operation: SchedulingOperation, key: JobKey, outcome: OperationOutcome) {
        self.operations.push(AppliedOperation {
            operation,
            key,
            outcome,
        });
    }

    /// Number of applied operations of a kind
    pub fn applied(&self, operation: SchedulingOperation) -> usize {
        self.operations
            .iter()
            .filter(|op| op.operation == operation && op.outcome.is_applied())
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &AppliedOperation> {
        self.operations
            .iter()
            .filter(|op| matches!(op.outcome, OperationOutcome::Failed(_)))
    }
}

/// Applies schedule changes through the engine and runs sync cycles
#[derive(Clone)]
pub struct Reconciler<E, W> {
    engine: E,
    channel: W,
    jobs: JobFactory,
    cluster: String,
    outage_policy: OutagePolicy,
}

impl<E: SchedulerEngine, W: WorkerChannel> Reconciler<E, W> {
    pub fn new(
        engine: E,
        channel: W,
        jobs: JobFactory,
        cluster: impl Into<String>,
        outage_policy: OutagePolicy,
    ) -> Self {
        Self {
            engine,
            channel,
            jobs,
            cluster: cluster.into(),
            outage_policy,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Install a job unless one with the same key is live
    pub async fn schedule(&self, definition: JobDefinition) -> OperationOutcome {
        let key = definition.key();
        match self.engine.check_exists(&key).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::warn!(job = %key, "job already scheduled");
                return OperationOutcome::Skipped(SkipReason::AlreadyScheduled);
            }
            Err(e) => return failed(SchedulingOperation::Schedule, &key, e),
        }

        let triggers = self.jobs.build_triggers(&definition);
        let Some(detail) = self.jobs.build_job(key.clone(), definition) else {
            return OperationOutcome::Skipped(SkipReason::NoHandler);
        };
        if triggers.is_empty() {
            tracing::warn!(job = %key, "no usable trigger, job not scheduled");
            return OperationOutcome::Skipped(SkipReason::NoTriggers);
        }

        match self.engine.schedule_job(detail, triggers, true).await {
            Ok(()) => {
                tracing::info!(job = %key, "job scheduled");
                OperationOutcome::Applied
            }
            Err(EngineError::NeverFires(_)) => {
                tracing::warn!(job = %key, "job would never fire, not scheduled");
                OperationOutcome::Skipped(SkipReason::NoTriggers)
            }
            Err(e) => failed(SchedulingOperation::Schedule, &key, e),
        }
    }

    /// Swap a live job's definition and rebuild its triggers
    ///
    /// Running executions of the old triggers are not interrupted. A new
    /// definition without usable triggers unschedules the job.
    pub async fn reschedule(&self, definition: JobDefinition) -> OperationOutcome {
        let key = definition.key();
        let detail = match self.engine.job_detail(&key).await {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                tracing::warn!(job = %key, "job not scheduled, cannot reschedule");
                return OperationOutcome::Skipped(SkipReason::NotScheduled);
            }
            Err(e) => return failed(SchedulingOperation::Reschedule, &key, e),
        };

        let triggers = self.jobs.build_triggers(&definition);
        if triggers.is_empty() {
            tracing::warn!(job = %key, "no usable trigger left, unscheduling");
            return self.remove(&key, SchedulingOperation::Reschedule).await;
        }

        let detail = detail.with_definition(definition);
        match self.engine.schedule_job(detail, triggers, true).await {
            Ok(()) => {
                tracing::info!(job = %key, "job rescheduled");
                OperationOutcome::Applied
            }
            Err(EngineError::NeverFires(_)) => {
                tracing::warn!(job = %key, "job would never fire again, unscheduling");
                self.remove(&key, SchedulingOperation::Reschedule).await
            }
            Err(e) => failed(SchedulingOperation::Reschedule, &key, e),
        }
    }

    /// Remove a live job and all its triggers
    pub async fn unschedule(&self, key: &JobKey) -> OperationOutcome {
        match self.engine.check_exists(key).await {
            Ok(true) => self.remove(key, SchedulingOperation::Unschedule).await,
            Ok(false) => {
                tracing::warn!(job = %key, "job not scheduled, nothing to unschedule");
                OperationOutcome::Skipped(SkipReason::NotScheduled)
            }
            Err(e) => failed(SchedulingOperation::Unschedule, key, e),
        }
    }

    async fn remove(&self, key: &JobKey, operation: SchedulingOperation) -> OperationOutcome {
        let result = async {
            for trigger in self.engine.triggers_of_job(key).await? {
                self.engine.unschedule_trigger(&trigger).await?;
            }
            self.engine.delete_job(key).await
        }
        .await;

        match result {
            Ok(_) => {
                tracing::info!(job = %key, "job unscheduled");
                OperationOutcome::Applied
            }
            Err(e) => failed(operation, key, e),
        }
    }

    /// `code -> modified` of every live job of `job_type` in `group`
    pub async fn local_status(&self, group: &str, job_type: &str) -> Result<JobState, EngineError> {
        let mut state = JobState::new();
        for key in self.engine.job_keys(group).await? {
            let Some(detail) = self.engine.job_detail(&key).await? else {
                continue;
            };
            if detail.definition.is_type(job_type) {
                state.insert(key.code, detail.definition.modified);
            }
        }
        Ok(state)
    }

    /// Run one sync cycle, logging instead of failing
    pub async fn sync(&self) -> Option<SyncReport> {
        match self.try_sync().await {
            Ok(report) => {
                tracing::info!(
                    cluster = %self.cluster,
                    scheduled = report.applied(SchedulingOperation::Schedule),
                    rescheduled = report.applied(SchedulingOperation::Reschedule),
                    unscheduled = report.applied(SchedulingOperation::Unschedule),
                    failed = report.failures().count(),
                    absent = report.absent_pairs.len(),
                    "sync cycle complete"
                );
                Some(report)
            }
            Err(e) => {
                tracing::warn!(cluster = %self.cluster, error = %e, "sync cycle failed");
                None
            }
        }
    }

    /// Run one sync cycle
    pub async fn try_sync(&self) -> Result<SyncReport, SyncError> {
        let metadata = self.channel.metadata(&self.cluster).await.ok_or_else(|| {
            SyncError::MetadataUnavailable {
                cluster: self.cluster.clone(),
            }
        })?;

        let groups = distinct(&metadata.groups, false);
        let types: Vec<String> = distinct(&metadata.types, true)
            .into_iter()
            .filter(|job_type| self.jobs.supports(job_type))
            .collect();

        let mut report = SyncReport::default();
        match self.outage_policy {
            OutagePolicy::Apply => {
                self.prune_orphans(&groups, &mut report).await?;
                for group in &groups {
                    for job_type in &types {
                        if let Some(response) =
                            self.exchange(group, job_type, &mut report).await?
                        {
                            self.apply(group, response, true, &mut report).await;
                        }
                    }
                }
            }
            OutagePolicy::SuspendRemovals => {
                let mut responses = Vec::new();
                for group in &groups {
                    for job_type in &types {
                        if let Some(response) =
                            self.exchange(group, job_type, &mut report).await?
                        {
                            responses.push((group, response));
                        }
                    }
                }

                let outage = !report.absent_pairs.is_empty();
                if outage {
                    tracing::warn!(
                        absent = report.absent_pairs.len(),
                        "controller partially unavailable, suspending removals"
                    );
                } else {
                    self.prune_orphans(&groups, &mut report).await?;
                }
                for (group, response) in responses {
                    self.apply(group, response, !outage, &mut report).await;
                }
            }
        }

        Ok(report)
    }

    async fn exchange(
        &self,
        group: &str,
        job_type: &str,
        report: &mut SyncReport,
    ) -> Result<Option<JobStatusExchangeResponse>, SyncError> {
        let state = self.local_status(group, job_type).await?;
        let request = JobStatusExchangeRequest::new(group, job_type, self.cluster.as_str(), state);
        let response = self.channel.status_exchange(request).await;
        if response.is_none() {
            tracing::warn!(group, job_type, "no status exchange answer, pair skipped");
            report
                .absent_pairs
                .push((group.to_string(), job_type.to_string()));
        }
        Ok(response)
    }

    /// Unschedule every job of local groups the controller does not list
    async fn prune_orphans(
        &self,
        groups: &[String],
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        for local in self.engine.job_group_names().await? {
            if groups.contains(&local) {
                continue;
            }
            tracing::info!(group = %local, "group no longer active, unscheduling its jobs");
            for key in self.engine.job_keys(&local).await? {
                let outcome = self.unschedule(&key).await;
                report.record(SchedulingOperation::Unschedule, key, outcome);
            }
            report.pruned_groups.push(local);
        }
        Ok(())
    }

    async fn apply(
        &self,
        group: &str,
        response: JobStatusExchangeResponse,
        removals: bool,
        report: &mut SyncReport,
    ) {
        if !response.is_disjoint() {
            tracing::warn!(group, "exchange answer lists a code more than once");
        }

        if removals {
            for code in response.removed {
                let key = JobKey::new(code, group);
                let outcome = self.unschedule(&key).await;
                report.record(SchedulingOperation::Unschedule, key, outcome);
            }
        } else {
            report.suspended_removals += response.removed.len();
        }

        for definition in response.added.into_values() {
            let key = definition.key();
            let outcome = self.schedule(definition).await;
            report.record(SchedulingOperation::Schedule, key, outcome);
        }

        for definition in response.updated.into_values() {
            let key = definition.key();
            let outcome = self.reschedule(definition).await;
            report.record(SchedulingOperation::Reschedule, key, outcome);
        }
    }
}

fn failed(operation: SchedulingOperation, key: &JobKey, error: EngineError) -> OperationOutcome {
    tracing::error!(job = %key, %operation, error = %error, "scheduling operation failed");
    OperationOutcome::Failed(error.to_string())
}

/// Values in first-seen order without repeats, blanks dropped
fn distinct(values: &[String], ignore_case: bool) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .filter(|value| {
            let folded = if ignore_case {
                value.to_ascii_lowercase()
            } else {
                value.to_string()
            };
            seen.insert(folded)
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
