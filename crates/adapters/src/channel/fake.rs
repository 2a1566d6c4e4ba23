// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake worker channel for testing
//!
//! Records every call. Answers come from scripted values or, for status
//! exchanges, from a simulated controller-side job table.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::WorkerChannel;
use async_trait::async_trait;
use sked_core::{
    AgentDefinition, AgentHealth, JobDefinition, JobIteration, JobMetadata, JobState, JobStatus,
    JobStatusExchangeRequest, JobStatusExchangeResponse,
};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Recorded channel call
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCall {
    Registration { agent: AgentDefinition },
    Heartbeat { agent_id: String, health: AgentHealth },
    Metadata { cluster: String },
    StatusExchange { request: JobStatusExchangeRequest },
    Iterate { iteration: JobIteration },
    MarkAs { job_id: String, status: JobStatus },
}

#[derive(Default)]
struct FakeState {
    calls: Vec<ChannelCall>,
    offline: bool,
    failed_registrations: u32,
    metadata: Option<JobMetadata>,
    scripted: HashMap<(String, String), VecDeque<Option<JobStatusExchangeResponse>>>,
    jobs: BTreeMap<(String, String), JobDefinition>,
    iterations: u64,
}

/// Fake worker channel for testing
#[derive(Clone, Default)]
pub struct FakeWorkerChannel {
    state: Arc<Mutex<FakeState>>,
}

impl FakeWorkerChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ChannelCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Answer every call with `None` while offline
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Answer the next `count` registrations with `None`
    pub fn fail_registrations(&self, count: u32) {
        self.lock().failed_registrations = count;
    }

    pub fn set_metadata(&self, metadata: Option<JobMetadata>) {
        self.lock().metadata = metadata;
    }

    /// Queue the answer to the next exchange of `(group, job_type)`
    ///
    /// Scripted answers take precedence over the simulated job table.
    pub fn script_exchange(
        &self,
        group: &str,
        job_type: &str,
        response: Option<JobStatusExchangeResponse>,
    ) {
        self.lock()
            .scripted
            .entry((group.to_string(), job_type.to_ascii_lowercase()))
            .or_default()
            .push_back(response);
    }

    /// Add or replace a job in the simulated controller table
    pub fn put_job(&self, definition: JobDefinition) {
        self.lock().jobs.insert(
            (definition.group.clone(), definition.code.clone()),
            definition,
        );
    }

    /// Remove a job from the simulated controller table
    pub fn remove_job(&self, group: &str, code: &str) {
        self.lock()
            .jobs
            .remove(&(group.to_string(), code.to_string()));
    }

    /// Controller-side `code -> modified` view of one (group, type) pair
    pub fn controller_state(&self, group: &str, job_type: &str) -> JobState {
        self.lock()
            .jobs
            .values()
            .filter(|def| def.group == group && def.is_type(job_type))
            .map(|def| (def.code.clone(), def.modified))
            .collect()
    }

    pub fn registrations(&self) -> Vec<AgentDefinition> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Registration { agent } => Some(agent),
                _ => None,
            })
            .collect()
    }

    pub fn heartbeats(&self) -> Vec<AgentHealth> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Heartbeat { health, .. } => Some(health),
                _ => None,
            })
            .collect()
    }

    pub fn exchanges(&self) -> Vec<JobStatusExchangeRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::StatusExchange { request } => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn iterations(&self) -> Vec<JobIteration> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Iterate { iteration } => Some(iteration),
                _ => None,
            })
            .collect()
    }

    pub fn marks(&self) -> Vec<(String, JobStatus)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::MarkAs { job_id, status } => Some((job_id, status)),
                _ => None,
            })
            .collect()
    }
}

impl FakeState {
    fn simulate_exchange(&self, request: &JobStatusExchangeRequest) -> JobStatusExchangeResponse {
        let controller: BTreeMap<&str, &JobDefinition> = self
            .jobs
            .values()
            .filter(|def| def.group == request.group && def.is_type(&request.job_type))
            .map(|def| (def.code.as_str(), def))
            .collect();

        let mut response = JobStatusExchangeResponse {
            group: request.group.clone(),
            ..Default::default()
        };
        for code in request.state.keys() {
            if !controller.contains_key(code.as_str()) {
                response.removed.push(code.clone());
            }
        }
        for (code, def) in controller {
            match request.state.get(code) {
                None => {
                    response.added.insert(code.to_string(), def.clone());
                }
                Some(modified) if *modified != def.modified => {
                    response.updated.insert(code.to_string(), def.clone());
                }
                Some(_) => {}
            }
        }
        response
    }
}

#[async_trait]
impl WorkerChannel for FakeWorkerChannel {
    async fn registration(&self, agent: AgentDefinition) -> Option<AgentDefinition> {
        let mut state = self.lock();
        state.calls.push(ChannelCall::Registration {
            agent: agent.clone(),
        });
        if state.offline {
            return None;
        }
        if state.failed_registrations > 0 {
            state.failed_registrations -= 1;
            return None;
        }
        Some(agent)
    }

    async fn heartbeat(&self, agent_id: &str, health: AgentHealth) -> Option<AgentDefinition> {
        let mut state = self.lock();
        state.calls.push(ChannelCall::Heartbeat {
            agent_id: agent_id.to_string(),
            health: health.clone(),
        });
        if state.offline {
            return None;
        }
        let mut agent = state.calls.iter().rev().find_map(|call| match call {
            ChannelCall::Registration { agent } if agent.id == agent_id => Some(agent.clone()),
            _ => None,
        })?;
        agent.health = health;
        Some(agent)
    }

    async fn metadata(&self, cluster: &str) -> Option<JobMetadata> {
        let mut state = self.lock();
        state.calls.push(ChannelCall::Metadata {
            cluster: cluster.to_string(),
        });
        if state.offline {
            return None;
        }
        state.metadata.clone()
    }

    async fn status_exchange(
        &self,
        request: JobStatusExchangeRequest,
    ) -> Option<JobStatusExchangeResponse> {
        let mut state = self.lock();
        state.calls.push(ChannelCall::StatusExchange {
            request: request.clone(),
        });
        if state.offline {
            return None;
        }
        let slot = (request.group.clone(), request.job_type.to_ascii_lowercase());
        if let Some(scripted) = state.scripted.get_mut(&slot).and_then(VecDeque::pop_front) {
            return scripted;
        }
        Some(state.simulate_exchange(&request))
    }

    async fn iterate(&self, iteration: JobIteration) -> Option<JobIteration> {
        let mut state = self.lock();
        state.calls.push(ChannelCall::Iterate {
            iteration: iteration.clone(),
        });
        if state.offline {
            return None;
        }
        state.iterations += 1;
        Some(JobIteration {
            id: Some(format!("it-{}", state.iterations)),
            ..iteration
        })
    }

    async fn mark_as(&self, job_id: &str, status: JobStatus) -> Option<JobDefinition> {
        let mut state = self.lock();
        state.calls.push(ChannelCall::MarkAs {
            job_id: job_id.to_string(),
            status,
        });
        if state.offline {
            return None;
        }
        state.jobs.values().find(|def| def.id == job_id).cloned()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
