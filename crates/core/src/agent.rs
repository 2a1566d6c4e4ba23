// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity and liveness signals
//!
//! An agent is one running worker process, identified by `worker@cluster`.
//! The controller learns about agents through a registration call and keeps
//! them alive through periodic heartbeats carrying an [`AgentHealth`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Kind of liveness signal sent to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentActivityType {
    /// Agent signals registration
    Register,
    /// Agent signals it is still alive
    Heartbeat,
    /// Agent is shutting down
    Shutdown,
}

impl fmt::Display for AgentActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentActivityType::Register => write!(f, "REGISTER"),
            AgentActivityType::Heartbeat => write!(f, "HEARTBEAT"),
            AgentActivityType::Shutdown => write!(f, "SHUTDOWN"),
        }
    }
}

/// Snapshot sent with every liveness signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentHealth {
    pub timestamp: DateTime<Utc>,
    pub activity_type: AgentActivityType,
}

impl AgentHealth {
    pub fn new(timestamp: DateTime<Utc>, activity_type: AgentActivityType) -> Self {
        Self {
            timestamp,
            activity_type,
        }
    }
}

/// Resolved `worker@cluster` identity of this process
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentIdentity {
    pub worker: String,
    pub cluster: String,
}

impl AgentIdentity {
    pub fn new(worker: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
            cluster: cluster.into(),
        }
    }

    /// The globally unique agent id
    pub fn id(&self) -> String {
        format!("{}@{}", self.worker, self.cluster)
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.worker, self.cluster)
    }
}

/// Identity of a running worker instance as known by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub id: String,
    /// Display name, same as the id
    #[serde(default)]
    pub name: String,
    pub worker: String,
    pub cluster: String,
    /// Whether this agent also drives the sync loop
    #[serde(default)]
    pub supervisor: bool,
    pub health: AgentHealth,
    /// Heartbeat interval in minutes; the controller uses it to detect staleness
    #[serde(default)]
    pub expected_signal_minutes: f64,
    pub registered: DateTime<Utc>,
}

impl AgentDefinition {
    /// Build the registration snapshot for `identity` at `now`
    pub fn registration(
        identity: &AgentIdentity,
        supervisor: bool,
        signal_rate: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let id = identity.id();
        Self {
            name: id.clone(),
            id,
            worker: identity.worker.clone(),
            cluster: identity.cluster.clone(),
            supervisor,
            health: AgentHealth::new(now, AgentActivityType::Register),
            expected_signal_minutes: expected_signal_minutes(signal_rate),
            registered: now,
        }
    }
}

/// Whole seconds of the signal rate expressed in minutes
pub fn expected_signal_minutes(signal_rate: Duration) -> f64 {
    signal_rate.as_secs() as f64 / 60.0
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
