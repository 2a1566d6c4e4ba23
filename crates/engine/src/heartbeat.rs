// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness signals sent under the registered agent id

use sked_adapters::WorkerChannel;
use sked_core::{AgentActivityType, AgentDefinition, AgentHealth, Clock};

#[derive(Clone)]
pub struct Heartbeat<W, C> {
    channel: W,
    clock: C,
    agent_id: String,
}

impl<W: WorkerChannel, C: Clock> Heartbeat<W, C> {
    pub fn new(channel: W, clock: C, agent_id: impl Into<String>) -> Self {
        Self {
            channel,
            clock,
            agent_id: agent_id.into(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Report a fresh health snapshot; a missing answer is logged only
    pub async fn signal(&self, activity: AgentActivityType) -> Option<AgentDefinition> {
        let health = AgentHealth::new(self.clock.now(), activity);
        let answer = self.channel.heartbeat(&self.agent_id, health).await;
        match &answer {
            Some(_) => tracing::debug!(agent = %self.agent_id, %activity, "signal acknowledged"),
            None => tracing::warn!(agent = %self.agent_id, %activity, "signal not acknowledged"),
        }
        answer
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
