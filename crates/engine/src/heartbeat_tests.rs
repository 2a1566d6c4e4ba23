// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use chrono::Utc;
use sked_adapters::{ChannelCall, FakeWorkerChannel};
use sked_core::{AgentIdentity, FakeClock};
use std::time::Duration;

fn clock() -> FakeClock {
    FakeClock::at(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
}

async fn registered(channel: &FakeWorkerChannel, clock: &FakeClock) -> String {
    let identity = AgentIdentity::new("w1", "c1");
    let agent =
        AgentDefinition::registration(&identity, true, Duration::from_secs(30), clock.now());
    channel.registration(agent).await.unwrap().id
}

#[tokio::test]
async fn signal_carries_current_time_and_activity() {
    let channel = FakeWorkerChannel::new();
    let clock = clock();
    let id = registered(&channel, &clock).await;
    clock.advance(Duration::from_secs(45));

    let heartbeat = Heartbeat::new(channel.clone(), clock.clone(), id.clone());
    let agent = heartbeat.signal(AgentActivityType::Heartbeat).await.unwrap();

    assert_eq!(agent.id, "w1@c1");
    assert_eq!(agent.health.activity_type, AgentActivityType::Heartbeat);
    assert_eq!(agent.health.timestamp, clock.now());
    assert_eq!(
        channel.calls().last(),
        Some(&ChannelCall::Heartbeat {
            agent_id: id,
            health: AgentHealth::new(clock.now(), AgentActivityType::Heartbeat),
        })
    );
}

#[tokio::test]
async fn unacknowledged_signal_is_absent() {
    let channel = FakeWorkerChannel::new();
    let clock = clock();
    let id = registered(&channel, &clock).await;
    channel.set_offline(true);

    let heartbeat = Heartbeat::new(channel.clone(), clock, id);
    assert!(heartbeat.signal(AgentActivityType::Heartbeat).await.is_none());
    assert_eq!(channel.heartbeats().len(), 1);
}

#[tokio::test]
async fn unknown_agent_is_not_acknowledged() {
    let channel = FakeWorkerChannel::new();
    let heartbeat = Heartbeat::new(channel.clone(), clock(), "ghost@c1");

    assert_eq!(heartbeat.agent_id(), "ghost@c1");
    assert!(heartbeat.signal(AgentActivityType::Shutdown).await.is_none());
    assert_eq!(
        channel.heartbeats()[0].activity_type,
        AgentActivityType::Shutdown
    );
}
