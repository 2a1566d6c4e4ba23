// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

#[test]
fn identity_is_worker_at_cluster() {
    let identity = AgentIdentity::new("node-7", "c1");
    assert_eq!(identity.id(), "node-7@c1");
    assert_eq!(identity.to_string(), "node-7@c1");
}

#[test]
fn registration_snapshot_carries_identity_and_health() {
    let identity = AgentIdentity::new("node-7", "c1");
    let agent = AgentDefinition::registration(&identity, true, Duration::from_secs(90), now());

    assert_eq!(agent.id, "node-7@c1");
    assert_eq!(agent.name, "node-7@c1");
    assert_eq!(agent.worker, "node-7");
    assert_eq!(agent.cluster, "c1");
    assert!(agent.supervisor);
    assert_eq!(agent.health.activity_type, AgentActivityType::Register);
    assert_eq!(agent.health.timestamp, now());
    assert_eq!(agent.registered, now());
    assert!((agent.expected_signal_minutes - 1.5).abs() < f64::EPSILON);
}

#[test]
fn expected_signal_minutes_ignores_sub_second_part() {
    let minutes = expected_signal_minutes(Duration::from_millis(30_900));
    assert!((minutes - 0.5).abs() < f64::EPSILON);
}

#[test]
fn agent_definition_uses_camel_case_on_the_wire() {
    let identity = AgentIdentity::new("w", "c");
    let agent = AgentDefinition::registration(&identity, false, Duration::from_secs(60), now());
    let json = serde_json::to_value(&agent).unwrap();

    assert_eq!(json["expectedSignalMinutes"], 1.0);
    assert_eq!(json["health"]["activityType"], "REGISTER");
    assert_eq!(json["supervisor"], false);

    let back: AgentDefinition = serde_json::from_value(json).unwrap();
    assert_eq!(back, agent);
}
