// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn successful_run_has_no_message() {
    let iteration = JobIteration::from_run("j1", Duration::from_millis(1500), None, Utc::now());
    assert_eq!(iteration.status, IterationStatus::Success);
    assert_eq!(iteration.runtime, 1500);
    assert!(iteration.id.is_none());
    assert!(iteration.message.is_none());
}

#[test]
fn failed_run_carries_error_message() {
    let iteration = JobIteration::from_run(
        "j1",
        Duration::from_millis(3),
        Some("exit status 2".to_string()),
        Utc::now(),
    );
    assert_eq!(iteration.status, IterationStatus::Failure);
    assert_eq!(iteration.message.as_deref(), Some("exit status 2"));
}

#[test]
fn iteration_wire_format() {
    let iteration = JobIteration::from_run("j1", Duration::from_millis(7), None, Utc::now());
    let json = serde_json::to_value(&iteration).unwrap();
    assert_eq!(json["jobId"], "j1");
    assert_eq!(json["status"], "SUCCESS");
    assert!(json["id"].is_null());
}
