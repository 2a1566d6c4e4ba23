// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn random_names_are_distinct_uuids() {
    let names = RandomWorkerNames;
    let first = names.generate();
    let second = names.generate();

    assert_ne!(first, second);
    assert!(uuid::Uuid::parse_str(&first).is_ok());
}

#[test]
fn random_names_are_safe_for_agent_ids() {
    let name = RandomWorkerNames.generate();
    assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn fixed_name_repeats() {
    let names = FixedWorkerName::new("node-x");
    assert_eq!(names.generate(), "node-x");
    assert_eq!(names.clone().generate(), "node-x");
}
