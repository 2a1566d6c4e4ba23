// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use proptest::prelude::*;
use yare::parameterized;

fn modified() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn definition(schedule_type: JobScheduleType) -> JobDefinition {
    JobDefinition::new("id-1", "job", "grp", "shell", schedule_type, modified())
}

fn names(triggers: &[TriggerSpec]) -> Vec<&str> {
    triggers.iter().map(|t| t.key.name.as_str()).collect()
}

// =============================================================================
// CRON
// =============================================================================

#[test]
fn cron_yields_one_trigger_per_expression() {
    let def = definition(JobScheduleType::Cron)
        .with_cron("0 0 * * * *")
        .with_cron("0 30 * * * *");

    let triggers = build_triggers(&def);
    assert_eq!(names(&triggers), vec!["0 0 * * * *", "0 30 * * * *"]);
    for trigger in &triggers {
        assert_eq!(trigger.job, def.key());
        assert_eq!(trigger.key.group, "grp.job");
        assert!(matches!(trigger.schedule, TriggerSchedule::Cron(_)));
    }
}

#[test]
fn cron_skips_duplicates_and_invalid_expressions() {
    let def = definition(JobScheduleType::Cron)
        .with_cron("0 0 * * * *")
        .with_cron("bogus")
        .with_cron("0 0 * * * *")
        .with_cron("0 15 * * * *")
        .with_cron("99 * * * * *");

    let triggers = build_triggers(&def);
    assert_eq!(names(&triggers), vec!["0 0 * * * *", "0 15 * * * *"]);
}

#[test]
fn cron_duplicates_compare_trimmed_text() {
    let def = definition(JobScheduleType::Cron)
        .with_cron("0 0 * * * *")
        .with_cron(" 0 0 * * * * ");

    assert_eq!(build_triggers(&def).len(), 1);
}

#[test]
fn cron_without_expressions_yields_nothing() {
    assert!(build_triggers(&definition(JobScheduleType::Cron)).is_empty());
}

#[test]
fn cron_triggers_are_bound_to_end_at() {
    let end_at = Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap();
    let def = definition(JobScheduleType::Cron)
        .with_cron("0 0 * * * *")
        .with_end_at(end_at);

    let triggers = build_triggers(&def);
    assert_eq!(triggers[0].end_at, Some(end_at));
}

// =============================================================================
// STATIC_PERIOD
// =============================================================================

#[parameterized(
    exact_seconds = { 5000.0, 5 },
    truncates_fraction = { 2500.0, 2 },
    one_second = { 1000.0, 1 },
    one_hour = { 3_600_000.0, 3600 },
)]
fn static_period_interval_in_whole_seconds(period_ms: f64, expected_secs: u64) {
    let def = definition(JobScheduleType::StaticPeriod).with_period(period_ms);

    let triggers = build_triggers(&def);
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0].key.name, STATIC_PERIOD_TRIGGER);
    match &triggers[0].schedule {
        TriggerSchedule::FixedInterval(every) => {
            assert_eq!(*every, Duration::from_secs(expected_secs))
        }
        other => panic!("expected fixed interval, got {:?}", other),
    }
}

#[parameterized(
    zero = { Some(0.0) },
    absent = { None },
    negative = { Some(-1000.0) },
    sub_second = { Some(999.0) },
)]
fn static_period_without_usable_period_yields_nothing(period: Option<f64>) {
    let mut def = definition(JobScheduleType::StaticPeriod);
    def.period = period;
    assert!(build_triggers(&def).is_empty());
}

#[test]
fn static_period_is_bound_to_end_at() {
    let end_at = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();
    let def = definition(JobScheduleType::StaticPeriod)
        .with_period(60_000.0)
        .with_end_at(end_at);
    assert_eq!(build_triggers(&def)[0].end_at, Some(end_at));
}

// =============================================================================
// ONE_TIME / unknown
// =============================================================================

#[test]
fn one_time_yields_single_immediate_trigger() {
    let def = definition(JobScheduleType::OneTime);

    let triggers = build_triggers(&def);
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0].key.name, ONE_TIME_TRIGGER);
    assert!(matches!(triggers[0].schedule, TriggerSchedule::Immediate));
    assert!(!triggers[0].schedule.is_repeating());
}

#[test]
fn unknown_schedule_type_yields_nothing() {
    let def = definition(JobScheduleType::Unknown)
        .with_cron("0 0 * * * *")
        .with_period(1000.0);
    assert!(build_triggers(&def).is_empty());
}

// =============================================================================
// Properties
// =============================================================================

fn arb_expression() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("0 0 * * * *".to_string()),
        Just("0 15 * * * *".to_string()),
        Just("0 0 12 * * *".to_string()),
        Just("0 0/5 * * * *".to_string()),
        Just("not cron".to_string()),
        Just("61 * * * * *".to_string()),
        Just("* *".to_string()),
    ]
}

proptest! {
    #[test]
    fn cron_yields_exactly_the_valid_unique_expressions(
        expressions in proptest::collection::vec(arb_expression(), 0..12)
    ) {
        let mut def = definition(JobScheduleType::Cron);
        for expression in &expressions {
            def = def.with_cron(expression.clone());
        }

        let mut expected: Vec<String> = Vec::new();
        for expression in &expressions {
            if CronExpression::is_valid(expression) && !expected.contains(expression) {
                expected.push(expression.clone());
            }
        }

        let triggers = build_triggers(&def);
        let actual: Vec<String> = triggers.iter().map(|t| t.key.name.clone()).collect();
        prop_assert_eq!(actual, expected);
    }
}
