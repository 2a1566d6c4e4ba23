// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Datelike, TimeZone, Timelike, Weekday};
use yare::parameterized;

#[parameterized(
    six_fields_every_minute = { "0 * * * * *" },
    five_fields_hourly = { "0 * * * *" },
    stepped_minutes = { "0 0/5 * * * *" },
    weekday_names = { "0 30 9 * * MON-FRI" },
    padded = { "  0 0 12 * * *  " },
)]
fn accepts_valid_expressions(expression: &str) {
    assert!(CronExpression::is_valid(expression));
}

#[parameterized(
    garbage = { "not a cron" },
    too_few_fields = { "* * *" },
    seconds_out_of_range = { "61 * * * * *" },
    empty = { "" },
    zero_day_of_week = { "0 0 12 ? * 0" },
)]
fn rejects_invalid_expressions(expression: &str) {
    let err = CronExpression::parse(expression).unwrap_err();
    assert!(matches!(err, CronError::Invalid { .. }));
}

#[test]
fn next_occurrence_is_strictly_after() {
    let expr = CronExpression::parse("0 0 * * * *").unwrap();
    let on_the_hour = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();

    let next = expr.next_after(on_the_hour).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).unwrap());
}

#[test]
fn seconds_field_is_honored() {
    let expr = CronExpression::parse("30 * * * * *").unwrap();
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();

    let next = expr.next_after(start).unwrap();
    assert_eq!(next.second(), 30);
    assert_eq!(next.minute(), 0);
}

#[test]
fn source_is_trimmed() {
    let expr = CronExpression::parse(" 0 0 * * * * ").unwrap();
    assert_eq!(expr.as_str(), "0 0 * * * *");
    assert_eq!(expr.to_string(), "0 0 * * * *");
}

#[parameterized(
    sunday = { "0 0 12 ? * 1", Weekday::Sun },
    monday = { "0 0 12 ? * 2", Weekday::Mon },
    friday = { "0 0 12 ? * 6", Weekday::Fri },
    saturday = { "0 0 12 ? * 7", Weekday::Sat },
    monday_by_name = { "0 0 12 ? * MON", Weekday::Mon },
)]
fn day_of_week_numbers_start_at_sunday_one(expression: &str, weekday: Weekday) {
    let expr = CronExpression::parse(expression).unwrap();
    // a Thursday
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

    let next = expr.next_after(start).unwrap();
    assert_eq!(next.weekday(), weekday);
    assert_eq!(next.hour(), 12);
}

#[test]
fn weekday_range_covers_working_week() {
    let expr = CronExpression::parse("0 0 9 ? * 2-6").unwrap();
    // Saturday
    let mut at = Utc.with_ymd_and_hms(2026, 1, 3, 0, 0, 0).unwrap();

    let mut seen = Vec::new();
    for _ in 0..5 {
        at = expr.next_after(at).unwrap();
        seen.push(at.weekday());
    }
    assert_eq!(
        seen,
        vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
    );
}
