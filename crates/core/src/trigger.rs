// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger specifications
//!
//! [`build_triggers`] translates a job definition's schedule type into
//! engine-ready trigger specs. It is pure apart from logging: invalid input
//! never fails, it yields fewer triggers.

use crate::cron::CronExpression;
use crate::job::{JobDefinition, JobKey, JobScheduleType};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Trigger name used for the single fixed-period trigger of a job
pub const STATIC_PERIOD_TRIGGER: &str = "STATIC_PERIOD";

/// Trigger name used for the single immediate trigger of a job
pub const ONE_TIME_TRIGGER: &str = "ONE_TIME";

/// Identity of a trigger: `name` within the owning job's `group.code`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerKey {
    pub name: String,
    pub group: String,
}

impl TriggerKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }

    /// Key of a trigger named `name` attached to `job`
    pub fn for_job(name: impl Into<String>, job: &JobKey) -> Self {
        Self::new(name, job.to_string())
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.group, self.name)
    }
}

/// When a trigger fires
#[derive(Debug, Clone)]
pub enum TriggerSchedule {
    /// At every occurrence of a cron expression
    Cron(CronExpression),
    /// Immediately, then forever at a fixed interval
    FixedInterval(Duration),
    /// Once, as soon as scheduling completes
    Immediate,
}

impl TriggerSchedule {
    pub fn is_repeating(&self) -> bool {
        !matches!(self, TriggerSchedule::Immediate)
    }
}

/// An engine-ready trigger
#[derive(Debug, Clone)]
pub struct TriggerSpec {
    pub key: TriggerKey,
    pub job: JobKey,
    pub schedule: TriggerSchedule,
    /// No firing after this instant
    pub end_at: Option<DateTime<Utc>>,
}

/// Build the trigger set for a definition, dispatched on its schedule type
pub fn build_triggers(definition: &JobDefinition) -> Vec<TriggerSpec> {
    match definition.schedule_type {
        JobScheduleType::Cron => cron_triggers(definition),
        JobScheduleType::StaticPeriod => static_period_triggers(definition),
        JobScheduleType::OneTime => one_time_triggers(definition),
        JobScheduleType::Unknown => {
            tracing::warn!(
                code = %definition.code,
                group = %definition.group,
                "unknown schedule type, no triggers"
            );
            vec![]
        }
    }
}

/// One trigger per valid, unique cron expression
fn cron_triggers(definition: &JobDefinition) -> Vec<TriggerSpec> {
    let job = definition.key();
    let mut seen = HashSet::new();
    let mut triggers = Vec::new();

    for cron_trigger in &definition.cron_triggers {
        let expression = cron_trigger.expression.trim();

        if !seen.insert(expression.to_string()) {
            tracing::warn!(%job, expression, "skipping duplicate cron expression");
            continue;
        }

        let parsed = match CronExpression::parse(expression) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(%job, error = %e, "skipping invalid cron expression");
                continue;
            }
        };

        triggers.push(TriggerSpec {
            key: TriggerKey::for_job(expression, &job),
            job: job.clone(),
            schedule: TriggerSchedule::Cron(parsed),
            end_at: definition.end_at,
        });
    }

    triggers
}

/// A single repeat-forever trigger at the period truncated to whole seconds
fn static_period_triggers(definition: &JobDefinition) -> Vec<TriggerSpec> {
    let job = definition.key();

    let Some(period_ms) = definition.period.filter(|p| p.is_finite() && *p > 0.0) else {
        tracing::warn!(%job, "cannot create static period trigger without a period");
        return vec![];
    };

    let seconds = (period_ms / 1000.0).trunc() as u64;
    if seconds == 0 {
        tracing::warn!(%job, period_ms, "static period shorter than one second");
        return vec![];
    }

    vec![TriggerSpec {
        key: TriggerKey::for_job(STATIC_PERIOD_TRIGGER, &job),
        job,
        schedule: TriggerSchedule::FixedInterval(Duration::from_secs(seconds)),
        end_at: definition.end_at,
    }]
}

fn one_time_triggers(definition: &JobDefinition) -> Vec<TriggerSpec> {
    let job = definition.key();
    vec![TriggerSpec {
        key: TriggerKey::for_job(ONE_TIME_TRIGGER, &job),
        job,
        schedule: TriggerSchedule::Immediate,
        end_at: None,
    }]
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
