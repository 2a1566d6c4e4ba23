// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job definitions as owned by the controller
//!
//! A [`JobDefinition`] is consumed read-only by the worker. Its `modified`
//! stamp is the synchronization version: the worker reports the stamp it is
//! running and the controller answers with what changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a job's triggers are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobScheduleType {
    /// Repeat forever at a fixed period
    StaticPeriod,
    /// One trigger per cron expression
    Cron,
    /// Fire once, immediately
    OneTime,
    /// Anything this worker does not understand
    #[serde(other)]
    Unknown,
}

impl fmt::Display for JobScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobScheduleType::StaticPeriod => write!(f, "STATIC_PERIOD"),
            JobScheduleType::Cron => write!(f, "CRON"),
            JobScheduleType::OneTime => write!(f, "ONE_TIME"),
            JobScheduleType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Lifecycle status of a job definition on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Active,
    Paused,
    Completed,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Active => write!(f, "ACTIVE"),
            JobStatus::Paused => write!(f, "PAUSED"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// A single cron rule attached to a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CronTrigger {
    pub expression: String,
}

impl CronTrigger {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }
}

/// Execution options of a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobExecution {
    /// Suppress iteration reporting
    #[serde(default)]
    pub silent_iterations: bool,
}

/// A job definition pulled from the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    pub id: String,
    pub code: String,
    pub group: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub schedule_type: JobScheduleType,
    /// Period in milliseconds, meaningful for `STATIC_PERIOD`
    #[serde(default)]
    pub period: Option<f64>,
    /// Cron rules, meaningful for `CRON`
    #[serde(default)]
    pub cron_triggers: Vec<CronTrigger>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub execution: Option<JobExecution>,
    /// Free-form payload handed to the job handler
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl JobDefinition {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        group: impl Into<String>,
        job_type: impl Into<String>,
        schedule_type: JobScheduleType,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            group: group.into(),
            job_type: job_type.into(),
            schedule_type,
            period: None,
            cron_triggers: vec![],
            end_at: None,
            modified,
            execution: None,
            data: None,
        }
    }

    pub fn with_period(mut self, period_ms: f64) -> Self {
        self.period = Some(period_ms);
        self
    }

    pub fn with_cron(mut self, expression: impl Into<String>) -> Self {
        self.cron_triggers.push(CronTrigger::new(expression));
        self
    }

    pub fn with_end_at(mut self, end_at: DateTime<Utc>) -> Self {
        self.end_at = Some(end_at);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn silent(mut self) -> Self {
        self.execution = Some(JobExecution {
            silent_iterations: true,
        });
        self
    }

    /// The engine key of this definition
    pub fn key(&self) -> JobKey {
        JobKey::new(&self.code, &self.group)
    }

    /// Whether iteration reports are suppressed
    pub fn is_silent(&self) -> bool {
        self.execution
            .as_ref()
            .is_some_and(|execution| execution.silent_iterations)
    }

    /// Whether this definition is of the given type (case-insensitive)
    pub fn is_type(&self, job_type: &str) -> bool {
        self.job_type.eq_ignore_ascii_case(job_type)
    }
}

/// Composite `(code, group)` key of a live schedule entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub code: String,
    pub group: String,
}

impl JobKey {
    pub fn new(code: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            group: group.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.code)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
