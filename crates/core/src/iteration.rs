// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recorded execution outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Outcome of one job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IterationStatus {
    Success,
    Failure,
}

impl fmt::Display for IterationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IterationStatus::Success => write!(f, "SUCCESS"),
            IterationStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// One execution record, reported to the controller after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobIteration {
    /// Assigned by the controller
    #[serde(default)]
    pub id: Option<String>,
    pub job_id: String,
    /// Run time in milliseconds
    pub runtime: u64,
    pub status: IterationStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl JobIteration {
    /// Build an unsaved iteration from a run's outcome
    pub fn from_run(
        job_id: impl Into<String>,
        runtime: Duration,
        error: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let status = if error.is_none() {
            IterationStatus::Success
        } else {
            IterationStatus::Failure
        };
        Self {
            id: None,
            job_id: job_id.into(),
            runtime: u64::try_from(runtime.as_millis()).unwrap_or(u64::MAX),
            status,
            message: error,
            timestamp,
        }
    }
}

#[cfg(test)]
#[path = "iteration_tests.rs"]
mod tests;
