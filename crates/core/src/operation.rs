// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduling operations and their outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

/// A mutation of the live schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulingOperation {
    Schedule,
    Reschedule,
    Unschedule,
}

impl fmt::Display for SchedulingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingOperation::Schedule => write!(f, "schedule"),
            SchedulingOperation::Reschedule => write!(f, "reschedule"),
            SchedulingOperation::Unschedule => write!(f, "unschedule"),
        }
    }
}

/// Why an operation was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// A live entry already exists for the key
    AlreadyScheduled,
    /// No live entry exists for the key
    NotScheduled,
    /// No handler is registered for the job type
    NoHandler,
    /// The definition yields no usable trigger
    NoTriggers,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyScheduled => write!(f, "already scheduled"),
            SkipReason::NotScheduled => write!(f, "not scheduled"),
            SkipReason::NoHandler => write!(f, "no handler for job type"),
            SkipReason::NoTriggers => write!(f, "no usable trigger"),
        }
    }
}

/// Result of a single schedule/reschedule/unschedule call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Applied,
    Skipped(SkipReason),
    Failed(String),
}

impl OperationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, OperationOutcome::Applied)
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutcome::Applied => write!(f, "applied"),
            OperationOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            OperationOutcome::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}
