// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron expression parsing and evaluation
//!
//! Accepts five- or six-field expressions (seconds optional). Day-of-week
//! numbers follow Quartz, 1 = Sunday through 7 = Saturday. Evaluation is
//! always in UTC.

use chrono::{DateTime, Utc};
use croner::Cron;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors from cron parsing or evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    #[error("invalid cron expression {expression:?}: {message}")]
    Invalid { expression: String, message: String },
}

/// A parsed cron expression
#[derive(Clone)]
pub struct CronExpression {
    source: String,
    cron: Arc<Cron>,
}

impl CronExpression {
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let source = expression.trim().to_string();
        let cron = Cron::new(&source)
            .with_seconds_optional()
            .with_alternative_weekdays()
            .parse()
            .map_err(|e| CronError::Invalid {
                expression: source.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            source,
            cron: Arc::new(cron),
        })
    }

    /// Check validity without keeping the parsed form
    pub fn is_valid(expression: &str) -> bool {
        Self::parse(expression).is_ok()
    }

    /// The trimmed source text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// First occurrence strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.cron.find_next_occurrence(&after, false).ok()
    }
}

impl fmt::Debug for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronExpression").field(&self.source).finish()
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
