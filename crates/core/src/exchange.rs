// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response types exchanged with the controller during sync

use crate::job::JobDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Groups and types the controller knows for a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Last-known `modified` stamp per job code, as observed by a worker
pub type JobState = BTreeMap<String, DateTime<Utc>>;

/// Worker's view of one (group, type) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusExchangeRequest {
    pub group: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub cluster: String,
    pub state: JobState,
}

impl JobStatusExchangeRequest {
    pub fn new(
        group: impl Into<String>,
        job_type: impl Into<String>,
        cluster: impl Into<String>,
        state: JobState,
    ) -> Self {
        Self {
            group: group.into(),
            job_type: job_type.into(),
            cluster: cluster.into(),
            state,
        }
    }
}

/// Controller's delta against a worker's state
///
/// `removed`, `added` and `updated` are disjoint by code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatusExchangeResponse {
    pub group: String,
    #[serde(default)]
    pub removed: Vec<String>,
    #[serde(default)]
    pub added: BTreeMap<String, JobDefinition>,
    #[serde(default)]
    pub updated: BTreeMap<String, JobDefinition>,
}

impl JobStatusExchangeResponse {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.updated.is_empty()
    }

    /// Whether the three partitions share no code
    pub fn is_disjoint(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.removed
            .iter()
            .chain(self.added.keys())
            .chain(self.updated.keys())
            .all(|code| seen.insert(code.as_str()))
    }
}

#[cfg(test)]
#[path = "exchange_tests.rs"]
mod tests;
