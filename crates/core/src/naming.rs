// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker names for agents configured without one

/// Source of worker names; a name must be unique within its cluster
pub trait WorkerNames: Clone + Send + Sync + 'static {
    fn generate(&self) -> String;
}

/// Random v4 UUID names
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWorkerNames;

impl WorkerNames for RandomWorkerNames {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Hands out one preset name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedWorkerName(String);

impl FixedWorkerName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl WorkerNames for FixedWorkerName {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
