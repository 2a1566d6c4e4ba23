// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job handler registry and the job factory
//!
//! Handlers are registered per job type in an explicit [`JobRegistry`] built
//! at startup. The [`JobFactory`] resolves a definition's type to its handler
//! and packages it, together with the modules registered for that type, into
//! a [`JobDetail`] the scheduler engine can run.

use crate::job::{JobDefinition, JobKey};
use crate::trigger::{self, TriggerSpec};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single job execution
///
/// The display text becomes the iteration message reported to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job data is missing {0}")]
    MissingData(String),
    #[error("module not registered: {0}")]
    MissingModule(String),
    #[error("{0}")]
    Failed(String),
}

/// Business logic for one job type
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn execute(&self, ctx: JobContext) -> Result<(), JobError>;
}

type Module = Arc<dyn Any + Send + Sync>;

/// Typed modules injected into every job of a type
#[derive(Clone, Default)]
pub struct JobModules {
    entries: Arc<BTreeMap<String, Module>>,
}

impl JobModules {
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.entries.get(key)?.clone().downcast::<T>().ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for JobModules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// Everything a handler sees for one firing
#[derive(Debug, Clone)]
pub struct JobContext {
    pub key: JobKey,
    pub definition: JobDefinition,
    pub fired_at: DateTime<Utc>,
    modules: JobModules,
}

impl JobContext {
    pub fn new(
        key: JobKey,
        definition: JobDefinition,
        fired_at: DateTime<Utc>,
        modules: JobModules,
    ) -> Self {
        Self {
            key,
            definition,
            fired_at,
            modules,
        }
    }

    /// A module registered for this job's type
    pub fn module<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.modules.get(key)
    }

    /// A string field of the definition's data payload
    pub fn data_str(&self, field: &str) -> Option<&str> {
        self.definition.data.as_ref()?.get(field)?.as_str()
    }
}

/// An executable job handle: definition, handler and injected modules
///
/// Non-durable: the engine drops it once its last trigger is gone.
#[derive(Clone)]
pub struct JobDetail {
    pub key: JobKey,
    pub definition: JobDefinition,
    handler: Arc<dyn JobHandler>,
    modules: JobModules,
}

impl JobDetail {
    pub fn new(
        key: JobKey,
        definition: JobDefinition,
        handler: Arc<dyn JobHandler>,
        modules: JobModules,
    ) -> Self {
        Self {
            key,
            definition,
            handler,
            modules,
        }
    }

    /// Same handle, carrying a replacement definition
    pub fn with_definition(mut self, definition: JobDefinition) -> Self {
        self.definition = definition;
        self
    }

    pub fn context(&self, fired_at: DateTime<Utc>) -> JobContext {
        JobContext::new(
            self.key.clone(),
            self.definition.clone(),
            fired_at,
            self.modules.clone(),
        )
    }

    /// Run the handler once
    pub async fn run(&self, fired_at: DateTime<Utc>) -> Result<(), JobError> {
        self.handler.execute(self.context(fired_at)).await
    }
}

impl fmt::Debug for JobDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDetail")
            .field("key", &self.key)
            .field("definition", &self.definition)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

/// Job types this worker can execute
///
/// Types are matched case-insensitively.
#[derive(Clone, Default)]
pub struct JobRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
    modules: HashMap<String, BTreeMap<String, Module>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler of `job_type`, replacing any previous one
    pub fn register(&mut self, job_type: &str, handler: impl JobHandler) -> &mut Self {
        self.handlers
            .insert(job_type.to_ascii_lowercase(), Arc::new(handler));
        self
    }

    /// Register a module handed to every job of `job_type`
    pub fn register_module<T: Any + Send + Sync>(
        &mut self,
        job_type: &str,
        key: &str,
        module: T,
    ) -> &mut Self {
        self.modules
            .entry(job_type.to_ascii_lowercase())
            .or_default()
            .insert(key.to_string(), Arc::new(module));
        self
    }

    pub fn handler(&self, job_type: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&job_type.to_ascii_lowercase()).cloned()
    }

    pub fn modules(&self, job_type: &str) -> JobModules {
        let entries = self
            .modules
            .get(&job_type.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default();
        JobModules {
            entries: Arc::new(entries),
        }
    }

    pub fn supports(&self, job_type: &str) -> bool {
        self.handlers.contains_key(&job_type.to_ascii_lowercase())
    }

    /// Registered types, lowercased and sorted
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRegistry")
            .field("types", &self.types())
            .finish_non_exhaustive()
    }
}

/// Builds job handles and trigger sets from definitions
#[derive(Debug, Clone)]
pub struct JobFactory {
    registry: Arc<JobRegistry>,
}

impl JobFactory {
    pub fn new(registry: JobRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Handle for `definition`, or `None` when its type has no handler
    pub fn build_job(&self, key: JobKey, definition: JobDefinition) -> Option<JobDetail> {
        let Some(handler) = self.registry.handler(&definition.job_type) else {
            tracing::error!(
                job = %key,
                job_type = %definition.job_type,
                "no handler registered for job type"
            );
            return None;
        };
        let modules = self.registry.modules(&definition.job_type);
        Some(JobDetail::new(key, definition, handler, modules))
    }

    pub fn build_triggers(&self, definition: &JobDefinition) -> Vec<TriggerSpec> {
        trigger::build_triggers(definition)
    }

    pub fn supports(&self, job_type: &str) -> bool {
        self.registry.supports(job_type)
    }

    pub fn types(&self) -> Vec<String> {
        self.registry.types()
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
