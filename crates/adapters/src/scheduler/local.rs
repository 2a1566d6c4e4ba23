// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process scheduler engine
//!
//! One driver task sleeps until the earliest pending fire, takes every due
//! fire out of the table, and spawns the executions. Executions are bounded
//! by a semaphore of `parallelism` permits. All table mutations happen under
//! one lock, so replacing a job swaps its detail and full trigger set at once.

use super::timeline::{Fire, Timeline};
use super::{
    EngineError, EngineFactory, EngineOptions, ExecutionListener, JobCompletion, JobStore,
    SchedulerEngine, TriggerFinalized,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sked_core::{
    Clock, JobDetail, JobKey, SystemClock, TriggerKey, TriggerSchedule, TriggerSpec,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum EngineState {
    #[default]
    Standby,
    Started,
    ShutDown,
}

struct JobEntry {
    detail: JobDetail,
    triggers: BTreeSet<TriggerKey>,
}

struct TriggerEntry {
    spec: TriggerSpec,
    generation: u64,
}

/// A due fire taken out of the table
struct Firing {
    detail: JobDetail,
    trigger: TriggerKey,
    at: DateTime<Utc>,
    /// Set when this was the trigger's last fire
    finalized: Option<TriggerFinalized>,
}

#[derive(Default)]
struct Table {
    state: EngineState,
    jobs: BTreeMap<JobKey, JobEntry>,
    triggers: HashMap<TriggerKey, TriggerEntry>,
    timeline: Timeline,
    generation: u64,
}

fn until(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or_default()
}

fn past_end(spec: &TriggerSpec, at: DateTime<Utc>) -> bool {
    spec.end_at.is_some_and(|end| at > end)
}

/// First fire of a freshly installed trigger, `None` if it never fires
fn first_fire(
    spec: &TriggerSpec,
    now: Instant,
    now_at: DateTime<Utc>,
) -> Option<(Instant, DateTime<Utc>)> {
    let (deadline, at) = match &spec.schedule {
        TriggerSchedule::Immediate | TriggerSchedule::FixedInterval(_) => (now, now_at),
        TriggerSchedule::Cron(cron) => {
            let at = cron.next_after(now_at)?;
            (now + until(now_at, at), at)
        }
    };
    if past_end(spec, at) {
        return None;
    }
    Some((deadline, at))
}

/// Fire following `fire`, skipping any that were missed
fn next_fire(
    spec: &TriggerSpec,
    fire: &Fire,
    now: Instant,
    now_at: DateTime<Utc>,
) -> Option<(Instant, DateTime<Utc>)> {
    let (deadline, at) = match &spec.schedule {
        TriggerSchedule::Immediate => return None,
        TriggerSchedule::FixedInterval(every) => {
            // An interval past the representable range never fires again
            let step = chrono::Duration::from_std(*every).ok()?;
            let mut deadline = fire.deadline.checked_add(*every)?;
            let mut at = fire.at.checked_add_signed(step)?;
            if deadline <= now && !every.is_zero() {
                let behind = now.duration_since(deadline).as_nanos() / every.as_nanos();
                let skipped = i32::try_from(behind + 1).unwrap_or(i32::MAX);
                deadline = deadline.checked_add(every.checked_mul(skipped.unsigned_abs())?)?;
                at = at.checked_add_signed(step.checked_mul(skipped)?)?;
            }
            (deadline, at)
        }
        TriggerSchedule::Cron(cron) => {
            let at = cron.next_after(fire.at)?;
            let deadline = fire.deadline + until(fire.at, at);
            if deadline > now {
                (deadline, at)
            } else {
                let at = cron.next_after(now_at)?;
                (now + until(now_at, at), at)
            }
        }
    };
    if past_end(spec, at) {
        return None;
    }
    Some((deadline, at))
}

impl Table {
    fn ensure_live(&self) -> Result<(), EngineError> {
        match self.state {
            EngineState::ShutDown => Err(EngineError::ShutDown),
            _ => Ok(()),
        }
    }

    fn install(
        &mut self,
        detail: JobDetail,
        triggers: Vec<(TriggerSpec, Instant, DateTime<Utc>)>,
    ) {
        let key = detail.key.clone();
        self.remove_job(&key);

        let mut names = BTreeSet::new();
        for (spec, deadline, at) in triggers {
            self.generation += 1;
            self.timeline
                .push(deadline, at, spec.key.clone(), self.generation);
            names.insert(spec.key.clone());
            self.triggers.insert(
                spec.key.clone(),
                TriggerEntry {
                    spec,
                    generation: self.generation,
                },
            );
        }
        self.jobs.insert(
            key,
            JobEntry {
                detail,
                triggers: names,
            },
        );
        self.compact();
    }

    fn remove_job(&mut self, key: &JobKey) -> bool {
        let Some(entry) = self.jobs.remove(key) else {
            return false;
        };
        for trigger in &entry.triggers {
            self.triggers.remove(trigger);
        }
        true
    }

    /// Remove one trigger, and its job with it if it was the last one
    fn remove_trigger(&mut self, trigger: &TriggerKey) -> bool {
        let Some(entry) = self.triggers.remove(trigger) else {
            return false;
        };
        let job = &entry.spec.job;
        let orphaned = match self.jobs.get_mut(job) {
            Some(job_entry) => {
                job_entry.triggers.remove(trigger);
                job_entry.triggers.is_empty()
            }
            None => false,
        };
        if orphaned {
            tracing::debug!(%job, "last trigger removed, deleting job");
            self.jobs.remove(job);
        }
        true
    }

    /// Drop stale timeline entries once they outnumber live triggers
    fn compact(&mut self) {
        if self.timeline.len() <= 2 * self.triggers.len() + 16 {
            return;
        }
        let triggers = &self.triggers;
        self.timeline.retain(|fire| {
            triggers
                .get(&fire.trigger)
                .is_some_and(|entry| entry.generation == fire.generation)
        });
    }

    fn take_due(&mut self, now: Instant, now_at: DateTime<Utc>) -> Vec<Firing> {
        let mut firings = Vec::new();

        while let Some(fire) = self.timeline.pop_due(now) {
            let spec = match self.triggers.get(&fire.trigger) {
                Some(entry) if entry.generation == fire.generation => entry.spec.clone(),
                _ => continue,
            };
            let Some(job) = self.jobs.get(&spec.job) else {
                continue;
            };
            let detail = job.detail.clone();

            let finalized = match next_fire(&spec, &fire, now, now_at) {
                Some((deadline, at)) => {
                    self.timeline
                        .push(deadline, at, spec.key.clone(), fire.generation);
                    None
                }
                None => {
                    self.remove_trigger(&spec.key);
                    Some(TriggerFinalized {
                        trigger: spec.key.clone(),
                        key: spec.job.clone(),
                        definition: Some(detail.definition.clone()),
                    })
                }
            };

            firings.push(Firing {
                detail,
                trigger: spec.key,
                at: fire.at,
                finalized,
            });
        }

        firings
    }
}

struct Inner<C> {
    options: EngineOptions,
    clock: C,
    table: Mutex<Table>,
    listeners: RwLock<Vec<Arc<dyn ExecutionListener>>>,
    wake: Notify,
    permits: Arc<Semaphore>,
    permit_count: u32,
    driver: Mutex<Option<JoinHandle<()>>>,
}

/// In-process scheduler engine with an in-memory job table
#[derive(Clone)]
pub struct LocalScheduler<C: Clock = SystemClock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> LocalScheduler<C> {
    pub fn new(options: EngineOptions, clock: C) -> Result<Self, EngineError> {
        if options.parallelism == 0 {
            return Err(EngineError::InvalidOptions(
                "parallelism must be greater than zero".to_string(),
            ));
        }
        let permit_count = u32::try_from(options.parallelism)
            .ok()
            .filter(|n| (*n as usize) <= Semaphore::MAX_PERMITS)
            .ok_or_else(|| {
                EngineError::InvalidOptions(format!(
                    "parallelism {} is too large",
                    options.parallelism
                ))
            })?;
        if let JobStore::Jdbc { data_source, .. } = &options.store {
            return Err(EngineError::UnsupportedStore(format!(
                "shared data source {} for instance {}",
                data_source, options.instance_name
            )));
        }

        Ok(Self {
            inner: Arc::new(Inner {
                permits: Arc::new(Semaphore::new(options.parallelism)),
                permit_count,
                options,
                clock,
                table: Mutex::new(Table::default()),
                listeners: RwLock::new(Vec::new()),
                wake: Notify::new(),
                driver: Mutex::new(None),
            }),
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    pub fn is_started(&self) -> bool {
        self.table().state == EngineState::Started
    }

    /// Nominal time of a trigger's next fire
    pub fn next_fire_time(&self, trigger: &TriggerKey) -> Option<DateTime<Utc>> {
        let table = self.table();
        let entry = table.triggers.get(trigger)?;
        table
            .timeline
            .find(trigger, entry.generation)
            .map(|fire| fire.at)
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.inner.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn live_table(&self) -> Result<MutexGuard<'_, Table>, EngineError> {
        let table = self.table();
        table.ensure_live()?;
        Ok(table)
    }

    fn listeners(&self) -> Vec<Arc<dyn ExecutionListener>> {
        self.inner
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn drive(self) {
        loop {
            let next = self.table().timeline.next_deadline();
            let sleep = async {
                match next {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = self.inner.wake.notified() => continue,
                _ = sleep => {}
            }

            let firings = self
                .table()
                .take_due(Instant::now(), self.inner.clock.now());
            for firing in firings {
                self.dispatch(firing);
            }
        }
    }

    fn dispatch(&self, firing: Firing) {
        let permits = self.inner.permits.clone();
        let listeners = self.listeners();

        tokio::spawn(async move {
            let key = firing.detail.key.clone();
            let Ok(_permit) = permits.acquire_owned().await else {
                tracing::debug!(job = %key, "engine shut down, fire dropped");
                return;
            };

            tracing::debug!(job = %key, trigger = %firing.trigger, "job fired");
            let started = Instant::now();
            let detail = firing.detail.clone();
            let at = firing.at;
            let outcome = tokio::spawn(async move { detail.run(at).await }).await;
            let runtime = started.elapsed();

            let error = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("job aborted: {}", e)),
            };
            match &error {
                None => tracing::debug!(
                    job = %key,
                    elapsed_ms = runtime.as_millis() as u64,
                    "job completed"
                ),
                Some(error) => tracing::warn!(
                    job = %key,
                    elapsed_ms = runtime.as_millis() as u64,
                    error = %error,
                    "job failed"
                ),
            }

            let completion = JobCompletion {
                key,
                trigger: firing.trigger,
                definition: Some(firing.detail.definition),
                fired_at: at,
                runtime,
                error,
            };
            for listener in &listeners {
                listener.on_job_completed(&completion).await;
            }
            if let Some(finalized) = firing.finalized {
                for listener in &listeners {
                    listener.on_trigger_finalized(&finalized).await;
                }
            }
        });
    }
}

#[async_trait]
impl<C: Clock> SchedulerEngine for LocalScheduler<C> {
    async fn check_exists(&self, key: &JobKey) -> Result<bool, EngineError> {
        Ok(self.live_table()?.jobs.contains_key(key))
    }

    async fn schedule_job(
        &self,
        detail: JobDetail,
        triggers: Vec<TriggerSpec>,
        replace: bool,
    ) -> Result<(), EngineError> {
        let key = detail.key.clone();
        {
            let mut table = self.live_table()?;
            if triggers.is_empty() {
                return Err(EngineError::NoTriggers(key));
            }
            if !replace && table.jobs.contains_key(&key) {
                return Err(EngineError::AlreadyExists(key));
            }

            let now = Instant::now();
            let now_at = self.inner.clock.now();
            let firing: Vec<_> = triggers
                .into_iter()
                .filter_map(|spec| match first_fire(&spec, now, now_at) {
                    Some((deadline, at)) => Some((spec, deadline, at)),
                    None => {
                        tracing::warn!(job = %key, trigger = %spec.key, "trigger will never fire");
                        None
                    }
                })
                .collect();
            if firing.is_empty() {
                return Err(EngineError::NeverFires(key));
            }

            table.install(detail, firing);
        }
        self.inner.wake.notify_one();
        Ok(())
    }

    async fn job_detail(&self, key: &JobKey) -> Result<Option<JobDetail>, EngineError> {
        Ok(self
            .live_table()?
            .jobs
            .get(key)
            .map(|entry| entry.detail.clone()))
    }

    async fn delete_job(&self, key: &JobKey) -> Result<bool, EngineError> {
        let mut table = self.live_table()?;
        let removed = table.remove_job(key);
        table.compact();
        Ok(removed)
    }

    async fn unschedule_trigger(&self, trigger: &TriggerKey) -> Result<bool, EngineError> {
        let mut table = self.live_table()?;
        let removed = table.remove_trigger(trigger);
        table.compact();
        Ok(removed)
    }

    async fn triggers_of_job(&self, key: &JobKey) -> Result<Vec<TriggerKey>, EngineError> {
        Ok(self
            .live_table()?
            .jobs
            .get(key)
            .map(|entry| entry.triggers.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn job_keys(&self, group: &str) -> Result<Vec<JobKey>, EngineError> {
        Ok(self
            .live_table()?
            .jobs
            .keys()
            .filter(|key| key.group == group)
            .cloned()
            .collect())
    }

    async fn job_group_names(&self) -> Result<Vec<String>, EngineError> {
        let groups: BTreeSet<String> = self
            .live_table()?
            .jobs
            .keys()
            .map(|key| key.group.clone())
            .collect();
        Ok(groups.into_iter().collect())
    }

    fn add_listener(&self, listener: Arc<dyn ExecutionListener>) {
        tracing::debug!(listener = listener.name(), "listener attached");
        self.inner
            .listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    async fn start(&self) -> Result<(), EngineError> {
        {
            let mut table = self.live_table()?;
            if table.state == EngineState::Started {
                return Ok(());
            }
            table.state = EngineState::Started;
        }

        let handle = tokio::spawn(self.clone().drive());
        *self.inner.driver.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        tracing::info!(
            instance = %self.inner.options.instance_name,
            instance_id = %self.inner.options.instance_id,
            parallelism = self.inner.options.parallelism,
            "scheduler started"
        );
        Ok(())
    }

    async fn shutdown(&self, wait_for_jobs: bool) -> Result<(), EngineError> {
        {
            let mut table = self.table();
            if table.state == EngineState::ShutDown {
                return Ok(());
            }
            table.state = EngineState::ShutDown;
        }

        let driver = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(driver) = driver {
            driver.abort();
        }

        if wait_for_jobs {
            // Every permit back means no execution is running
            if let Ok(all) = self.inner.permits.acquire_many(self.inner.permit_count).await {
                all.forget();
            }
        }
        self.inner.permits.close();

        tracing::info!(
            instance = %self.inner.options.instance_name,
            waited = wait_for_jobs,
            "scheduler shut down"
        );
        Ok(())
    }
}

/// Builds [`LocalScheduler`]s sharing one clock
#[derive(Clone, Default)]
pub struct LocalEngineFactory<C = SystemClock> {
    clock: C,
}

impl<C: Clock> LocalEngineFactory<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> EngineFactory for LocalEngineFactory<C> {
    type Engine = LocalScheduler<C>;

    fn build(&self, options: &EngineOptions) -> Result<Self::Engine, EngineError> {
        LocalScheduler::new(options.clone(), self.clock.clone())
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
