// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-rate background actions
//!
//! The action is awaited inline, so one run is in flight at a time; ticks
//! missed while it runs are dropped rather than queued.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run `action` every `period` until `cancel` fires; the first run is immediate
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut action: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::debug!(loop_name = name, period_ms = period.as_millis() as u64, "loop started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticks.tick() => {}
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = action() => {}
            }
        }

        tracing::debug!(loop_name = name, "loop stopped");
    })
}

#[cfg(test)]
#[path = "periodic_tests.rs"]
mod tests;
