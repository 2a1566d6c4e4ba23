// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sked worker engine: controller lifecycle, reconciliation and reporting

mod controller;
mod error;
mod heartbeat;
mod listener;
mod periodic;
mod reconcile;

pub use controller::{WorkerController, WorkerDeps, WorkerState};
pub use error::{SyncError, WorkerError};
pub use heartbeat::Heartbeat;
pub use listener::{CompletionMarker, IterationReporter};
pub use periodic::spawn_periodic;
pub use reconcile::{AppliedOperation, Reconciler, SyncReport};
