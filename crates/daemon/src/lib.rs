// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sked daemon: configuration, built-in job types and worker startup

pub mod jobs;
pub mod lifecycle;

pub use jobs::{register_builtin, ShellDefaults, ShellJob};
pub use lifecycle::{
    build, start, startup, ControllerConfig, DaemonConfig, DaemonWorker, LifecycleError,
    LoggingConfig,
};
