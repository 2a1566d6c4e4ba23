// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the worker controller

use sked_adapters::EngineError;
use sked_core::ConfigError;
use thiserror::Error;

/// Fatal errors of the worker lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: crate::WorkerState,
    },
    #[error("scheduler engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),
    #[error("registration failed after {attempts} attempts")]
    RegistrationExhausted { attempts: u32 },
}

/// Failure of one sync cycle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("no job metadata for cluster {cluster}")]
    MetadataUnavailable { cluster: String },
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}
