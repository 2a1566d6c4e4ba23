// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in job types
//!
//! `shell` runs `sh -c <data.command>`. A non-zero exit fails the run with
//! the exit status and the tail of stderr.

use async_trait::async_trait;
use sked_core::{JobContext, JobError, JobHandler, JobRegistry};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

pub const SHELL_TYPE: &str = "shell";

/// Module key of [`ShellDefaults`]
pub const SHELL_DEFAULTS: &str = "defaults";

/// Longest stderr excerpt carried in a failure message
const STDERR_TAIL: usize = 512;

/// Settings shared by every shell job of this process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellDefaults {
    /// Working directory when the job names none
    pub workdir: Option<PathBuf>,
}

pub struct ShellJob;

#[async_trait]
impl JobHandler for ShellJob {
    async fn execute(&self, ctx: JobContext) -> Result<(), JobError> {
        let command = ctx
            .data_str("command")
            .filter(|command| !command.trim().is_empty())
            .ok_or_else(|| JobError::MissingData("command".to_string()))?;

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .env("SKED_JOB_ID", &ctx.definition.id)
            .env("SKED_JOB_CODE", &ctx.key.code)
            .env("SKED_JOB_GROUP", &ctx.key.group)
            .env("SKED_FIRED_AT", ctx.fired_at.to_rfc3339())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let workdir = ctx.data_str("workdir").map(PathBuf::from).or_else(|| {
            ctx.module::<ShellDefaults>(SHELL_DEFAULTS)
                .and_then(|defaults| defaults.workdir.clone())
        });
        if let Some(workdir) = workdir {
            cmd.current_dir(workdir);
        }

        tracing::debug!(job = %ctx.key, command, "running shell job");
        let output = cmd
            .output()
            .await
            .map_err(|e| JobError::Failed(format!("cannot run sh: {}", e)))?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail = tail(stderr.trim_end(), STDERR_TAIL);
        Err(JobError::Failed(if tail.is_empty() {
            output.status.to_string()
        } else {
            format!("{}: {}", output.status, tail)
        }))
    }
}

/// Register every built-in job type
pub fn register_builtin(registry: &mut JobRegistry, shell: ShellDefaults) {
    registry
        .register(SHELL_TYPE, ShellJob)
        .register_module(SHELL_TYPE, SHELL_DEFAULTS, shell);
}

/// The last `max` bytes of `text`, cut at a char boundary
fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
