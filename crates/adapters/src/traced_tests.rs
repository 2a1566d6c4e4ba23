// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::channel::{ChannelCall, FakeWorkerChannel};
use chrono::Utc;
use sked_core::{AgentActivityType, AgentIdentity, JobState};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn agent() -> AgentDefinition {
    AgentDefinition::registration(
        &AgentIdentity::new("node-a", "c1"),
        true,
        Duration::from_secs(30),
        Utc::now(),
    )
}

// =============================================================================
// Pass-through
// =============================================================================

#[tokio::test]
async fn traced_channel_forwards_calls() {
    let fake = FakeWorkerChannel::new();
    let traced = TracedWorkerChannel::new(fake.clone());

    let registered = traced.registration(agent()).await;
    assert_eq!(registered.map(|a| a.id), Some("node-a@c1".to_string()));

    traced
        .heartbeat(
            "node-a@c1",
            AgentHealth::new(Utc::now(), AgentActivityType::Heartbeat),
        )
        .await
        .unwrap();
    assert!(traced.metadata("c1").await.is_none());

    let calls = traced.inner().calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(calls[2], ChannelCall::Metadata { ref cluster } if cluster == "c1"));
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_registration_logs_span_and_timing() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedWorkerChannel::new(FakeWorkerChannel::new());
        traced.registration(agent()).await
    });

    assert!(result.is_some());
    assert!(
        logs.contains("channel.registration"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("agent registered"),
        "Should log completion. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_metadata_logs_absence() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeWorkerChannel::new();
        fake.set_offline(true);
        TracedWorkerChannel::new(fake).metadata("c1").await
    });

    assert!(result.is_none());
    assert!(
        logs.contains("metadata absent"),
        "Should warn on absent answer. Logs:\n{}",
        logs
    );
    assert!(logs.contains("WARN"), "Should log at warn. Logs:\n{}", logs);
}

#[test]
fn traced_exchange_logs_delta_sizes() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedWorkerChannel::new(FakeWorkerChannel::new());
        let mut state = JobState::new();
        state.insert("gone".to_string(), Utc::now());
        traced
            .status_exchange(JobStatusExchangeRequest::new("g1", "shell", "c1", state))
            .await
    });

    assert_eq!(result.map(|r| r.removed), Some(vec!["gone".to_string()]));
    assert!(
        logs.contains("channel.exchange"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("removed=1"),
        "Should log delta sizes. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_mark_as_logs_status() {
    let (logs, _) = with_tracing(|| async {
        let traced = TracedWorkerChannel::new(FakeWorkerChannel::new());
        traced.mark_as("j-1", JobStatus::Completed).await
    });

    assert!(
        logs.contains("COMPLETED"),
        "Should log the status. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("mark absent"),
        "Unknown job yields no answer. Logs:\n{}",
        logs
    );
}
