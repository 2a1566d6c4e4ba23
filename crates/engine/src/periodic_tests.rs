// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting(count: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + Send + 'static {
    let count = Arc::clone(count);
    move || {
        count.fetch_add(1, Ordering::SeqCst);
        std::future::ready(())
    }
}

#[tokio::test(start_paused = true)]
async fn first_run_is_immediate() {
    let count = Arc::new(AtomicUsize::new(0));
    let cancel = CancellationToken::new();
    let handle = spawn_periodic("test", Duration::from_secs(30), cancel.clone(), counting(&count));

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn runs_once_per_period() {
    let count = Arc::new(AtomicUsize::new(0));
    let cancel = CancellationToken::new();
    let handle = spawn_periodic("test", Duration::from_secs(10), cancel.clone(), counting(&count));

    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(count.load(Ordering::SeqCst), 4);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn slow_action_skips_missed_ticks() {
    let count = Arc::new(AtomicUsize::new(0));
    let cancel = CancellationToken::new();
    let runs = Arc::clone(&count);
    let handle = spawn_periodic("slow", Duration::from_secs(10), cancel.clone(), move || {
        let runs = Arc::clone(&runs);
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(25)).await;
        }
    });

    // Runs at 0s and 30s; the ticks at 10s and 20s fall inside the first run
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancel_interrupts_running_action() {
    let cancel = CancellationToken::new();
    let finished = Arc::new(AtomicUsize::new(0));
    let done = Arc::clone(&finished);
    let handle = spawn_periodic("stuck", Duration::from_secs(1), cancel.clone(), move || {
        let done = Arc::clone(&done);
        async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            done.fetch_add(1, Ordering::SeqCst);
        }
    });

    tokio::time::sleep(Duration::from_secs(5)).await;
    cancel.cancel();
    handle.await.unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 0);
}
