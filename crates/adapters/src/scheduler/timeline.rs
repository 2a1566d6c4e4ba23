// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending trigger fires, earliest first
//!
//! Entries are never removed eagerly. Each carries the generation of the
//! trigger installation that produced it; the engine discards entries whose
//! generation no longer matches its table.

use chrono::{DateTime, Utc};
use sked_core::TriggerKey;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tokio::time::Instant;

/// A pending fire of one trigger installation
#[derive(Debug, Clone)]
pub(crate) struct Fire {
    pub deadline: Instant,
    /// Nominal fire time handed to the job
    pub at: DateTime<Utc>,
    pub trigger: TriggerKey,
    pub generation: u64,
    seq: u64,
}

impl PartialEq for Fire {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Fire {}

impl PartialOrd for Fire {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fire {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: earliest first, insertion order among equals
        Reverse((self.deadline, self.seq)).cmp(&Reverse((other.deadline, other.seq)))
    }
}

#[derive(Debug, Default)]
pub(crate) struct Timeline {
    fires: BinaryHeap<Fire>,
    seq: u64,
}

impl Timeline {
    pub fn push(
        &mut self,
        deadline: Instant,
        at: DateTime<Utc>,
        trigger: TriggerKey,
        generation: u64,
    ) {
        self.seq += 1;
        self.fires.push(Fire {
            deadline,
            at,
            trigger,
            generation,
            seq: self.seq,
        });
    }

    /// Pop the earliest fire if it is due at `now`
    pub fn pop_due(&mut self, now: Instant) -> Option<Fire> {
        if self.fires.peek()?.deadline > now {
            return None;
        }
        self.fires.pop()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.fires.peek().map(|fire| fire.deadline)
    }

    /// The pending fire of one trigger installation, if any
    pub fn find(&self, trigger: &TriggerKey, generation: u64) -> Option<&Fire> {
        self.fires
            .iter()
            .find(|fire| fire.generation == generation && &fire.trigger == trigger)
    }

    /// Drop entries for which `live` is false
    pub fn retain(&mut self, live: impl Fn(&Fire) -> bool) {
        self.fires.retain(|fire| live(fire));
    }

    pub fn len(&self) -> usize {
        self.fires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fires.is_empty()
    }
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod tests;
