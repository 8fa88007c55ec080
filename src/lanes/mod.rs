//! Lane scheduler: in-memory buckets of pending expirations keyed by their
//! expiry timestamp (second granularity)
//!
//! Lanes are exclusively owned by the single scheduling process. Processing
//! status is a transient annotation that only exists here; the persistent
//! ledger never records it. Lane membership means "not yet retired from
//! scheduling", independent of status.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::ledger::ExpirationEntry;

/// In-memory processing state for a lane entry
///
/// `Processed` and `Unprocessable` are terminal: once set, no further
/// deletion attempt happens for that entry in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Unprocessed,
    Processing,
    Processed,
    Unprocessable,
}

impl MessageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Processed | MessageStatus::Unprocessable)
    }
}

/// A scheduled expiration enriched with its transient status
#[derive(Debug, Clone)]
pub struct LaneEntry {
    pub entry: ExpirationEntry,
    pub status: MessageStatus,
}

/// All lanes, ascending by expiry timestamp. Within a lane, entries are held
/// in message-id order (stable, no cross-entry ordering is guaranteed).
#[derive(Debug, Default)]
pub struct LaneBoard {
    lanes: BTreeMap<u64, BTreeMap<String, LaneEntry>>,
}

impl LaneBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert: re-enqueuing a message id into its lane is a
    /// no-op and preserves the existing status.
    pub fn enqueue(&mut self, entry: ExpirationEntry) {
        let lane = self.lanes.entry(entry.expires_at).or_default();
        lane.entry(entry.message_id.clone()).or_insert(LaneEntry {
            entry,
            status: MessageStatus::Unprocessed,
        });
    }

    /// Snapshot of lane keys with timestamp <= now, oldest first. Lanes
    /// created after this call are deferred to the next tick.
    pub fn due_lanes(&self, now: u64) -> Vec<u64> {
        self.lanes.range(..=now).map(|(ts, _)| *ts).collect()
    }

    /// Transition every `Unprocessed` entry of a lane to `Processing` and
    /// return them for dispatch. Entries already in flight or terminal are
    /// left untouched, which makes redundant ticks safe.
    pub fn claim_unprocessed(&mut self, lane: u64) -> Vec<ExpirationEntry> {
        let Some(entries) = self.lanes.get_mut(&lane) else {
            return Vec::new();
        };

        let mut claimed = Vec::new();
        for lane_entry in entries.values_mut() {
            if lane_entry.status == MessageStatus::Unprocessed {
                lane_entry.status = MessageStatus::Processing;
                claimed.push(lane_entry.entry.clone());
            }
        }
        claimed
    }

    /// Record a terminal status without removing the entry (used when the
    /// ledger could not be cleared; the entry must not be re-dispatched)
    pub fn mark(&mut self, lane: u64, message_id: &str, status: MessageStatus) {
        if let Some(entries) = self.lanes.get_mut(&lane) {
            if let Some(lane_entry) = entries.get_mut(message_id) {
                lane_entry.status = status;
            }
        }
    }

    /// Remove an entry from its lane; an emptied lane is removed with it
    pub fn retire(&mut self, lane: u64, message_id: &str) -> bool {
        let Some(entries) = self.lanes.get_mut(&lane) else {
            return false;
        };
        let removed = entries.remove(message_id).is_some();
        if entries.is_empty() {
            self.lanes.remove(&lane);
        }
        removed
    }

    pub fn status_of(&self, lane: u64, message_id: &str) -> Option<MessageStatus> {
        self.lanes
            .get(&lane)
            .and_then(|entries| entries.get(message_id))
            .map(|lane_entry| lane_entry.status)
    }

    pub fn contains(&self, lane: u64, message_id: &str) -> bool {
        self.status_of(lane, message_id).is_some()
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn entry_count(&self) -> usize {
        self.lanes.values().map(|entries| entries.len()).sum()
    }

    pub fn stats(&self) -> LaneStats {
        LaneStats {
            lanes: self.lane_count(),
            entries: self.entry_count(),
            next_due: self.lanes.keys().next().copied(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LaneStats {
    pub lanes: usize,
    pub entries: usize,
    pub next_due: Option<u64>,
}
