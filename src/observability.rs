//! Process-wide counters exposed on the stats endpoint

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    messages_scheduled: AtomicU64,
    deletions_succeeded: AtomicU64,
    deletions_failed: AtomicU64,
    entries_orphaned: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    ticks_completed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_scheduled(&self) {
        self.messages_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn deletion_succeeded(&self) {
        self.deletions_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn deletion_failed(&self) {
        self.deletions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entry_orphaned(&self) {
        self.entries_orphaned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tick_completed(&self) {
        self.ticks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_scheduled: self.messages_scheduled.load(Ordering::Relaxed),
            deletions_succeeded: self.deletions_succeeded.load(Ordering::Relaxed),
            deletions_failed: self.deletions_failed.load(Ordering::Relaxed),
            entries_orphaned: self.entries_orphaned.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            ticks_completed: self.ticks_completed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub messages_scheduled: u64,
    pub deletions_succeeded: u64,
    pub deletions_failed: u64,
    pub entries_orphaned: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub ticks_completed: u64,
}
