//! Tick runner: drains due lanes with a bounded-concurrency deletion pool
//!
//! One tick visits the lanes that were due when it started, oldest first.
//! Entries within a lane run concurrently up to the pool limit; the runner
//! waits for the pool to drain before advancing to the next lane, so "lane
//! fully retired" is a real checkpoint. Ticks never overlap: a timer firing
//! while a slow tick is still running is a no-op.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::lanes::{LaneBoard, MessageStatus};
use crate::ledger::{ExpirationEntry, RetentionLedger};
use crate::observability::Metrics;

use super::MessageDeleter;

pub struct TickRunner {
    lanes: Arc<Mutex<LaneBoard>>,
    ledger: Arc<RetentionLedger>,
    deleter: Arc<dyn MessageDeleter>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
    concurrency: usize,
    in_flight: AtomicBool,
}

impl TickRunner {
    pub fn new(
        lanes: Arc<Mutex<LaneBoard>>,
        ledger: Arc<RetentionLedger>,
        deleter: Arc<dyn MessageDeleter>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
        concurrency: usize,
    ) -> Self {
        Self {
            lanes,
            ledger,
            deleter,
            clock,
            metrics,
            concurrency,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one drain cycle. Returns false without touching any state when a
    /// previous invocation is still running (single-flight per process).
    pub async fn run_tick(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Tick still in flight, skipping");
            return false;
        }

        self.drain_due_lanes().await;
        self.metrics.tick_completed();

        self.in_flight.store(false, Ordering::SeqCst);
        true
    }

    async fn drain_due_lanes(&self) {
        let now = self.clock.now();

        // Snapshot: lanes enqueued after this point wait for the next tick
        let due = self.lanes.lock().await.due_lanes(now);

        for lane in due {
            let batch = self.lanes.lock().await.claim_unprocessed(lane);
            if batch.is_empty() {
                continue;
            }

            debug!(lane, entries = batch.len(), "Draining lane");

            let pool = Arc::new(Semaphore::new(self.concurrency));
            let mut tasks = JoinSet::new();

            for entry in batch {
                let pool = Arc::clone(&pool);
                let lanes = Arc::clone(&self.lanes);
                let ledger = Arc::clone(&self.ledger);
                let deleter = Arc::clone(&self.deleter);
                let metrics = Arc::clone(&self.metrics);

                tasks.spawn(async move {
                    let Ok(_permit) = pool.acquire_owned().await else {
                        return;
                    };
                    process_entry(entry, lane, lanes, ledger, deleter, metrics).await;
                });
            }

            // Full drain before the next lane
            while tasks.join_next().await.is_some() {}

            info!(lane, "Lane drained");
        }
    }
}

/// Drive the runner on a fixed-period timer until shutdown is signaled.
/// The loop only checks the signal between ticks, so an in-flight tick
/// always runs to completion before the task exits.
pub fn spawn_tick_loop(
    runner: Arc<TickRunner>,
    period: Duration,
) -> (JoinHandle<()>, watch::Sender<bool>) {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Tick loop stopping");
                    break;
                }
                _ = interval.tick() => {
                    runner.run_tick().await;
                }
            }
        }
    });
    (handle, shutdown_tx)
}

/// Delete one message, retire its ledger entry, and remove it from the lane.
/// Errors stay contained to this entry.
async fn process_entry(
    entry: ExpirationEntry,
    lane: u64,
    lanes: Arc<Mutex<LaneBoard>>,
    ledger: Arc<RetentionLedger>,
    deleter: Arc<dyn MessageDeleter>,
    metrics: Arc<Metrics>,
) {
    let status = match deleter.delete(&entry.channel_id, &entry.message_id).await {
        Ok(()) => {
            metrics.deletion_succeeded();
            MessageStatus::Processed
        }
        Err(err) => {
            // No retry: a permanently failing delete must not block the lane
            warn!(
                guild_id = %entry.guild_id,
                channel_id = %entry.channel_id,
                message_id = %entry.message_id,
                error = %err,
                "Cannot delete message"
            );
            metrics.deletion_failed();
            MessageStatus::Unprocessable
        }
    };

    match ledger.clear_expiry(&entry.message_ref()).await {
        Ok(()) => {
            lanes.lock().await.retire(lane, &entry.message_id);
        }
        Err(err) => {
            // Keep the entry parked in its terminal status so it is never
            // re-dispatched this run; the ledger row survives for the next
            // restart's backfill.
            error!(
                message_id = %entry.message_id,
                error = %err,
                "Failed to retire ledger entry"
            );
            lanes.lock().await.mark(lane, &entry.message_id, status);
        }
    }
}
