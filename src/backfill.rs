//! Startup reconciliation: reload due and soon-due ledger entries into
//! lanes so a restart does not lose pending work. Entries whose channel no
//! longer exists in the tracked community can never be actioned and are
//! dropped from the store outright.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::directory::GuildDirectory;
use crate::lanes::LaneBoard;
use crate::ledger::RetentionLedger;
use crate::observability::Metrics;
use crate::store::Result;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    pub enqueued: usize,
    pub orphaned: usize,
}

/// Reload overdue entries plus those due within `window` seconds.
/// The caller logs and swallows the error; a failed backfill degrades to
/// "those entries wait for the next restart", never a crash.
pub async fn backfill_lanes(
    ledger: &RetentionLedger,
    lanes: &Arc<Mutex<LaneBoard>>,
    directory: &dyn GuildDirectory,
    clock: &dyn Clock,
    window: u64,
    metrics: &Metrics,
) -> Result<BackfillReport> {
    let now = clock.now();
    let mut report = BackfillReport::default();

    for guild_id in directory.tracked_guilds() {
        let due = ledger.find_due(&guild_id, now, window).await?;

        for entry in due {
            if !directory.channel_exists(&guild_id, &entry.channel_id) {
                debug!(
                    guild_id = %entry.guild_id,
                    channel_id = %entry.channel_id,
                    message_id = %entry.message_id,
                    "Dropping expiration for vanished channel"
                );
                ledger.clear_expiry(&entry.message_ref()).await?;
                metrics.entry_orphaned();
                report.orphaned += 1;
                continue;
            }

            lanes.lock().await.enqueue(entry);
            report.enqueued += 1;
        }
    }

    info!(
        enqueued = report.enqueued,
        orphaned = report.orphaned,
        "Backfilled lanes"
    );
    Ok(report)
}
