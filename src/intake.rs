//! Message-intake path: on each new message in a tracked community, look up
//! the channel's retention policy and, if one is set, schedule the
//! expiration and enqueue it into the lane scheduler.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::clock::Clock;
use crate::lanes::LaneBoard;
use crate::ledger::{ExpirationEntry, MessageRef, RetentionLedger};
use crate::observability::Metrics;
use crate::store::Result;

pub struct Intake {
    ledger: Arc<RetentionLedger>,
    lanes: Arc<Mutex<LaneBoard>>,
    clock: Arc<dyn Clock>,
    metrics: Arc<Metrics>,
}

impl Intake {
    pub fn new(
        ledger: Arc<RetentionLedger>,
        lanes: Arc<Mutex<LaneBoard>>,
        clock: Arc<dyn Clock>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            ledger,
            lanes,
            clock,
            metrics,
        }
    }

    /// Handle a message-create event. Returns the scheduled expiry
    /// timestamp, or `None` when the channel has no retention policy.
    ///
    /// Store errors propagate to the caller; the event layer owns
    /// user-visible messaging.
    pub async fn on_message_create(&self, message: &MessageRef) -> Result<Option<u64>> {
        let Some(ttl) = self.ledger.get_ttl(&message.channel(), false).await? else {
            debug!(
                guild_id = %message.guild_id,
                channel_id = %message.channel_id,
                message_id = %message.message_id,
                "No retention policy, message ignored"
            );
            return Ok(None);
        };

        // Saturate so an absurd TTL pins the expiry at the far future
        // instead of overflowing
        let expires_at = self.clock.now().saturating_add(ttl);

        self.ledger.schedule_expiry(message, expires_at).await?;

        self.lanes.lock().await.enqueue(ExpirationEntry {
            guild_id: message.guild_id.clone(),
            channel_id: message.channel_id.clone(),
            message_id: message.message_id.clone(),
            expires_at,
        });

        self.metrics.message_scheduled();
        debug!(
            guild_id = %message.guild_id,
            channel_id = %message.channel_id,
            message_id = %message.message_id,
            expires_at,
            "Message pushed to lane"
        );

        Ok(Some(expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::clock::ManualClock;
    use crate::ledger::ChannelRef;
    use crate::store::RetentionStore;
    use std::time::Duration;
    use tempfile::TempDir;

    fn build_intake(now: u64) -> (Intake, Arc<RetentionLedger>, Arc<Mutex<LaneBoard>>, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = RetentionStore::open(temp.path().join("retention")).unwrap();
        let metrics = Arc::new(Metrics::new());
        let ledger = Arc::new(RetentionLedger::new(
            store,
            Arc::new(MemoryCache::new()),
            Duration::from_secs(3600),
            Arc::clone(&metrics),
        ));
        let lanes = Arc::new(Mutex::new(LaneBoard::new()));
        let intake = Intake::new(
            Arc::clone(&ledger),
            Arc::clone(&lanes),
            Arc::new(ManualClock::at(now)),
            metrics,
        );
        (intake, ledger, lanes, temp)
    }

    #[tokio::test]
    async fn schedules_expiry_at_creation_plus_ttl() {
        let (intake, ledger, lanes, _temp) = build_intake(1000);
        ledger
            .set_ttl(&ChannelRef::new("g1", "c1"), 60)
            .await
            .unwrap();

        let message = MessageRef::new("g1", "c1", "m1");
        let expires_at = intake.on_message_create(&message).await.unwrap();
        assert_eq!(expires_at, Some(1060));

        // Entry exists in both the persistent ledger and the lane set
        assert_eq!(ledger.get_expiry(&message, true).await.unwrap(), Some(1060));
        assert!(lanes.lock().await.contains(1060, "m1"));
    }

    #[tokio::test]
    async fn no_policy_means_no_entry() {
        let (intake, ledger, lanes, _temp) = build_intake(1000);

        let message = MessageRef::new("g1", "c1", "m1");
        assert_eq!(intake.on_message_create(&message).await.unwrap(), None);

        assert_eq!(ledger.get_expiry(&message, true).await.unwrap(), None);
        assert_eq!(lanes.lock().await.entry_count(), 0);
    }

    #[tokio::test]
    async fn oversized_ttl_saturates_instead_of_overflowing() {
        let (intake, ledger, lanes, _temp) = build_intake(1000);
        ledger
            .set_ttl(&ChannelRef::new("g1", "c1"), u64::MAX)
            .await
            .unwrap();

        let message = MessageRef::new("g1", "c1", "m1");
        let expires_at = intake.on_message_create(&message).await.unwrap();
        assert_eq!(expires_at, Some(u64::MAX));

        assert_eq!(
            ledger.get_expiry(&message, true).await.unwrap(),
            Some(u64::MAX)
        );
        assert!(lanes.lock().await.contains(u64::MAX, "m1"));
    }

    #[tokio::test]
    async fn duplicate_event_is_idempotent_in_lane() {
        let (intake, _ledger, lanes, _temp) = build_intake(1000);
        let ledger = &intake.ledger;
        ledger
            .set_ttl(&ChannelRef::new("g1", "c1"), 60)
            .await
            .unwrap();

        let message = MessageRef::new("g1", "c1", "m1");
        intake.on_message_create(&message).await.unwrap();
        intake.on_message_create(&message).await.unwrap();

        assert_eq!(lanes.lock().await.entry_count(), 1);
    }
}
