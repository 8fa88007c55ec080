//! Expiration ledger: typed operations over the retention store with a
//! cache-aside accelerator in front of it
//!
//! Read path: cache first (unless forced), with `-1` as the negative
//! sentinel meaning "confirmed no policy / no entry" so that channels
//! without retention never cost a store round-trip. Misses and forced reads
//! consult the store and repopulate the cache, sentinel included.
//!
//! Write path: store write first (authoritative), then a best-effort cache
//! write. Cache failures never cross this module's boundary.

pub mod models;

pub use models::{ChannelRef, ChannelRetention, ExpirationEntry, ExpirationRecord, MessageRef};

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cache::RetentionCache;
use crate::observability::Metrics;
use crate::store::{RetentionStore, Result};

/// Cached sentinel meaning "confirmed absent", distinct from a missing key
const NO_POLICY: &str = "-1";

fn channel_ttl_key(channel: &ChannelRef) -> String {
    format!(
        "channel_retention.{}-{}.ttl",
        channel.guild_id, channel.channel_id
    )
}

fn message_expiry_key(message: &MessageRef) -> String {
    format!(
        "message_expiration.{}-{}-{}.expires_at",
        message.guild_id, message.channel_id, message.message_id
    )
}

pub struct RetentionLedger {
    store: RetentionStore,
    cache: Arc<dyn RetentionCache>,
    /// Freshness bound on cached expiry timestamps; policy entries are
    /// refreshed on every write so they carry no window
    expiry_freshness: Duration,
    metrics: Arc<Metrics>,
}

impl RetentionLedger {
    pub fn new(
        store: RetentionStore,
        cache: Arc<dyn RetentionCache>,
        expiry_freshness: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            cache,
            expiry_freshness,
            metrics,
        }
    }

    pub fn store(&self) -> &RetentionStore {
        &self.store
    }

    /// Read the channel's retention policy, cache-aside
    pub async fn get_config(
        &self,
        channel: &ChannelRef,
        force: bool,
    ) -> Result<Option<ChannelRetention>> {
        let key = channel_ttl_key(channel);

        if !force {
            match self.cache.get(&key).await.usable() {
                Some(cached) => {
                    self.metrics.cache_hit();
                    match cached.parse::<i64>() {
                        Ok(v) if v < 0 => return Ok(None),
                        Ok(v) => {
                            return Ok(Some(ChannelRetention {
                                configured_ttl: v as u64,
                            }));
                        }
                        // Unparseable cache entry, treat as a miss
                        Err(_) => {}
                    }
                }
                None => self.metrics.cache_miss(),
            }
        }

        let retention = self.store.get_channel_retention(channel)?;

        // Repopulate, negative sentinel included
        let value = retention
            .as_ref()
            .map(|r| r.configured_ttl.to_string())
            .unwrap_or_else(|| NO_POLICY.to_string());
        self.cache.set(&key, &value, None).await;

        Ok(retention)
    }

    /// Read the channel TTL in seconds, or `None` when no policy is set
    pub async fn get_ttl(&self, channel: &ChannelRef, force: bool) -> Result<Option<u64>> {
        Ok(self
            .get_config(channel, force)
            .await?
            .map(|r| r.configured_ttl))
    }

    /// Write the channel's retention policy (store write-through to cache)
    pub async fn set_ttl(&self, channel: &ChannelRef, configured_ttl: u64) -> Result<()> {
        self.store.set_channel_ttl(channel, configured_ttl)?;
        self.cache
            .set(&channel_ttl_key(channel), &configured_ttl.to_string(), None)
            .await;
        Ok(())
    }

    /// Record when a message must expire (store write-through to cache)
    pub async fn schedule_expiry(&self, message: &MessageRef, expires_at: u64) -> Result<()> {
        self.store.upsert_expiration(message, expires_at)?;
        self.cache
            .set(
                &message_expiry_key(message),
                &expires_at.to_string(),
                Some(self.expiry_freshness),
            )
            .await;
        Ok(())
    }

    /// Read a message's expiry timestamp, cache-aside with a bounded
    /// freshness window on repopulated entries
    pub async fn get_expiry(&self, message: &MessageRef, force: bool) -> Result<Option<u64>> {
        let key = message_expiry_key(message);

        if !force {
            match self.cache.get(&key).await.usable() {
                Some(cached) => {
                    self.metrics.cache_hit();
                    match cached.parse::<i64>() {
                        Ok(v) if v < 0 => return Ok(None),
                        Ok(v) => return Ok(Some(v as u64)),
                        Err(_) => {}
                    }
                }
                None => self.metrics.cache_miss(),
            }
        }

        let record = self.store.get_expiration(message)?;

        let value = record
            .as_ref()
            .map(|r| r.expires_at.to_string())
            .unwrap_or_else(|| NO_POLICY.to_string());
        self.cache
            .set(&key, &value, Some(self.expiry_freshness))
            .await;

        Ok(record.map(|r| r.expires_at))
    }

    /// Scan one guild's entries due at or before `since + within`
    pub async fn find_due(
        &self,
        guild_id: &str,
        since: u64,
        within: u64,
    ) -> Result<Vec<ExpirationEntry>> {
        self.store.find_due(guild_id, since, within)
    }

    /// Retire a ledger entry after deletion (or a decision that deletion is
    /// impossible). The cached timestamp is dropped with it so the cache does
    /// not accumulate one key per retired message.
    pub async fn clear_expiry(&self, message: &MessageRef) -> Result<()> {
        self.store.clear_expiration(message)?;
        self.cache.remove(&message_expiry_key(message)).await;
        debug!(
            guild_id = %message.guild_id,
            message_id = %message.message_id,
            "Ledger entry retired"
        );
        Ok(())
    }
}
