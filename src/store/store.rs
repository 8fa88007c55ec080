use std::path::Path;

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tracing::{debug, info};

use crate::ledger::models::{
    ChannelRef, ChannelRetention, ExpirationEntry, ExpirationRecord, MessageRef,
};

use super::error::Result;
use super::keys::{
    decode_due_key, encode_channel_key, encode_due_key, encode_due_prefix, encode_message_key,
};

/// Fjall-backed persistent storage for retention policies and message
/// expirations. This is the source of truth; the cache in front of it is
/// purely an optimization.
#[derive(Clone)]
pub struct RetentionStore {
    keyspace: Keyspace,
    channels: PartitionHandle,
    messages: PartitionHandle,
    expiry_index: PartitionHandle,
}

impl RetentionStore {
    /// Open or create a retention store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening retention store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;

        let channels =
            keyspace.open_partition("channel_retention", PartitionCreateOptions::default())?;
        let messages =
            keyspace.open_partition("message_expiration", PartitionCreateOptions::default())?;
        let expiry_index =
            keyspace.open_partition("expiry_index", PartitionCreateOptions::default())?;

        info!("Retention store opened");
        Ok(Self {
            keyspace,
            channels,
            messages,
            expiry_index,
        })
    }

    /// Upsert the retention policy for a channel (last writer wins)
    pub fn set_channel_ttl(&self, channel: &ChannelRef, configured_ttl: u64) -> Result<()> {
        let key = encode_channel_key(&channel.guild_id, &channel.channel_id);
        let value = serde_json::to_vec(&ChannelRetention { configured_ttl })?;
        self.channels.insert(key, value)?;
        debug!(
            guild_id = %channel.guild_id,
            channel_id = %channel.channel_id,
            configured_ttl,
            "Channel TTL stored"
        );
        Ok(())
    }

    /// Fetch the retention policy for a channel, if one is configured
    pub fn get_channel_retention(&self, channel: &ChannelRef) -> Result<Option<ChannelRetention>> {
        let key = encode_channel_key(&channel.guild_id, &channel.channel_id);
        match self.channels.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Upsert a message expiration and maintain the (guild, expires_at) index
    pub fn upsert_expiration(&self, message: &MessageRef, expires_at: u64) -> Result<()> {
        let key = encode_message_key(&message.guild_id, &message.channel_id, &message.message_id);

        // A re-schedule moves the entry between index slots
        if let Some(existing) = self.messages.get(&key)? {
            let old: ExpirationRecord = serde_json::from_slice(&existing)?;
            if old.expires_at != expires_at {
                self.expiry_index.remove(encode_due_key(
                    &message.guild_id,
                    old.expires_at,
                    &message.channel_id,
                    &message.message_id,
                ))?;
            }
        }

        let value = serde_json::to_vec(&ExpirationRecord { expires_at })?;
        self.messages.insert(&key, value)?;
        self.expiry_index.insert(
            encode_due_key(
                &message.guild_id,
                expires_at,
                &message.channel_id,
                &message.message_id,
            ),
            [],
        )?;

        debug!(
            guild_id = %message.guild_id,
            channel_id = %message.channel_id,
            message_id = %message.message_id,
            expires_at,
            "Expiration stored"
        );
        Ok(())
    }

    /// Fetch a single message expiration record
    pub fn get_expiration(&self, message: &MessageRef) -> Result<Option<ExpirationRecord>> {
        let key = encode_message_key(&message.guild_id, &message.channel_id, &message.message_id);
        match self.messages.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Scan a guild's expirations with `expires_at <= since + within`,
    /// ascending by timestamp
    pub fn find_due(&self, guild_id: &str, since: u64, within: u64) -> Result<Vec<ExpirationEntry>> {
        let limit = since.saturating_add(within);
        let mut entries = Vec::new();

        for item in self.expiry_index.prefix(encode_due_prefix(guild_id)) {
            let (key, _) = item?;
            let (guild_id, expires_at, channel_id, message_id) = decode_due_key(&key)?;

            // Index keys sort by timestamp within the guild prefix
            if expires_at > limit {
                break;
            }

            entries.push(ExpirationEntry {
                guild_id,
                channel_id,
                message_id,
                expires_at,
            });
        }

        Ok(entries)
    }

    /// Remove a message expiration and its index entry; absent keys are a no-op
    pub fn clear_expiration(&self, message: &MessageRef) -> Result<()> {
        let key = encode_message_key(&message.guild_id, &message.channel_id, &message.message_id);

        if let Some(existing) = self.messages.get(&key)? {
            let record: ExpirationRecord = serde_json::from_slice(&existing)?;
            self.expiry_index.remove(encode_due_key(
                &message.guild_id,
                record.expires_at,
                &message.channel_id,
                &message.message_id,
            ))?;
            self.messages.remove(&key)?;
            debug!(
                guild_id = %message.guild_id,
                message_id = %message.message_id,
                "Expiration cleared"
            );
        }

        Ok(())
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Internal statistics for the stats endpoint
    pub fn stats(&self) -> Result<StoreStats> {
        let mut channel_count = 0;
        let mut pending_count = 0;

        for item in self.channels.iter() {
            item?;
            channel_count += 1;
        }

        for item in self.messages.iter() {
            item?;
            pending_count += 1;
        }

        Ok(StoreStats {
            channel_count,
            pending_count,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub channel_count: usize,
    pub pending_count: usize,
}
