use serde::{Deserialize, Serialize};

/// Composite channel identity (guild + channel)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRef {
    pub guild_id: String,
    pub channel_id: String,
}

impl ChannelRef {
    pub fn new(guild_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

/// Composite message identity (guild + channel + message)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub guild_id: String,
    pub channel_id: String,
    pub message_id: String,
}

impl MessageRef {
    pub fn new(
        guild_id: impl Into<String>,
        channel_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }

    pub fn channel(&self) -> ChannelRef {
        ChannelRef::new(self.guild_id.clone(), self.channel_id.clone())
    }
}

/// Per-channel retention policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRetention {
    pub configured_ttl: u64,
}

/// Persisted expiration record (value side; identity lives in the key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationRecord {
    pub expires_at: u64,
}

/// A scheduled expiration with its full identity, as returned by due scans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationEntry {
    pub guild_id: String,
    pub channel_id: String,
    pub message_id: String,
    pub expires_at: u64,
}

impl ExpirationEntry {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef::new(
            self.guild_id.clone(),
            self.channel_id.clone(),
            self.message_id.clone(),
        )
    }
}
