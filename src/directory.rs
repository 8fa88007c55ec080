//! Guild/channel existence boundary used by backfill to drop orphaned
//! entries. The live gateway owns this knowledge in production; the daemon
//! binary drives it from configuration.

use std::collections::HashMap;

use crate::config::DirectoryConfig;

pub trait GuildDirectory: Send + Sync {
    /// Guilds this process is responsible for
    fn tracked_guilds(&self) -> Vec<String>;

    /// Whether a channel still exists in a tracked guild
    fn channel_exists(&self, guild_id: &str, channel_id: &str) -> bool;
}

/// Config-driven directory. A guild with an empty channel list has an open
/// channel set: every channel is assumed to exist.
#[derive(Debug, Default, Clone)]
pub struct StaticDirectory {
    guilds: HashMap<String, Vec<String>>,
}

impl StaticDirectory {
    pub fn new(guilds: HashMap<String, Vec<String>>) -> Self {
        Self { guilds }
    }

    pub fn from_config(config: &DirectoryConfig) -> Self {
        Self::new(config.guilds.clone())
    }
}

impl GuildDirectory for StaticDirectory {
    fn tracked_guilds(&self) -> Vec<String> {
        let mut guilds: Vec<String> = self.guilds.keys().cloned().collect();
        guilds.sort();
        guilds
    }

    fn channel_exists(&self, guild_id: &str, channel_id: &str) -> bool {
        match self.guilds.get(guild_id) {
            Some(channels) => {
                channels.is_empty() || channels.iter().any(|c| c == channel_id)
            }
            None => false,
        }
    }
}
