use crate::humanize::DurationSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            cache: CacheConfig::default(),
            scheduler: SchedulerConfig::default(),
            platform: PlatformConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }
}

/// Stats/health HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

/// Retention store (fjall keyspace) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/retention")
}

/// Retention cache configuration
///
/// The cache is a pure accelerator. Disabling it only costs store reads.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Freshness window on cached expiry timestamps
    #[serde(default = "default_expiry_freshness")]
    pub expiry_freshness: DurationSpec,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            expiry_freshness: default_expiry_freshness(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_expiry_freshness() -> DurationSpec {
    DurationSpec(3600)
}

/// Lane scheduler and deletion worker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval: DurationSpec,
    /// Maximum in-flight deletions while draining a lane
    #[serde(default = "default_delete_concurrency")]
    pub delete_concurrency: usize,
    /// Backfill look-ahead: entries due within this window are reloaded on start
    #[serde(default = "default_backfill_window")]
    pub backfill_window: DurationSpec,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            delete_concurrency: default_delete_concurrency(),
            backfill_window: default_backfill_window(),
        }
    }
}

fn default_tick_interval() -> DurationSpec {
    DurationSpec(1)
}

fn default_delete_concurrency() -> usize {
    100
}

fn default_backfill_window() -> DurationSpec {
    DurationSpec(1800)
}

/// Remote platform REST configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: DurationSpec,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Bot token (loaded from environment, not from config file)
    #[serde(skip)]
    pub bot_token: Option<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            bot_token: None,
        }
    }
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_request_timeout() -> DurationSpec {
    DurationSpec(30)
}

fn default_user_agent() -> String {
    "lethe/0.1.0".to_string()
}

/// Tracked guilds and their channels for the backfill existence check
///
/// A guild mapped to an empty channel list is tracked with an open channel
/// set (every channel is assumed to exist).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub guilds: HashMap<String, Vec<String>>,
}
