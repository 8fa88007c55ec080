//! Configuration management
//!
//! Layered configuration loading:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Settings can be overridden using the pattern `LETHE__<section>__<key>`:
//!
//! - `LETHE__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `LETHE__SCHEDULER__DELETE_CONCURRENCY=50`
//! - `LETHE__SCHEDULER__BACKFILL_WINDOW=30m`
//!
//! The bot token is only ever read from the environment
//! (`LETHE_BOT_TOKEN` or `DISCORD_TOKEN`), never from the TOML file.
//!
//! # Configuration File
//!
//! By default the configuration is loaded from `config/lethe.toml`.
//! This can be overridden with the `LETHE_CONFIG` environment variable
//! or the `--config` CLI flag.

mod models;
mod sources;
mod validation;

pub use crate::humanize::DurationSpec;
pub use models::{
    CacheConfig, Config, DirectoryConfig, PlatformConfig, SchedulerConfig, ServerConfig,
    StoreConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing and the `--config` CLI flag. Environment
    /// overrides and secrets still apply.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        sources::load_secrets(&mut config);
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("lethe.toml");

        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:8080"

[store]
path = "data/retention"

[cache]
enabled = true
expiry_freshness = "1h"

[scheduler]
tick_interval = "1s"
delete_concurrency = 100
backfill_window = "30m"

[platform]
api_base = "https://discord.com/api/v10"
request_timeout = "30s"

[directory.guilds]
g1 = []
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.cache.expiry_freshness.as_secs(), 3600);
        assert_eq!(config.scheduler.backfill_window.as_secs(), 1800);
        assert_eq!(config.platform.api_base, "https://discord.com/api/v10");
        assert!(config.directory.guilds.contains_key("g1"));
    }

    #[test]
    fn validation_is_wired_into_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("lethe.toml");

        fs::write(
            &config_path,
            r#"
[scheduler]
delete_concurrency = 0
            "#,
        )
        .unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationError(
                ValidationError::ZeroDeleteConcurrency
            ))
        ));
    }
}
