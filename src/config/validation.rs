use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("scheduler.tick_interval must be positive")]
    ZeroTickInterval,

    #[error("scheduler.delete_concurrency must be positive")]
    ZeroDeleteConcurrency,

    #[error("cache.expiry_freshness must be positive when the cache is enabled")]
    ZeroCacheFreshness,

    #[error("platform.api_base must not be empty")]
    EmptyApiBase,

    #[error("store.path must not be empty")]
    EmptyStorePath,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.scheduler.tick_interval.as_secs() == 0 {
        return Err(ValidationError::ZeroTickInterval);
    }

    if config.scheduler.delete_concurrency == 0 {
        return Err(ValidationError::ZeroDeleteConcurrency);
    }

    if config.cache.enabled && config.cache.expiry_freshness.as_secs() == 0 {
        return Err(ValidationError::ZeroCacheFreshness);
    }

    if config.platform.api_base.trim().is_empty() {
        return Err(ValidationError::EmptyApiBase);
    }

    if config.store.path.as_os_str().is_empty() {
        return Err(ValidationError::EmptyStorePath);
    }

    Ok(())
}
