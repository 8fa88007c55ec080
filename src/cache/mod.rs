//! Optional read-through/write-through cache in front of the retention store
//!
//! The cache is purely an accelerator: every outcome a caller cannot use
//! (backend down, cache absent, entry expired) collapses to a miss at the
//! ledger boundary, and the store stays authoritative. Implementations
//! swallow their own errors and report `CacheOutcome::Unavailable` instead
//! of surfacing them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Result of a cache read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Cached value (stringified integer by convention)
    Hit(String),
    /// Key not present
    Miss,
    /// Cache absent or erroring; callers treat this as a miss
    Unavailable,
}

impl CacheOutcome {
    /// Collapse to an optional value, folding `Unavailable` into a miss.
    /// This is the single place where cache failures disappear.
    pub fn usable(self) -> Option<String> {
        match self {
            CacheOutcome::Hit(value) => Some(value),
            CacheOutcome::Miss | CacheOutcome::Unavailable => None,
        }
    }
}

#[async_trait]
pub trait RetentionCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheOutcome;

    /// Best-effort write; `ttl` bounds the entry's freshness window.
    /// Failures are swallowed by the implementation.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>);

    /// Best-effort removal; failures are swallowed by the implementation
    async fn remove(&self, key: &str);
}

/// In-process cache with per-entry freshness windows. Entries past their
/// deadline are evicted on read, and the ledger removes retired keys, so
/// the map does not grow with every message the process ever saw.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RetentionCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheOutcome {
        let mut entries = self.entries.write().await;

        let expired = matches!(
            entries.get(key),
            Some((_, Some(deadline))) if *deadline <= Instant::now()
        );
        if expired {
            entries.remove(key);
            return CacheOutcome::Miss;
        }

        match entries.get(key) {
            Some((value, _)) => CacheOutcome::Hit(value.clone()),
            None => CacheOutcome::Miss,
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        let deadline = ttl.map(|ttl| Instant::now() + ttl);
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value.to_string(), deadline));
    }

    async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}

/// Stand-in for "no cache configured": every read is unavailable,
/// every write a no-op
#[derive(Debug, Default, Clone)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RetentionCache for NullCache {
    async fn get(&self, _key: &str) -> CacheOutcome {
        CacheOutcome::Unavailable
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) {}

    async fn remove(&self, _key: &str) {}
}
