//! Deletion worker: the external delete capability boundary and the
//! bounded-concurrency tick runner that drives it

pub mod rest;
pub mod tick;

pub use rest::{RestConfig, RestDeleter};
pub use tick::{TickRunner, spawn_tick_loop};

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("delete request failed: {0}")]
    Request(String),

    #[error("platform rejected delete: status {status}")]
    Rejected { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, DeleteError>;

/// Remote message deletion capability. Failure reasons are not
/// distinguished by the scheduler: any error makes the entry
/// `Unprocessable`.
#[async_trait]
pub trait MessageDeleter: Send + Sync {
    async fn delete(&self, channel_id: &str, message_id: &str) -> Result<()>;
}

/// Scriptable deleter for development and tests
#[derive(Debug, Default)]
pub struct MockDeleter {
    deleted: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicU64,
}

impl MockDeleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make future deletes of this message id fail
    pub fn fail_message(&self, message_id: &str) {
        self.failing
            .lock()
            .expect("mock deleter lock")
            .insert(message_id.to_string());
    }

    /// Add latency to every delete (for overlap tests)
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().expect("mock deleter lock") = Some(delay);
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().expect("mock deleter lock").clone()
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageDeleter for MockDeleter {
    async fn delete(&self, channel_id: &str, message_id: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().expect("mock deleter lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing
            .lock()
            .expect("mock deleter lock")
            .contains(message_id);
        if failing {
            return Err(DeleteError::Request(format!(
                "scripted failure for {}",
                message_id
            )));
        }

        self.deleted
            .lock()
            .expect("mock deleter lock")
            .push((channel_id.to_string(), message_id.to_string()));
        Ok(())
    }
}
