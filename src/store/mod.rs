//! Fjall-based persistence for retention policies and message expirations
//!
//! One keyspace with three partitions:
//!
//! - `channel_retention`: per-channel TTL policy
//! - `message_expiration`: per-message expiry timestamp
//! - `expiry_index`: (guild, expires_at) ordering for due-entry scans
//!
//! The store never holds processing status; that annotation lives only in
//! the in-memory lane scheduler.

pub mod error;
pub mod keys;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{RetentionStore, StoreStats};
