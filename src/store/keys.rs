//! Key layout and encoding utilities for fjall partitions
//!
//! Partition structure:
//! - `channel_retention`: chan:{guild_id}:{channel_id} -> ChannelRetention (JSON)
//! - `message_expiration`: msg:{guild_id}:{channel_id}:{message_id} -> ExpirationRecord (JSON)
//! - `expiry_index`: due:{guild_id}:{expires_at:020}:{channel_id}:{message_id} -> ()
//!
//! The index keys sort lexicographically in (guild, expires_at) order thanks
//! to the zero-padded timestamp, which makes due-entry scans a bounded prefix
//! walk per guild. Twenty digits cover the full u64 range, so ordering holds
//! for any timestamp intake can produce.

use super::error::{Result, StoreError};

/// Encode a channel retention key: chan:{guild}:{channel}
pub fn encode_channel_key(guild_id: &str, channel_id: &str) -> Vec<u8> {
    format!("chan:{}:{}", guild_id, channel_id).into_bytes()
}

/// Encode a message expiration key: msg:{guild}:{channel}:{message}
pub fn encode_message_key(guild_id: &str, channel_id: &str, message_id: &str) -> Vec<u8> {
    format!("msg:{}:{}:{}", guild_id, channel_id, message_id).into_bytes()
}

/// Encode an expiry index key: due:{guild}:{expires_at:020}:{channel}:{message}
pub fn encode_due_key(
    guild_id: &str,
    expires_at: u64,
    channel_id: &str,
    message_id: &str,
) -> Vec<u8> {
    format!(
        "due:{}:{:020}:{}:{}",
        guild_id, expires_at, channel_id, message_id
    )
    .into_bytes()
}

/// Encode the per-guild prefix for a due scan: due:{guild}:
pub fn encode_due_prefix(guild_id: &str) -> Vec<u8> {
    format!("due:{}:", guild_id).into_bytes()
}

/// Decode an expiry index key into (guild, expires_at, channel, message)
pub fn decode_due_key(key: &[u8]) -> Result<(String, u64, String, String)> {
    let key_str = std::str::from_utf8(key)
        .map_err(|_| StoreError::InvalidKey("non-utf8 index key".to_string()))?;

    let rest = key_str
        .strip_prefix("due:")
        .ok_or_else(|| StoreError::InvalidKey(key_str.to_string()))?;

    let mut parts = rest.splitn(4, ':');
    let guild_id = parts.next();
    let expires_at = parts.next();
    let channel_id = parts.next();
    let message_id = parts.next();

    match (guild_id, expires_at, channel_id, message_id) {
        (Some(g), Some(ts), Some(c), Some(m)) => {
            let expires_at: u64 = ts
                .parse()
                .map_err(|_| StoreError::InvalidKey(key_str.to_string()))?;
            Ok((g.to_string(), expires_at, c.to_string(), m.to_string()))
        }
        _ => Err(StoreError::InvalidKey(key_str.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_key_encoding() {
        assert_eq!(encode_channel_key("g1", "c1"), b"chan:g1:c1");
    }

    #[test]
    fn message_key_encoding() {
        assert_eq!(encode_message_key("g1", "c1", "m1"), b"msg:g1:c1:m1");
    }

    #[test]
    fn due_key_round_trip() {
        let key = encode_due_key("g1", 1060, "c1", "m1");
        assert_eq!(key, b"due:g1:00000000000000001060:c1:m1");

        let (g, ts, c, m) = decode_due_key(&key).unwrap();
        assert_eq!(g, "g1");
        assert_eq!(ts, 1060);
        assert_eq!(c, "c1");
        assert_eq!(m, "m1");
    }

    #[test]
    fn due_keys_sort_by_timestamp() {
        let early = encode_due_key("g1", 999, "c9", "m9");
        let late = encode_due_key("g1", 1000, "c0", "m0");
        assert!(early < late);
    }

    #[test]
    fn due_key_ordering_holds_across_the_u64_range() {
        let small = encode_due_key("g1", 1060, "c1", "m1");
        let huge = encode_due_key("g1", u64::MAX, "c1", "m1");
        assert!(small < huge);

        let (_, ts, _, _) = decode_due_key(&huge).unwrap();
        assert_eq!(ts, u64::MAX);
    }

    #[test]
    fn due_prefix_matches_keys() {
        let prefix = encode_due_prefix("g1");
        let key = encode_due_key("g1", 1060, "c1", "m1");
        assert!(key.starts_with(&prefix));
    }

    #[test]
    fn decode_rejects_malformed_keys() {
        assert!(decode_due_key(b"msg:g1:c1:m1").is_err());
        assert!(decode_due_key(b"due:g1:not-a-number:c1:m1").is_err());
        assert!(decode_due_key(b"due:g1").is_err());
    }
}
